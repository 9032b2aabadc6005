use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::artifacts::{
    dtos as artifacts_dtos, handlers as artifacts_handlers, models as artifacts_models,
};
use crate::features::auth;
use crate::features::chats::{dtos as chats_dtos, handlers as chats_handlers};
use crate::features::library::{
    dtos as library_dtos, handlers as library_handlers, models as library_models,
};
use crate::features::messages::{
    dtos as messages_dtos, handlers as messages_handlers, models as messages_models,
};
use crate::features::shares::{
    dtos as shares_dtos, handlers as shares_handlers, models as shares_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Chats
        chats_handlers::create_chat,
        chats_handlers::ensure_chat,
        chats_handlers::list_chats,
        chats_handlers::get_chat,
        chats_handlers::update_chat,
        // Messages
        messages_handlers::create_message,
        messages_handlers::list_messages_by_chat,
        messages_handlers::get_message,
        messages_handlers::edit_message,
        messages_handlers::activate_message_version,
        messages_handlers::add_message_branch,
        messages_handlers::activate_message_branch,
        messages_handlers::delete_message,
        // Artifacts
        artifacts_handlers::create_artifact,
        artifacts_handlers::list_artifacts,
        artifacts_handlers::list_artifacts_by_message,
        artifacts_handlers::get_artifact,
        artifacts_handlers::update_artifact,
        artifacts_handlers::delete_artifact,
        artifacts_handlers::cache_provider_file,
        artifacts_handlers::get_provider_file,
        artifacts_handlers::touch_provider_file,
        artifacts_handlers::sweep_provider_files,
        // Library
        library_handlers::create_backup,
        library_handlers::list_backups,
        library_handlers::restore_backup,
        library_handlers::delete_backup,
        library_handlers::create_file,
        library_handlers::list_files,
        library_handlers::get_file,
        library_handlers::update_file,
        library_handlers::delete_file,
        // Shares
        shares_handlers::create_share,
        shares_handlers::list_shares,
        shares_handlers::get_share,
        shares_handlers::update_share,
        shares_handlers::delete_share,
        shares_handlers::resolve_share,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::AuthenticatedUser,
            // Chats
            chats_dtos::ChatResponseDto,
            chats_dtos::CreateChatDto,
            chats_dtos::UpdateChatDto,
            ApiResponse<chats_dtos::ChatResponseDto>,
            ApiResponse<Vec<chats_dtos::ChatResponseDto>>,
            // Messages
            messages_models::MessageRole,
            messages_models::MessageVersion,
            messages_models::MessageBranch,
            messages_dtos::MessageResponseDto,
            messages_dtos::CreateMessageDto,
            messages_dtos::EditMessageDto,
            messages_dtos::AddBranchDto,
            ApiResponse<messages_dtos::MessageResponseDto>,
            ApiResponse<Vec<messages_dtos::MessageResponseDto>>,
            // Artifacts
            artifacts_models::ProviderFileEntry,
            artifacts_dtos::ArtifactResponseDto,
            artifacts_dtos::CreateArtifactDto,
            artifacts_dtos::ArtifactSeedDto,
            artifacts_dtos::UpdateArtifactDto,
            artifacts_dtos::CacheProviderFileDto,
            artifacts_dtos::ProviderFileEntryDto,
            artifacts_dtos::SweepResultDto,
            ApiResponse<artifacts_dtos::ArtifactResponseDto>,
            ApiResponse<Vec<artifacts_dtos::ArtifactResponseDto>>,
            ApiResponse<artifacts_dtos::ProviderFileEntryDto>,
            ApiResponse<artifacts_dtos::SweepResultDto>,
            // Library
            library_models::BackupType,
            library_dtos::BackupResponseDto,
            library_dtos::CreateBackupDto,
            library_dtos::RestoreResultDto,
            library_dtos::LibraryFileResponseDto,
            library_dtos::CreateLibraryFileDto,
            library_dtos::UpdateLibraryFileDto,
            ApiResponse<library_dtos::BackupResponseDto>,
            ApiResponse<Vec<library_dtos::BackupResponseDto>>,
            ApiResponse<library_dtos::RestoreResultDto>,
            ApiResponse<library_dtos::LibraryFileResponseDto>,
            ApiResponse<Vec<library_dtos::LibraryFileResponseDto>>,
            // Shares
            shares_models::ShareContentType,
            shares_models::ShareAccessLevel,
            shares_dtos::ShareResponseDto,
            shares_dtos::CreateShareDto,
            shares_dtos::UpdateShareDto,
            shares_dtos::ResolvedShareDto,
            ApiResponse<shares_dtos::ShareResponseDto>,
            ApiResponse<Vec<shares_dtos::ShareResponseDto>>,
            ApiResponse<shares_dtos::ResolvedShareDto>,
        )
    ),
    tags(
        (name = "chats", description = "Chat sessions"),
        (name = "messages", description = "Messages, edit history and branches"),
        (name = "artifacts", description = "Generated artifacts and the provider-file cache"),
        (name = "library", description = "Backups and uploaded-file descriptors"),
        (name = "shares", description = "Shareable links for chats and artifacts"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "3Tee Chat API",
        version = "0.1.0",
        description = "API documentation for the 3Tee chat backend",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
