use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::artifacts::models::{Artifact, ProviderFileEntry};

/// Response DTO for an artifact
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArtifactResponseDto {
    pub id: Uuid,
    /// External string key used by clients
    pub artifact_id: String,
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub filename: String,
    pub language: String,
    pub content: String,
    pub original_content: String,
    pub edit_count: i64,
    pub is_previewable: bool,
    pub usage_count: i64,
    pub last_referenced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Artifact> for ArtifactResponseDto {
    fn from(a: Artifact) -> Self {
        Self {
            id: a.id,
            artifact_id: a.artifact_id,
            chat_id: a.chat_id,
            message_id: a.message_id,
            filename: a.filename,
            language: a.language,
            content: a.content,
            original_content: a.original_content,
            edit_count: a.edit_count,
            is_previewable: a.is_previewable,
            usage_count: a.usage_count,
            last_referenced_at: a.last_referenced_at,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Request DTO for creating an artifact under a message
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateArtifactDto {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 50))]
    pub language: String,
    pub content: String,
}

/// Artifact fields carried inline on an assistant message; the owner and
/// parent references come from the message being recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ArtifactSeedDto {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 50))]
    pub language: String,
    pub content: String,
}

/// Request DTO for updating an artifact's content
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateArtifactDto {
    #[validate(length(min = 1, max = 255))]
    pub filename: Option<String>,
    pub content: Option<String>,
}

/// Request DTO for caching a provider file handle
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CacheProviderFileDto {
    #[validate(length(min = 1, max = 255))]
    pub external_file_id: String,
    /// When the provider reports the upload happened (defaults to now)
    pub uploaded_at: Option<DateTime<Utc>>,
    /// When the provider will drop the file; absent means no expiry
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response DTO for a provider-file cache entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderFileEntryDto {
    pub provider: String,
    pub external_file_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ProviderFileEntryDto {
    pub fn from_entry(provider: &str, entry: ProviderFileEntry) -> Self {
        Self {
            provider: provider.to_string(),
            external_file_id: entry.external_file_id,
            uploaded_at: entry.uploaded_at,
            last_used_at: entry.last_used_at,
            expires_at: entry.expires_at,
        }
    }
}

/// Result of a provider-file sweep
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResultDto {
    pub removed_count: u64,
}
