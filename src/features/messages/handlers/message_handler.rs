use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::messages::dtos::{
    AddBranchDto, CreateMessageDto, EditMessageDto, MessageResponseDto,
};
use crate::features::messages::services::MessageService;
use crate::shared::types::ApiResponse;

/// Record a message in a chat
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessageDto,
    responses(
        (status = 200, description = "Message recorded", body = ApiResponse<MessageResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Chat belongs to another user"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn create_message(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    AppJson(dto): AppJson<CreateMessageDto>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = service.create(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}

/// List a chat's messages in conversation order
#[utoipa::path(
    get,
    path = "/api/messages/by-chat/{chat_id}",
    params(
        ("chat_id" = Uuid, Path, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "Messages oldest first; empty when the chat is absent or not owned", body = ApiResponse<Vec<MessageResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn list_messages_by_chat(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MessageResponseDto>>>> {
    let messages = service.list_by_chat(chat_id, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(messages), None, None)))
}

/// Get a message by id
///
/// Read-class endpoint: a missing or foreign message yields `data: null`.
#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message, or null when absent/not owned", body = ApiResponse<MessageResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn get_message(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    let message = service.get_by_id(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(message, None, None)))
}

/// Edit a message's content, keeping the old content in its history
#[utoipa::path(
    patch,
    path = "/api/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    request_body = EditMessageDto,
    responses(
        (status = 200, description = "Edited message", body = ApiResponse<MessageResponseDto>),
        (status = 403, description = "Message belongs to another user"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn edit_message(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<EditMessageDto>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = service.edit_content(id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}

/// Switch a message back to an earlier version of its content
#[utoipa::path(
    post,
    path = "/api/messages/{id}/versions/{index}/activate",
    params(
        ("id" = Uuid, Path, description = "Message ID"),
        ("index" = usize, Path, description = "Version index, oldest first")
    ),
    responses(
        (status = 200, description = "Message with the selected version active", body = ApiResponse<MessageResponseDto>),
        (status = 400, description = "No such version"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn activate_message_version(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    let message = service.set_active_version(id, &user.sub, index).await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}

/// Record an alternative reply on a message
#[utoipa::path(
    post,
    path = "/api/messages/{id}/branches",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    request_body = AddBranchDto,
    responses(
        (status = 200, description = "Message with the new branch active", body = ApiResponse<MessageResponseDto>),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn add_message_branch(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AddBranchDto>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = service.add_branch(id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}

/// Make one of the recorded branches the active one
#[utoipa::path(
    post,
    path = "/api/messages/{id}/branches/{branch_id}/activate",
    params(
        ("id" = Uuid, Path, description = "Message ID"),
        ("branch_id" = Uuid, Path, description = "Branch ID")
    ),
    responses(
        (status = 200, description = "Message with the selected branch active", body = ApiResponse<MessageResponseDto>),
        (status = 400, description = "No such branch"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn activate_message_branch(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path((id, branch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<MessageResponseDto>>> {
    let message = service.set_active_branch(id, &user.sub, branch_id).await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}

/// Delete a message
#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message deleted", body = ApiResponse<Uuid>),
        (status = 403, description = "Message belongs to another user"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn delete_message(
    user: AuthenticatedUser,
    State(service): State<Arc<MessageService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>> {
    let deleted = service.delete(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(
        Some(deleted),
        Some("Message deleted".to_string()),
        None,
    )))
}
