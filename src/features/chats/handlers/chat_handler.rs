use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::chats::dtos::{ChatResponseDto, CreateChatDto, UpdateChatDto};
use crate::features::chats::services::ChatService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Create a chat
#[utoipa::path(
    post,
    path = "/api/chats",
    request_body = CreateChatDto,
    responses(
        (status = 200, description = "Chat created", body = ApiResponse<ChatResponseDto>),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn create_chat(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatService>>,
    AppJson(dto): AppJson<CreateChatDto>,
) -> Result<Json<ApiResponse<ChatResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let chat = service.create(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(chat), None, None)))
}

/// Return the user's most recent chat, creating one if none exists
#[utoipa::path(
    post,
    path = "/api/chats/ensure",
    responses(
        (status = 200, description = "Existing or newly created chat", body = ApiResponse<ChatResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn ensure_chat(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatService>>,
) -> Result<Json<ApiResponse<ChatResponseDto>>> {
    let chat = service.ensure_for_user(&user.sub).await?;
    Ok(Json(ApiResponse::success(Some(chat), None, None)))
}

/// List the user's chats, newest first
#[utoipa::path(
    get,
    path = "/api/chats",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of the user's chats", body = ApiResponse<Vec<ChatResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn list_chats(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ChatResponseDto>>>> {
    let (chats, total) = service.list_by_owner(&user.sub, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(chats),
        None,
        Some(Meta { total }),
    )))
}

/// Get a chat by id
///
/// Read-class endpoint: a missing or foreign chat yields `data: null`, not
/// an error.
#[utoipa::path(
    get,
    path = "/api/chats/{id}",
    params(
        ("id" = Uuid, Path, description = "Chat ID")
    ),
    responses(
        (status = 200, description = "Chat, or null when absent/not owned", body = ApiResponse<ChatResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn get_chat(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ChatResponseDto>>> {
    let chat = service.get_by_id(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(chat, None, None)))
}

/// Update a chat's title, model, star or archive flags
#[utoipa::path(
    patch,
    path = "/api/chats/{id}",
    params(
        ("id" = Uuid, Path, description = "Chat ID")
    ),
    request_body = UpdateChatDto,
    responses(
        (status = 200, description = "Updated chat", body = ApiResponse<ChatResponseDto>),
        (status = 403, description = "Chat belongs to another user"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn update_chat(
    user: AuthenticatedUser,
    State(service): State<Arc<ChatService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateChatDto>,
) -> Result<Json<ApiResponse<ChatResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let chat = service.update(id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(chat), None, None)))
}
