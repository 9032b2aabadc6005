use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::shares::dtos::{
    CreateShareDto, ResolveShareQuery, ResolvedShareDto, ShareResponseDto, UpdateShareDto,
};
use crate::features::shares::services::ShareService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use crate::shared::validation::SHARE_ID_REGEX;

fn validate_share_id(share_id: &str) -> Result<()> {
    if !SHARE_ID_REGEX.is_match(share_id) {
        return Err(AppError::Validation(format!(
            "Invalid share token '{}'",
            share_id
        )));
    }
    Ok(())
}

/// Share a chat or artifact
#[utoipa::path(
    post,
    path = "/api/shares",
    request_body = CreateShareDto,
    responses(
        (status = 200, description = "Shared link created", body = ApiResponse<ShareResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Content belongs to another user"),
        (status = 404, description = "Content not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn create_share(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    AppJson(dto): AppJson<CreateShareDto>,
) -> Result<Json<ApiResponse<ShareResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let link = service.create(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(link), None, None)))
}

/// List the user's shared links, newest first
#[utoipa::path(
    get,
    path = "/api/shares",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of the user's shared links", body = ApiResponse<Vec<ShareResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn list_shares(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ShareResponseDto>>>> {
    let (links, total) = service.list_by_owner(&user.sub, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(links),
        None,
        Some(Meta { total }),
    )))
}

/// Get one of the user's links by its token
///
/// Read-class endpoint: a missing or foreign link yields `data: null`.
#[utoipa::path(
    get,
    path = "/api/shares/{share_id}",
    params(
        ("share_id" = String, Path, description = "Share token")
    ),
    responses(
        (status = 200, description = "Shared link, or null when absent/not owned", body = ApiResponse<ShareResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn get_share(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Path(share_id): Path<String>,
) -> Result<Json<ApiResponse<ShareResponseDto>>> {
    validate_share_id(&share_id)?;

    let link = service.get_by_share_id(&share_id, &user.sub).await?;
    Ok(Json(ApiResponse::success(link, None, None)))
}

/// Change how a link may be resolved
#[utoipa::path(
    patch,
    path = "/api/shares/{share_id}",
    params(
        ("share_id" = String, Path, description = "Share token")
    ),
    request_body = UpdateShareDto,
    responses(
        (status = 200, description = "Updated shared link", body = ApiResponse<ShareResponseDto>),
        (status = 403, description = "Link belongs to another user"),
        (status = 404, description = "Link not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn update_share(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Path(share_id): Path<String>,
    AppJson(dto): AppJson<UpdateShareDto>,
) -> Result<Json<ApiResponse<ShareResponseDto>>> {
    validate_share_id(&share_id)?;
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let link = service.update(&share_id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(link), None, None)))
}

/// Revoke a shared link
#[utoipa::path(
    delete,
    path = "/api/shares/{share_id}",
    params(
        ("share_id" = String, Path, description = "Share token")
    ),
    responses(
        (status = 200, description = "Link revoked", body = ApiResponse<String>),
        (status = 403, description = "Link belongs to another user"),
        (status = 404, description = "Link not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn delete_share(
    user: AuthenticatedUser,
    State(service): State<Arc<ShareService>>,
    Path(share_id): Path<String>,
) -> Result<Json<ApiResponse<String>>> {
    validate_share_id(&share_id)?;

    let revoked = service.delete(&share_id, &user.sub).await?;
    Ok(Json(ApiResponse::success(
        Some(revoked),
        Some("Link revoked".to_string()),
        None,
    )))
}

/// Resolve a shared link as an anonymous visitor
///
/// No authentication; a successful resolve counts a view.
#[utoipa::path(
    get,
    path = "/api/shared/{share_id}",
    params(
        ("share_id" = String, Path, description = "Share token"),
        ResolveShareQuery
    ),
    responses(
        (status = 200, description = "What the link points at", body = ApiResponse<ResolvedShareDto>),
        (status = 403, description = "Password or domain check failed"),
        (status = 404, description = "Link absent or expired")
    ),
    tag = "shares"
)]
pub async fn resolve_share(
    State(service): State<Arc<ShareService>>,
    Path(share_id): Path<String>,
    Query(query): Query<ResolveShareQuery>,
) -> Result<Json<ApiResponse<ResolvedShareDto>>> {
    validate_share_id(&share_id)?;

    let resolved = service.resolve_public(&share_id, &query).await?;
    Ok(Json(ApiResponse::success(Some(resolved), None, None)))
}
