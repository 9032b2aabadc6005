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
use crate::features::library::dtos::{
    BackupResponseDto, CreateBackupDto, CreateLibraryFileDto, LibraryFileResponseDto,
    RestoreResultDto, UpdateLibraryFileDto,
};
use crate::features::library::services::LibraryService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Snapshot client-side state into a backup
#[utoipa::path(
    post,
    path = "/api/library/backups",
    request_body = CreateBackupDto,
    responses(
        (status = 200, description = "Backup created", body = ApiResponse<BackupResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn create_backup(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    AppJson(dto): AppJson<CreateBackupDto>,
) -> Result<Json<ApiResponse<BackupResponseDto>>> {
    let backup = service.create_backup(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(backup), None, None)))
}

/// List the user's backups, newest first
#[utoipa::path(
    get,
    path = "/api/library/backups",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of the user's backups", body = ApiResponse<Vec<BackupResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn list_backups(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<BackupResponseDto>>>> {
    let (backups, total) = service.list_backups(&user.sub, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(backups),
        None,
        Some(Meta { total }),
    )))
}

/// Restore a backup, handing its payload back
#[utoipa::path(
    post,
    path = "/api/library/backups/{id}/restore",
    params(
        ("id" = Uuid, Path, description = "Backup ID")
    ),
    responses(
        (status = 200, description = "Stored payload", body = ApiResponse<RestoreResultDto>),
        (status = 403, description = "Backup belongs to another user"),
        (status = 404, description = "Backup not found")
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn restore_backup(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RestoreResultDto>>> {
    let restored = service.restore_backup(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(Some(restored), None, None)))
}

/// Delete a backup
#[utoipa::path(
    delete,
    path = "/api/library/backups/{id}",
    params(
        ("id" = Uuid, Path, description = "Backup ID")
    ),
    responses(
        (status = 200, description = "Backup deleted", body = ApiResponse<Uuid>),
        (status = 403, description = "Backup belongs to another user"),
        (status = 404, description = "Backup not found")
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn delete_backup(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>> {
    let deleted = service.delete_backup(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(
        Some(deleted),
        Some("Backup deleted".to_string()),
        None,
    )))
}

/// Register the descriptor of a file uploaded to storage
#[utoipa::path(
    post,
    path = "/api/library/files",
    request_body = CreateLibraryFileDto,
    responses(
        (status = 200, description = "File descriptor created", body = ApiResponse<LibraryFileResponseDto>),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn create_file(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    AppJson(dto): AppJson<CreateLibraryFileDto>,
) -> Result<Json<ApiResponse<LibraryFileResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.create_file(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// List the user's file descriptors, newest first
#[utoipa::path(
    get,
    path = "/api/library/files",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of the user's files", body = ApiResponse<Vec<LibraryFileResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<LibraryFileResponseDto>>>> {
    let (files, total) = service.list_files(&user.sub, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Get a file descriptor by id
///
/// Read-class endpoint: a missing or foreign file yields `data: null`.
#[utoipa::path(
    get,
    path = "/api/library/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File descriptor, or null when absent/not owned", body = ApiResponse<LibraryFileResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn get_file(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LibraryFileResponseDto>>> {
    let file = service.get_file(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(file, None, None)))
}

/// Rename a library file
#[utoipa::path(
    patch,
    path = "/api/library/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = UpdateLibraryFileDto,
    responses(
        (status = 200, description = "Updated file descriptor", body = ApiResponse<LibraryFileResponseDto>),
        (status = 403, description = "File belongs to another user"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn update_file(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateLibraryFileDto>,
) -> Result<Json<ApiResponse<LibraryFileResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.update_file(id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Delete a file descriptor
#[utoipa::path(
    delete,
    path = "/api/library/files/{id}",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File descriptor deleted", body = ApiResponse<Uuid>),
        (status = 403, description = "File belongs to another user"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = [])),
    tag = "library"
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<LibraryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>> {
    let deleted = service.delete_file(id, &user.sub).await?;
    Ok(Json(ApiResponse::success(
        Some(deleted),
        Some("File deleted".to_string()),
        None,
    )))
}
