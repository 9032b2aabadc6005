use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::artifacts::dtos::{ArtifactResponseDto, CreateArtifactDto, UpdateArtifactDto};
use crate::features::artifacts::routes::ArtifactsState;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Create an artifact under one of the user's chats
#[utoipa::path(
    post,
    path = "/api/artifacts",
    request_body = CreateArtifactDto,
    responses(
        (status = 200, description = "Artifact created", body = ApiResponse<ArtifactResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Chat belongs to another user"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn create_artifact(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    AppJson(dto): AppJson<CreateArtifactDto>,
) -> Result<Json<ApiResponse<ArtifactResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let artifact = state.artifacts.create(&user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(artifact), None, None)))
}

/// List the user's artifacts, newest first
#[utoipa::path(
    get,
    path = "/api/artifacts",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of the user's artifacts", body = ApiResponse<Vec<ArtifactResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn list_artifacts(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ArtifactResponseDto>>>> {
    let (artifacts, total) = state.artifacts.list_by_owner(&user.sub, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(artifacts),
        None,
        Some(Meta { total }),
    )))
}

/// List artifacts attached to one message
#[utoipa::path(
    get,
    path = "/api/artifacts/by-message/{message_id}",
    params(
        ("message_id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Artifacts attached to the message", body = ApiResponse<Vec<ArtifactResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn list_artifacts_by_message(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ArtifactResponseDto>>>> {
    let artifacts = state
        .artifacts
        .list_by_message(message_id, &user.sub)
        .await?;
    Ok(Json(ApiResponse::success(Some(artifacts), None, None)))
}

/// Get an artifact by its external key
///
/// Read-class endpoint: a missing or foreign artifact yields `data: null`.
#[utoipa::path(
    get,
    path = "/api/artifacts/{artifact_id}",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key")
    ),
    responses(
        (status = 200, description = "Artifact, or null when absent/not owned", body = ApiResponse<ArtifactResponseDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn get_artifact(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path(artifact_id): Path<String>,
) -> Result<Json<ApiResponse<ArtifactResponseDto>>> {
    let artifact = state.artifacts.get_by_key(&artifact_id, &user.sub).await?;
    Ok(Json(ApiResponse::success(artifact, None, None)))
}

/// Update an artifact's filename and/or content
#[utoipa::path(
    patch,
    path = "/api/artifacts/{artifact_id}",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key")
    ),
    request_body = UpdateArtifactDto,
    responses(
        (status = 200, description = "Updated artifact", body = ApiResponse<ArtifactResponseDto>),
        (status = 403, description = "Artifact belongs to another user"),
        (status = 404, description = "Artifact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn update_artifact(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path(artifact_id): Path<String>,
    AppJson(dto): AppJson<UpdateArtifactDto>,
) -> Result<Json<ApiResponse<ArtifactResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let artifact = state.artifacts.update(&artifact_id, &user.sub, dto).await?;
    Ok(Json(ApiResponse::success(Some(artifact), None, None)))
}

/// Delete an artifact
#[utoipa::path(
    delete,
    path = "/api/artifacts/{artifact_id}",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key")
    ),
    responses(
        (status = 200, description = "Artifact deleted", body = ApiResponse<String>),
        (status = 403, description = "Artifact belongs to another user"),
        (status = 404, description = "Artifact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn delete_artifact(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path(artifact_id): Path<String>,
) -> Result<Json<ApiResponse<String>>> {
    let deleted = state.artifacts.delete(&artifact_id, &user.sub).await?;
    Ok(Json(ApiResponse::success(
        Some(deleted),
        Some("Artifact deleted".to_string()),
        None,
    )))
}
