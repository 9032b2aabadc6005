use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::artifacts::dtos::{CacheProviderFileDto, ProviderFileEntryDto, SweepResultDto};
use crate::features::artifacts::routes::ArtifactsState;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::ApiResponse;

/// Cache the provider's file handle for an artifact
#[utoipa::path(
    put,
    path = "/api/artifacts/{artifact_id}/providers/{provider}",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key"),
        ("provider" = String, Path, description = "Provider name (lowercase kebab-case)")
    ),
    request_body = CacheProviderFileDto,
    responses(
        (status = 200, description = "Cached entry", body = ApiResponse<ProviderFileEntryDto>),
        (status = 400, description = "Invalid provider name"),
        (status = 403, description = "Artifact belongs to another user"),
        (status = 404, description = "Artifact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn cache_provider_file(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path((artifact_id, provider)): Path<(String, String)>,
    AppJson(dto): AppJson<CacheProviderFileDto>,
) -> Result<Json<ApiResponse<ProviderFileEntryDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = state
        .cache
        .upsert(&artifact_id, &user.sub, &provider, dto)
        .await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

/// Look up a cached provider file
///
/// Read-class endpoint: absent, foreign or expired entries yield `data: null`.
#[utoipa::path(
    get,
    path = "/api/artifacts/{artifact_id}/providers/{provider}",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key"),
        ("provider" = String, Path, description = "Provider name (lowercase kebab-case)")
    ),
    responses(
        (status = 200, description = "Cached entry, or null on a miss", body = ApiResponse<ProviderFileEntryDto>),
        (status = 400, description = "Invalid provider name")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn get_provider_file(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path((artifact_id, provider)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ProviderFileEntryDto>>> {
    let entry = state.cache.get(&artifact_id, &user.sub, &provider).await?;
    Ok(Json(ApiResponse::success(entry, None, None)))
}

/// Record a reuse of a cached provider file
#[utoipa::path(
    post,
    path = "/api/artifacts/{artifact_id}/providers/{provider}/touch",
    params(
        ("artifact_id" = String, Path, description = "Artifact external key"),
        ("provider" = String, Path, description = "Provider name (lowercase kebab-case)")
    ),
    responses(
        (status = 200, description = "Refreshed entry, or null when there was nothing to touch", body = ApiResponse<ProviderFileEntryDto>),
        (status = 403, description = "Artifact belongs to another user"),
        (status = 404, description = "Artifact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn touch_provider_file(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
    Path((artifact_id, provider)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ProviderFileEntryDto>>> {
    let entry = state.cache.touch(&artifact_id, &user.sub, &provider).await?;
    Ok(Json(ApiResponse::success(entry, None, None)))
}

/// Drop expired provider-file entries across all artifacts (admin only)
#[utoipa::path(
    post,
    path = "/api/artifacts/providers/sweep",
    responses(
        (status = 200, description = "Number of entries removed", body = ApiResponse<SweepResultDto>),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "artifacts"
)]
pub async fn sweep_provider_files(
    user: AuthenticatedUser,
    State(state): State<ArtifactsState>,
) -> Result<Json<ApiResponse<SweepResultDto>>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can trigger a sweep".to_string(),
        ));
    }

    let removed_count = state.cache.sweep_expired().await?;
    Ok(Json(ApiResponse::success(
        Some(SweepResultDto { removed_count }),
        None,
        None,
    )))
}
