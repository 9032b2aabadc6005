use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::artifacts::handlers;
use crate::features::artifacts::services::{ArtifactService, ProviderCacheService};

/// Shared state for the artifacts feature
#[derive(Clone)]
pub struct ArtifactsState {
    pub artifacts: Arc<ArtifactService>,
    pub cache: Arc<ProviderCacheService>,
}

/// Create routes for the artifacts feature
///
/// Note: This feature requires authentication
pub fn routes(artifacts: Arc<ArtifactService>, cache: Arc<ProviderCacheService>) -> Router {
    Router::new()
        .route(
            "/api/artifacts",
            post(handlers::create_artifact).get(handlers::list_artifacts),
        )
        .route(
            "/api/artifacts/by-message/{message_id}",
            get(handlers::list_artifacts_by_message),
        )
        .route(
            "/api/artifacts/providers/sweep",
            post(handlers::sweep_provider_files),
        )
        .route(
            "/api/artifacts/{artifact_id}",
            get(handlers::get_artifact)
                .patch(handlers::update_artifact)
                .delete(handlers::delete_artifact),
        )
        .route(
            "/api/artifacts/{artifact_id}/providers/{provider}",
            put(handlers::cache_provider_file).get(handlers::get_provider_file),
        )
        .route(
            "/api/artifacts/{artifact_id}/providers/{provider}/touch",
            post(handlers::touch_provider_file),
        )
        .with_state(ArtifactsState { artifacts, cache })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::artifacts::dtos::ArtifactResponseDto;
    use crate::features::chats::dtos::CreateChatDto;
    use crate::features::chats::services::ChatService;
    use crate::shared::test_helpers::{create_admin_user, create_test_user, with_auth};
    use crate::shared::types::ApiResponse;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn server(pool: SqlitePool, user: crate::features::auth::model::AuthenticatedUser) -> TestServer {
        let router = with_auth(
            routes(
                Arc::new(ArtifactService::new(pool.clone())),
                Arc::new(ProviderCacheService::new(pool)),
            ),
            user,
        );
        TestServer::new(router).unwrap()
    }

    async fn seed_chat(pool: &SqlitePool, sub: &str) -> uuid::Uuid {
        ChatService::new(pool.clone())
            .create(
                sub,
                CreateChatDto {
                    title: None,
                    model: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_update_delete_lifecycle() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let server = server(pool, create_test_user("user-a"));

        let create = server
            .post("/api/artifacts")
            .json(&json!({
                "chat_id": chat_id,
                "message_id": uuid::Uuid::now_v7(),
                "filename": "page",
                "language": "HTML",
                "content": "<p>hi</p>"
            }))
            .await;
        create.assert_status_ok();
        let body: ApiResponse<ArtifactResponseDto> = create.json();
        let artifact = body.data.unwrap();
        assert!(artifact.is_previewable);

        let update = server
            .patch(&format!("/api/artifacts/{}", artifact.artifact_id))
            .json(&json!({ "content": "<p>hello</p>" }))
            .await;
        update.assert_status_ok();
        let body: ApiResponse<ArtifactResponseDto> = update.json();
        let updated = body.data.unwrap();
        assert_eq!(updated.edit_count, 1);
        assert_eq!(updated.original_content, "<p>hi</p>");

        let delete = server
            .delete(&format!("/api/artifacts/{}", artifact.artifact_id))
            .await;
        delete.assert_status_ok();

        // Deleting again is loud
        let again = server
            .delete(&format!("/api/artifacts/{}", artifact.artifact_id))
            .await;
        again.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_provider_cache_endpoints() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let server = server(pool, create_test_user("user-a"));

        let create = server
            .post("/api/artifacts")
            .json(&json!({
                "chat_id": chat_id,
                "message_id": uuid::Uuid::now_v7(),
                "filename": "snippet",
                "language": "markdown",
                "content": "# hi"
            }))
            .await;
        let body: ApiResponse<ArtifactResponseDto> = create.json();
        let key = body.data.unwrap().artifact_id;

        let put = server
            .put(&format!("/api/artifacts/{}/providers/openai", key))
            .json(&json!({ "external_file_id": "file-abc" }))
            .await;
        put.assert_status_ok();

        let get = server
            .get(&format!("/api/artifacts/{}/providers/openai", key))
            .await;
        get.assert_status_ok();
        let body: ApiResponse<crate::features::artifacts::dtos::ProviderFileEntryDto> = get.json();
        assert_eq!(body.data.unwrap().external_file_id, "file-abc");

        // Provider names are validated at the edge
        let bad = server
            .put(&format!("/api/artifacts/{}/providers/Open_AI", key))
            .json(&json!({ "external_file_id": "file-abc" }))
            .await;
        bad.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_sweep_requires_admin() {
        let pool = test_pool().await;

        let plain = server(pool.clone(), create_test_user("user-a"));
        let res = plain.post("/api/artifacts/providers/sweep").await;
        res.assert_status_forbidden();

        let admin = server(pool, create_admin_user("admin-1"));
        let res = admin.post("/api/artifacts/providers/sweep").await;
        res.assert_status_ok();
        let body: ApiResponse<crate::features::artifacts::dtos::SweepResultDto> = res.json();
        assert_eq!(body.data.unwrap().removed_count, 0);
    }
}
