use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::shares::handlers;
use crate::features::shares::services::ShareService;

/// Create routes for managing shared links
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<ShareService>) -> Router {
    Router::new()
        .route(
            "/api/shares",
            post(handlers::create_share).get(handlers::list_shares),
        )
        .route(
            "/api/shares/{share_id}",
            get(handlers::get_share)
                .patch(handlers::update_share)
                .delete(handlers::delete_share),
        )
        .with_state(service)
}

/// Create the public resolve route; mounted outside the auth middleware
pub fn public_routes(service: Arc<ShareService>) -> Router {
    Router::new()
        .route("/api/shared/{share_id}", get(handlers::resolve_share))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chats::dtos::CreateChatDto;
    use crate::features::chats::services::ChatService;
    use crate::features::shares::dtos::{ResolvedShareDto, ShareResponseDto};
    use crate::shared::test_helpers::{create_test_user, with_auth};
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

    #[tokio::test]
    async fn test_share_then_resolve_anonymously() {
        let pool = test_pool().await;
        let chat_id = ChatService::new(pool.clone())
            .create(
                "user-a",
                CreateChatDto {
                    title: None,
                    model: None,
                },
            )
            .await
            .unwrap()
            .id;

        let service = Arc::new(ShareService::new(pool));
        let router = with_auth(routes(service.clone()), create_test_user("user-a"))
            .merge(public_routes(service));
        let server = TestServer::new(router).unwrap();

        let create = server
            .post("/api/shares")
            .json(&json!({
                "content_type": "chat",
                "content_ref": chat_id,
                "access_level": "public"
            }))
            .await;
        create.assert_status_ok();
        let body: ApiResponse<ShareResponseDto> = create.json();
        let share_id = body.data.unwrap().share_id;

        let resolve = server.get(&format!("/api/shared/{}", share_id)).await;
        resolve.assert_status_ok();
        let body: ApiResponse<ResolvedShareDto> = resolve.json();
        assert_eq!(body.data.unwrap().content_ref, chat_id);

        // A malformed token is rejected before the lookup
        let bad = server.get("/api/shared/not-a-token").await;
        bad.assert_status_bad_request();
    }
}
