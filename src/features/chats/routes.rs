use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::chats::handlers;
use crate::features::chats::services::ChatService;

/// Create routes for the chats feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<ChatService>) -> Router {
    Router::new()
        .route(
            "/api/chats",
            post(handlers::create_chat).get(handlers::list_chats),
        )
        .route("/api/chats/ensure", post(handlers::ensure_chat))
        .route(
            "/api/chats/{id}",
            get(handlers::get_chat).patch(handlers::update_chat),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_test_user, with_auth};
    use crate::shared::types::ApiResponse;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_server(sub: &str) -> TestServer {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let router = with_auth(
            routes(Arc::new(ChatService::new(pool))),
            create_test_user(sub),
        );
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let server = test_server("user-a").await;

        let create = server
            .post("/api/chats")
            .json(&json!({ "title": "Weekend project" }))
            .await;
        create.assert_status_ok();

        let list = server.get("/api/chats").await;
        list.assert_status_ok();
        let body: ApiResponse<Vec<crate::features::chats::dtos::ChatResponseDto>> = list.json();
        assert!(body.success);
        assert_eq!(body.data.unwrap()[0].title, "Weekend project");
    }

    #[tokio::test]
    async fn test_get_unknown_chat_is_null_not_404() {
        let server = test_server("user-a").await;

        let res = server
            .get(&format!("/api/chats/{}", uuid::Uuid::now_v7()))
            .await;
        res.assert_status_ok();
        let body: ApiResponse<crate::features::chats::dtos::ChatResponseDto> = res.json();
        assert!(body.success);
        assert!(body.data.is_none());
    }
}
