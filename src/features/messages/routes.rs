use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::messages::handlers;
use crate::features::messages::services::MessageService;

/// Create routes for the messages feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<MessageService>) -> Router {
    Router::new()
        .route("/api/messages", post(handlers::create_message))
        .route(
            "/api/messages/by-chat/{chat_id}",
            get(handlers::list_messages_by_chat),
        )
        .route(
            "/api/messages/{id}",
            get(handlers::get_message)
                .patch(handlers::edit_message)
                .delete(handlers::delete_message),
        )
        .route(
            "/api/messages/{id}/versions/{index}/activate",
            post(handlers::activate_message_version),
        )
        .route(
            "/api/messages/{id}/branches",
            post(handlers::add_message_branch),
        )
        .route(
            "/api/messages/{id}/branches/{branch_id}/activate",
            post(handlers::activate_message_branch),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::artifacts::services::ArtifactService;
    use crate::features::chats::dtos::CreateChatDto;
    use crate::features::chats::services::ChatService;
    use crate::features::messages::dtos::MessageResponseDto;
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

    async fn setup(sub: &str) -> (TestServer, uuid::Uuid) {
        let pool = test_pool().await;
        let chats = Arc::new(ChatService::new(pool.clone()));
        let artifacts = Arc::new(ArtifactService::new(pool.clone()));
        let chat_id = chats
            .create(
                sub,
                CreateChatDto {
                    title: None,
                    model: None,
                },
            )
            .await
            .unwrap()
            .id;

        let service = Arc::new(MessageService::new(pool, chats, artifacts));
        let server = TestServer::new(with_auth(routes(service), create_test_user(sub))).unwrap();
        (server, chat_id)
    }

    #[tokio::test]
    async fn test_conversation_round_trip() {
        let (server, chat_id) = setup("user-a").await;

        for content in ["hello", "how are you"] {
            let res = server
                .post("/api/messages")
                .json(&json!({ "chat_id": chat_id, "role": "user", "content": content }))
                .await;
            res.assert_status_ok();
        }

        let list = server
            .get(&format!("/api/messages/by-chat/{}", chat_id))
            .await;
        list.assert_status_ok();
        let body: ApiResponse<Vec<MessageResponseDto>> = list.json();
        let messages = body.data.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_edit_and_version_activation() {
        let (server, chat_id) = setup("user-a").await;

        let created = server
            .post("/api/messages")
            .json(&json!({ "chat_id": chat_id, "role": "user", "content": "v1" }))
            .await;
        let body: ApiResponse<MessageResponseDto> = created.json();
        let id = body.data.unwrap().id;

        let edited = server
            .patch(&format!("/api/messages/{}", id))
            .json(&json!({ "content": "v2" }))
            .await;
        edited.assert_status_ok();

        let restored = server
            .post(&format!("/api/messages/{}/versions/0/activate", id))
            .await;
        restored.assert_status_ok();
        let body: ApiResponse<MessageResponseDto> = restored.json();
        assert_eq!(body.data.unwrap().content, "v1");

        let out_of_range = server
            .post(&format!("/api/messages/{}/versions/9/activate", id))
            .await;
        out_of_range.assert_status_bad_request();
    }
}
