use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::chats::dtos::{ChatResponseDto, CreateChatDto, UpdateChatDto};
use crate::features::chats::models::Chat;
use crate::shared::constants::{DEFAULT_CHAT_MODEL, DEFAULT_CHAT_TITLE};
use crate::shared::types::PaginationQuery;

const CHAT_COLUMNS: &str =
    "id, user_id, title, model, is_starred, is_archived, created_at, updated_at";

/// Service for chat operations
pub struct ChatService {
    pool: SqlitePool,
}

impl ChatService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a chat owned by `user_id`
    pub async fn create(&self, user_id: &str, dto: CreateChatDto) -> Result<ChatResponseDto> {
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            title: dto.title.unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
            model: dto.model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            is_starred: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO chats (id, user_id, title, model, is_starred, is_archived, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chat.id)
        .bind(&chat.user_id)
        .bind(&chat.title)
        .bind(&chat.model)
        .bind(chat.is_starred)
        .bind(chat.is_archived)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create chat: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Chat created: id={}, user={}", chat.id, user_id);

        Ok(chat.into())
    }

    /// Return the user's most recent non-archived chat, creating one if the
    /// user has none
    pub async fn ensure_for_user(&self, user_id: &str) -> Result<ChatResponseDto> {
        let existing = sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE user_id = ? AND is_archived = 0
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(chat) => Ok(chat.into()),
            None => {
                self.create(
                    user_id,
                    CreateChatDto {
                        title: None,
                        model: None,
                    },
                )
                .await
            }
        }
    }

    /// Get a chat by id; returns None when absent or owned by someone else
    pub async fn get_by_id(&self, id: Uuid, user_id: &str) -> Result<Option<ChatResponseDto>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE id = ? AND user_id = ?
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat.map(|c| c.into()))
    }

    /// List the user's chats, newest first
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ChatResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let chats = sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((chats.into_iter().map(|c| c.into()).collect(), total))
    }

    /// Update title/model/star/archive flags; write-class ownership check
    pub async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        dto: UpdateChatDto,
    ) -> Result<ChatResponseDto> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat '{}' not found", id)))?;

        if chat.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this chat".to_string(),
            ));
        }

        let title = dto.title.unwrap_or(chat.title);
        let model = dto.model.unwrap_or(chat.model);
        let is_starred = dto.is_starred.unwrap_or(chat.is_starred);
        let is_archived = dto.is_archived.unwrap_or(chat.is_archived);
        let updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE chats
            SET title = ?, model = ?, is_starred = ?, is_archived = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&model)
        .bind(is_starred)
        .bind(is_archived)
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(ChatResponseDto {
            id,
            title,
            model,
            is_starred,
            is_archived,
            created_at: chat.created_at,
            updated_at,
        })
    }

    /// Resolve a chat for a write under it (message/artifact create).
    ///
    /// Missing chat is NotFound, foreign chat is Forbidden; the caller
    /// stamps the returned owner onto the child record.
    pub async fn resolve_owned(&self, id: Uuid, user_id: &str) -> Result<Chat> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat '{}' not found", id)))?;

        if chat.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to write to this chat".to_string(),
            ));
        }

        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn empty_create() -> CreateChatDto {
        CreateChatDto {
            title: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = ChatService::new(test_pool().await);

        let chat = service.create("user-a", empty_create()).await.unwrap();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
        assert_eq!(chat.model, DEFAULT_CHAT_MODEL);
        assert!(!chat.is_starred);

        let fetched = service.get_by_id(chat.id, "user-a").await.unwrap();
        assert_eq!(fetched.unwrap().id, chat.id);
    }

    #[tokio::test]
    async fn test_get_by_other_user_is_silent() {
        let service = ChatService::new(test_pool().await);
        let chat = service.create("user-a", empty_create()).await.unwrap();

        // Read-class access by a non-owner returns nothing, same as absent
        let fetched = service.get_by_id(chat.id, "user-b").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let service = ChatService::new(test_pool().await);
        let chat = service.create("user-a", empty_create()).await.unwrap();

        let err = service
            .update(
                chat.id,
                "user-b",
                UpdateChatDto {
                    title: Some("hijacked".to_string()),
                    model: None,
                    is_starred: None,
                    is_archived: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = ChatService::new(test_pool().await);

        let err = service
            .update(
                Uuid::now_v7(),
                "user-a",
                UpdateChatDto {
                    title: None,
                    model: None,
                    is_starred: Some(true),
                    is_archived: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = ChatService::new(test_pool().await);

        let first = service.create("user-a", empty_create()).await.unwrap();
        let second = service.create("user-a", empty_create()).await.unwrap();
        // Another user's chats must not appear
        service.create("user-b", empty_create()).await.unwrap();

        let (chats, total) = service
            .list_by_owner("user-a", &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, second.id);
        assert_eq!(chats[1].id, first.id);
        assert!(chats[0].created_at >= chats[1].created_at);
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let service = ChatService::new(test_pool().await);

        let ensured = service.ensure_for_user("user-a").await.unwrap();
        let again = service.ensure_for_user("user-a").await.unwrap();
        assert_eq!(ensured.id, again.id);

        let (chats, _) = service
            .list_by_owner("user-a", &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(chats.len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let service = ChatService::new(test_pool().await);
        let chat = service
            .create(
                "user-a",
                CreateChatDto {
                    title: Some("Rust questions".to_string()),
                    model: None,
                },
            )
            .await
            .unwrap();

        let updated = service
            .update(
                chat.id,
                "user-a",
                UpdateChatDto {
                    title: None,
                    model: None,
                    is_starred: Some(true),
                    is_archived: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Rust questions");
        assert!(updated.is_starred);
        assert!(updated.updated_at >= chat.updated_at);
    }
}
