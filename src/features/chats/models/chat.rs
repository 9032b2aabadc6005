use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a chat.
///
/// `user_id` is the immutable owner reference; it is written once at insert
/// and never transferred.
#[derive(Debug, Clone, FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub model: String,
    pub is_starred: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
