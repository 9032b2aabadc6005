use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::chats::models::Chat;

/// Response DTO for a chat
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponseDto {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub is_starred: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Chat> for ChatResponseDto {
    fn from(c: Chat) -> Self {
        Self {
            id: c.id,
            title: c.title,
            model: c.model,
            is_starred: c.is_starred,
            is_archived: c.is_archived,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Request DTO for creating a chat
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateChatDto {
    /// Chat title (defaults to "New Chat")
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// Selected model identifier (defaults to the configured default model)
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
}

/// Request DTO for updating a chat; absent fields are left untouched
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateChatDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    pub is_starred: Option<bool>,
    pub is_archived: Option<bool>,
}
