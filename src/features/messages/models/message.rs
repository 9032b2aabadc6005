use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One entry in a message's edit history.
///
/// The history is seeded with the original content on the first edit, so
/// every content the message ever held stays addressable. At most one
/// version is active; the message's `content` mirrors it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageVersion {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// An alternative reply recorded alongside a message. At most one branch
/// is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageBranch {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Database model for a chat message.
///
/// `user_id` duplicates the owning chat's owner so visibility checks never
/// need the parent row. `versions` and `branches` are NULL until first used.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub rendered_content: Option<String>,
    pub versions: Option<Json<Vec<MessageVersion>>>,
    pub branches: Option<Json<Vec<MessageBranch>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
