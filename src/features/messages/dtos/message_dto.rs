use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::artifacts::dtos::ArtifactSeedDto;
use crate::features::messages::models::{Message, MessageBranch, MessageRole, MessageVersion};

/// Response DTO for a message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponseDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub rendered_content: Option<String>,
    pub versions: Vec<MessageVersion>,
    pub branches: Vec<MessageBranch>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageResponseDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            chat_id: m.chat_id,
            role: m.role,
            content: m.content,
            rendered_content: m.rendered_content,
            versions: m.versions.map(|j| j.0).unwrap_or_default(),
            branches: m.branches.map(|j| j.0).unwrap_or_default(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request DTO for recording a message in a chat.
///
/// `artifacts` carries code artifacts generated alongside an assistant
/// reply; they are created under the same owner and attached to the new
/// message.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMessageDto {
    pub chat_id: Uuid,
    pub role: MessageRole,
    #[validate(length(min = 1))]
    pub content: String,
    pub rendered_content: Option<String>,
    #[validate(nested)]
    pub artifacts: Option<Vec<ArtifactSeedDto>>,
}

/// Request DTO for editing a message's content
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EditMessageDto {
    #[validate(length(min = 1))]
    pub content: String,
    pub rendered_content: Option<String>,
}

/// Request DTO for adding an alternative reply to a message
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddBranchDto {
    #[validate(length(min = 1))]
    pub content: String,
}
