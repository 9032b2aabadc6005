use std::sync::Arc;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::artifacts::services::ArtifactService;
use crate::features::chats::services::ChatService;
use crate::features::messages::dtos::{
    AddBranchDto, CreateMessageDto, EditMessageDto, MessageResponseDto,
};
use crate::features::messages::models::{Message, MessageBranch, MessageRole, MessageVersion};

const MESSAGE_COLUMNS: &str =
    "id, chat_id, user_id, role, content, rendered_content, versions, branches, \
     created_at, updated_at";

/// Service for message operations
pub struct MessageService {
    pool: SqlitePool,
    chat_service: Arc<ChatService>,
    artifact_service: Arc<ArtifactService>,
}

impl MessageService {
    pub fn new(
        pool: SqlitePool,
        chat_service: Arc<ChatService>,
        artifact_service: Arc<ArtifactService>,
    ) -> Self {
        Self {
            pool,
            chat_service,
            artifact_service,
        }
    }

    /// Record a message in one of the user's chats.
    ///
    /// The chat's owner is stamped onto the message. Inline artifacts are
    /// only accepted on assistant messages; each one is created under the
    /// same owner and attached to the new message.
    pub async fn create(&self, user_id: &str, dto: CreateMessageDto) -> Result<MessageResponseDto> {
        if dto.artifacts.as_ref().is_some_and(|a| !a.is_empty())
            && dto.role != MessageRole::Assistant
        {
            return Err(AppError::Validation(
                "Only assistant messages can carry artifacts".to_string(),
            ));
        }

        let chat = self.chat_service.resolve_owned(dto.chat_id, user_id).await?;

        let now = Utc::now();
        let message = Message {
            id: Uuid::now_v7(),
            chat_id: chat.id,
            user_id: chat.user_id,
            role: dto.role,
            content: dto.content,
            rendered_content: dto.rendered_content,
            versions: None,
            branches: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, chat_id, user_id, role, content, rendered_content,
                versions, branches, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id)
        .bind(message.chat_id)
        .bind(&message.user_id)
        .bind(message.role)
        .bind(&message.content)
        .bind(&message.rendered_content)
        .bind(&message.versions)
        .bind(&message.branches)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create message: {:?}", e);
            AppError::Database(e)
        })?;

        if let Some(seeds) = dto.artifacts {
            for seed in seeds {
                self.artifact_service
                    .create_system(&message.user_id, message.chat_id, message.id, seed)
                    .await?;
            }
        }

        Ok(message.into())
    }

    /// List a chat's messages in conversation order (oldest first).
    ///
    /// Read-class: a missing or foreign chat yields an empty list.
    pub async fn list_by_chat(
        &self,
        chat_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<MessageResponseDto>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE chat_id = ? AND user_id = ?
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(chat_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(|m| m.into()).collect())
    }

    /// Get a message by id; None when absent or not owned
    pub async fn get_by_id(&self, id: Uuid, user_id: &str) -> Result<Option<MessageResponseDto>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message.map(|m| m.into()))
    }

    /// Replace a message's content, recording the old content in the
    /// version history.
    ///
    /// The history is seeded with the original content on the first edit;
    /// the new content becomes the single active version.
    pub async fn edit_content(
        &self,
        id: Uuid,
        user_id: &str,
        dto: EditMessageDto,
    ) -> Result<MessageResponseDto> {
        let mut message = self.resolve_for_write(id, user_id).await?;

        let now = Utc::now();
        let mut versions = message.versions.take().map(|j| j.0).unwrap_or_default();
        if versions.is_empty() {
            versions.push(MessageVersion {
                content: message.content.clone(),
                created_at: message.created_at,
                is_active: false,
            });
        }
        for version in versions.iter_mut() {
            version.is_active = false;
        }
        versions.push(MessageVersion {
            content: dto.content.clone(),
            created_at: now,
            is_active: true,
        });

        message.content = dto.content;
        if dto.rendered_content.is_some() {
            message.rendered_content = dto.rendered_content;
        }
        message.versions = Some(Json(versions));
        message.updated_at = now;

        sqlx::query(
            r#"
            UPDATE messages
            SET content = ?, rendered_content = ?, versions = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&message.content)
        .bind(&message.rendered_content)
        .bind(&message.versions)
        .bind(message.updated_at)
        .bind(message.id)
        .execute(&self.pool)
        .await?;

        Ok(message.into())
    }

    /// Switch the message's content back to an earlier version
    pub async fn set_active_version(
        &self,
        id: Uuid,
        user_id: &str,
        index: usize,
    ) -> Result<MessageResponseDto> {
        let mut message = self.resolve_for_write(id, user_id).await?;

        let mut versions = message.versions.take().map(|j| j.0).unwrap_or_default();
        let Some(selected) = versions.get(index).cloned() else {
            return Err(AppError::BadRequest(format!(
                "Message has no version {}",
                index
            )));
        };

        for (i, version) in versions.iter_mut().enumerate() {
            version.is_active = i == index;
        }

        message.content = selected.content;
        message.versions = Some(Json(versions));
        message.updated_at = Utc::now();

        sqlx::query("UPDATE messages SET content = ?, versions = ?, updated_at = ? WHERE id = ?")
            .bind(&message.content)
            .bind(&message.versions)
            .bind(message.updated_at)
            .bind(message.id)
            .execute(&self.pool)
            .await?;

        Ok(message.into())
    }

    /// Record an alternative reply; the new branch becomes the active one
    pub async fn add_branch(
        &self,
        id: Uuid,
        user_id: &str,
        dto: AddBranchDto,
    ) -> Result<MessageResponseDto> {
        let mut message = self.resolve_for_write(id, user_id).await?;

        let now = Utc::now();
        let mut branches = message.branches.take().map(|j| j.0).unwrap_or_default();
        for branch in branches.iter_mut() {
            branch.is_active = false;
        }
        branches.push(MessageBranch {
            id: Uuid::now_v7(),
            content: dto.content,
            created_at: now,
            is_active: true,
        });

        message.branches = Some(Json(branches));
        message.updated_at = now;

        sqlx::query("UPDATE messages SET branches = ?, updated_at = ? WHERE id = ?")
            .bind(&message.branches)
            .bind(message.updated_at)
            .bind(message.id)
            .execute(&self.pool)
            .await?;

        Ok(message.into())
    }

    /// Make one of the recorded branches the active one
    pub async fn set_active_branch(
        &self,
        id: Uuid,
        user_id: &str,
        branch_id: Uuid,
    ) -> Result<MessageResponseDto> {
        let mut message = self.resolve_for_write(id, user_id).await?;

        let mut branches = message.branches.take().map(|j| j.0).unwrap_or_default();
        if !branches.iter().any(|b| b.id == branch_id) {
            return Err(AppError::BadRequest(format!(
                "Message has no branch '{}'",
                branch_id
            )));
        }

        for branch in branches.iter_mut() {
            branch.is_active = branch.id == branch_id;
        }

        message.branches = Some(Json(branches));
        message.updated_at = Utc::now();

        sqlx::query("UPDATE messages SET branches = ?, updated_at = ? WHERE id = ?")
            .bind(&message.branches)
            .bind(message.updated_at)
            .bind(message.id)
            .execute(&self.pool)
            .await?;

        Ok(message.into())
    }

    /// Delete a message.
    ///
    /// Not idempotent by contract: deleting an absent id surfaces NotFound.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<Uuid> {
        let message = self.resolve_for_write(id, user_id).await?;

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message.id)
            .execute(&self.pool)
            .await?;

        Ok(message.id)
    }

    async fn resolve_for_write(&self, id: Uuid, user_id: &str) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message '{}' not found", id)))?;

        if message.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this message".to_string(),
            ));
        }

        Ok(message)
    }
}
