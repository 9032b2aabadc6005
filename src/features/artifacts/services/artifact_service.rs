use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::artifacts::dtos::{
    ArtifactResponseDto, ArtifactSeedDto, CreateArtifactDto, UpdateArtifactDto,
};
use crate::features::artifacts::models::Artifact;
use crate::shared::types::PaginationQuery;

pub(crate) const ARTIFACT_COLUMNS: &str = "id, artifact_id, chat_id, message_id, user_id, \
     filename, language, content, original_content, edit_count, is_previewable, usage_count, \
     provider_files, last_referenced_at, created_at, updated_at";

/// Service for artifact operations
pub struct ArtifactService {
    pool: SqlitePool,
}

impl ArtifactService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an artifact on behalf of the calling user.
    ///
    /// The owning chat is resolved and checked (write-class: missing chat is
    /// NotFound, foreign chat is Forbidden); the chat's owner is stamped onto
    /// the artifact.
    pub async fn create(&self, user_id: &str, dto: CreateArtifactDto) -> Result<ArtifactResponseDto> {
        let chat_owner: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM chats WHERE id = ?")
                .bind(dto.chat_id)
                .fetch_optional(&self.pool)
                .await?;

        let chat_owner = chat_owner
            .ok_or_else(|| AppError::NotFound(format!("Chat '{}' not found", dto.chat_id)))?;
        if chat_owner != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to write to this chat".to_string(),
            ));
        }

        let seed = ArtifactSeedDto {
            filename: dto.filename,
            language: dto.language,
            content: dto.content,
        };
        self.insert(&chat_owner, dto.chat_id, dto.message_id, seed)
            .await
    }

    /// Privileged create for system-initiated writes (AI-generated
    /// artifacts recorded alongside an assistant message). No ownership
    /// check; the caller supplies the owner.
    pub async fn create_system(
        &self,
        owner_id: &str,
        chat_id: Uuid,
        message_id: Uuid,
        seed: ArtifactSeedDto,
    ) -> Result<ArtifactResponseDto> {
        self.insert(owner_id, chat_id, message_id, seed).await
    }

    async fn insert(
        &self,
        owner_id: &str,
        chat_id: Uuid,
        message_id: Uuid,
        seed: ArtifactSeedDto,
    ) -> Result<ArtifactResponseDto> {
        let now = Utc::now();
        let artifact = Artifact {
            id: Uuid::now_v7(),
            artifact_id: format!("art-{}", Uuid::new_v4().simple()),
            chat_id,
            message_id,
            user_id: owner_id.to_string(),
            filename: seed.filename,
            language: seed.language.clone(),
            original_content: seed.content.clone(),
            content: seed.content,
            edit_count: 0,
            is_previewable: Artifact::is_previewable_language(&seed.language),
            usage_count: 0,
            provider_files: None,
            last_referenced_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO artifacts (
                id, artifact_id, chat_id, message_id, user_id,
                filename, language, content, original_content,
                edit_count, is_previewable, usage_count,
                provider_files, last_referenced_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(artifact.id)
        .bind(&artifact.artifact_id)
        .bind(artifact.chat_id)
        .bind(artifact.message_id)
        .bind(&artifact.user_id)
        .bind(&artifact.filename)
        .bind(&artifact.language)
        .bind(&artifact.content)
        .bind(&artifact.original_content)
        .bind(artifact.edit_count)
        .bind(artifact.is_previewable)
        .bind(artifact.usage_count)
        .bind(Option::<sqlx::types::Json<crate::features::artifacts::models::ProviderFileMap>>::None)
        .bind(artifact.last_referenced_at)
        .bind(artifact.created_at)
        .bind(artifact.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Artifact '{}' already exists",
                        artifact.artifact_id
                    ));
                }
            }
            tracing::error!("Failed to create artifact: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Artifact created: key={}, message={}, previewable={}",
            artifact.artifact_id,
            message_id,
            artifact.is_previewable
        );

        Ok(artifact.into())
    }

    /// Get an artifact by its external key; None when absent or not owned
    pub async fn get_by_key(
        &self,
        artifact_key: &str,
        user_id: &str,
    ) -> Result<Option<ArtifactResponseDto>> {
        let artifact = sqlx::query_as::<_, Artifact>(&format!(
            r#"
            SELECT {ARTIFACT_COLUMNS}
            FROM artifacts
            WHERE artifact_id = ? AND user_id = ?
            "#
        ))
        .bind(artifact_key)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(artifact.map(|a| a.into()))
    }

    /// List the user's artifacts, newest first
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ArtifactResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let artifacts = sqlx::query_as::<_, Artifact>(&format!(
            r#"
            SELECT {ARTIFACT_COLUMNS}
            FROM artifacts
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

        Ok((artifacts.into_iter().map(|a| a.into()).collect(), total))
    }

    /// List artifacts attached to one message, newest first
    pub async fn list_by_message(
        &self,
        message_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<ArtifactResponseDto>> {
        let artifacts = sqlx::query_as::<_, Artifact>(&format!(
            r#"
            SELECT {ARTIFACT_COLUMNS}
            FROM artifacts
            WHERE message_id = ? AND user_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(message_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(artifacts.into_iter().map(|a| a.into()).collect())
    }

    /// Update filename and/or content.
    ///
    /// A content write increments `edit_count` in the same statement;
    /// `original_content` is never touched.
    pub async fn update(
        &self,
        artifact_key: &str,
        user_id: &str,
        dto: UpdateArtifactDto,
    ) -> Result<ArtifactResponseDto> {
        let artifact = self.resolve_for_write(artifact_key, user_id).await?;

        let filename = dto
            .filename
            .unwrap_or_else(|| artifact.filename.clone());
        let updated_at = Utc::now();

        match dto.content {
            Some(content) => {
                sqlx::query(
                    r#"
                    UPDATE artifacts
                    SET filename = ?, content = ?, edit_count = edit_count + 1, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&filename)
                .bind(&content)
                .bind(updated_at)
                .bind(artifact.id)
                .execute(&self.pool)
                .await?;

                Ok(ArtifactResponseDto {
                    filename,
                    content,
                    edit_count: artifact.edit_count + 1,
                    updated_at,
                    ..ArtifactResponseDto::from(artifact)
                })
            }
            None => {
                sqlx::query("UPDATE artifacts SET filename = ?, updated_at = ? WHERE id = ?")
                    .bind(&filename)
                    .bind(updated_at)
                    .bind(artifact.id)
                    .execute(&self.pool)
                    .await?;

                Ok(ArtifactResponseDto {
                    filename,
                    updated_at,
                    ..ArtifactResponseDto::from(artifact)
                })
            }
        }
    }

    /// Delete an artifact.
    ///
    /// Not idempotent by contract: deleting an absent key surfaces NotFound.
    pub async fn delete(&self, artifact_key: &str, user_id: &str) -> Result<String> {
        let artifact = self.resolve_for_write(artifact_key, user_id).await?;

        sqlx::query("DELETE FROM artifacts WHERE id = ?")
            .bind(artifact.id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Artifact deleted: key={}, user={}", artifact_key, user_id);

        Ok(artifact.artifact_id)
    }

    /// Resolve an artifact for a write: absent is NotFound, foreign is
    /// Forbidden
    pub(crate) async fn resolve_for_write(
        &self,
        artifact_key: &str,
        user_id: &str,
    ) -> Result<Artifact> {
        let artifact = sqlx::query_as::<_, Artifact>(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE artifact_id = ?"
        ))
        .bind(artifact_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artifact '{}' not found", artifact_key)))?;

        if artifact.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this artifact".to_string(),
            ));
        }

        Ok(artifact)
    }
}
