use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::library::dtos::{
    BackupResponseDto, CreateBackupDto, CreateLibraryFileDto, LibraryFileResponseDto,
    RestoreResultDto, UpdateLibraryFileDto,
};
use crate::features::library::models::{LibraryBackup, LibraryFile};
use crate::shared::types::PaginationQuery;

const BACKUP_COLUMNS: &str = "id, user_id, backup_type, payload, is_restored, created_at";
const FILE_COLUMNS: &str =
    "id, user_id, filename, content_type, size_bytes, storage_key, created_at, updated_at";

/// Service for library backups and file descriptors
pub struct LibraryService {
    pool: SqlitePool,
}

impl LibraryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Snapshot client-side state into a backup row
    pub async fn create_backup(
        &self,
        user_id: &str,
        dto: CreateBackupDto,
    ) -> Result<BackupResponseDto> {
        let backup = LibraryBackup {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            backup_type: dto.backup_type,
            payload: Json(dto.payload),
            is_restored: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO library_backups (id, user_id, backup_type, payload, is_restored, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(backup.id)
        .bind(&backup.user_id)
        .bind(backup.backup_type)
        .bind(&backup.payload)
        .bind(backup.is_restored)
        .bind(backup.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create backup: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Backup created: id={}, type={:?}, user={}",
            backup.id,
            backup.backup_type,
            user_id
        );

        Ok(backup.into())
    }

    /// List the user's backups, newest first
    pub async fn list_backups(
        &self,
        user_id: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<BackupResponseDto>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM library_backups WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let backups = sqlx::query_as::<_, LibraryBackup>(&format!(
            r#"
            SELECT {BACKUP_COLUMNS}
            FROM library_backups
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

        Ok((backups.into_iter().map(|b| b.into()).collect(), total))
    }

    /// Hand back a backup's payload and mark it restored.
    ///
    /// `is_restored` is one-way; restoring an already-restored backup
    /// hands the payload back again without complaint.
    pub async fn restore_backup(&self, id: Uuid, user_id: &str) -> Result<RestoreResultDto> {
        let backup = self.resolve_backup_for_write(id, user_id).await?;

        if !backup.is_restored {
            sqlx::query("UPDATE library_backups SET is_restored = 1 WHERE id = ?")
                .bind(backup.id)
                .execute(&self.pool)
                .await?;
        }

        tracing::info!("Backup restored: id={}, user={}", id, user_id);

        Ok(RestoreResultDto {
            id: backup.id,
            backup_type: backup.backup_type,
            payload: backup.payload.0,
        })
    }

    /// Delete a backup. Not idempotent: a second delete surfaces NotFound.
    pub async fn delete_backup(&self, id: Uuid, user_id: &str) -> Result<Uuid> {
        let backup = self.resolve_backup_for_write(id, user_id).await?;

        sqlx::query("DELETE FROM library_backups WHERE id = ?")
            .bind(backup.id)
            .execute(&self.pool)
            .await?;

        Ok(backup.id)
    }

    async fn resolve_backup_for_write(&self, id: Uuid, user_id: &str) -> Result<LibraryBackup> {
        let backup = sqlx::query_as::<_, LibraryBackup>(&format!(
            "SELECT {BACKUP_COLUMNS} FROM library_backups WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Backup '{}' not found", id)))?;

        if backup.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to access this backup".to_string(),
            ));
        }

        Ok(backup)
    }

    /// Register the descriptor of a file the client uploaded to storage
    pub async fn create_file(
        &self,
        user_id: &str,
        dto: CreateLibraryFileDto,
    ) -> Result<LibraryFileResponseDto> {
        let now = Utc::now();
        let file = LibraryFile {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            filename: dto.filename,
            content_type: dto.content_type,
            size_bytes: dto.size_bytes,
            storage_key: dto.storage_key,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO library_files (
                id, user_id, filename, content_type, size_bytes, storage_key,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.id)
        .bind(&file.user_id)
        .bind(&file.filename)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(&file.storage_key)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create library file: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(file.into())
    }

    /// List the user's file descriptors, newest first
    pub async fn list_files(
        &self,
        user_id: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<LibraryFileResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM library_files WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let files = sqlx::query_as::<_, LibraryFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM library_files
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

        Ok((files.into_iter().map(|f| f.into()).collect(), total))
    }

    /// Get a file descriptor by id; None when absent or not owned
    pub async fn get_file(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<LibraryFileResponseDto>> {
        let file = sqlx::query_as::<_, LibraryFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM library_files WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file.map(|f| f.into()))
    }

    /// Rename a library file
    pub async fn update_file(
        &self,
        id: Uuid,
        user_id: &str,
        dto: UpdateLibraryFileDto,
    ) -> Result<LibraryFileResponseDto> {
        let mut file = self.resolve_file_for_write(id, user_id).await?;

        file.filename = dto.filename;
        file.updated_at = Utc::now();

        sqlx::query("UPDATE library_files SET filename = ?, updated_at = ? WHERE id = ?")
            .bind(&file.filename)
            .bind(file.updated_at)
            .bind(file.id)
            .execute(&self.pool)
            .await?;

        Ok(file.into())
    }

    /// Delete a file descriptor. Not idempotent: a second delete surfaces
    /// NotFound.
    pub async fn delete_file(&self, id: Uuid, user_id: &str) -> Result<Uuid> {
        let file = self.resolve_file_for_write(id, user_id).await?;

        sqlx::query("DELETE FROM library_files WHERE id = ?")
            .bind(file.id)
            .execute(&self.pool)
            .await?;

        Ok(file.id)
    }

    async fn resolve_file_for_write(&self, id: Uuid, user_id: &str) -> Result<LibraryFile> {
        let file = sqlx::query_as::<_, LibraryFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM library_files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", id)))?;

        if file.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to access this file".to_string(),
            ));
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::library::models::BackupType;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_service() -> LibraryService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        LibraryService::new(pool)
    }

    fn backup_dto(payload: serde_json::Value) -> CreateBackupDto {
        CreateBackupDto {
            backup_type: BackupType::Settings,
            payload,
        }
    }

    fn file_dto(filename: &str) -> CreateLibraryFileDto {
        CreateLibraryFileDto {
            filename: filename.to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 1024,
            storage_key: format!("uploads/{}", filename),
        }
    }

    #[tokio::test]
    async fn test_restore_returns_payload_and_marks_once() {
        let service = test_service().await;

        let payload = json!({ "theme": "dark", "fontSize": 14 });
        let backup = service
            .create_backup("user-a", backup_dto(payload.clone()))
            .await
            .unwrap();
        assert!(!backup.is_restored);

        let restored = service.restore_backup(backup.id, "user-a").await.unwrap();
        assert_eq!(restored.payload, payload);

        let (listed, _) = service
            .list_backups("user-a", &PaginationQuery::default())
            .await
            .unwrap();
        assert!(listed[0].is_restored);

        // Restoring again still hands the payload back
        let again = service.restore_backup(backup.id, "user-a").await.unwrap();
        assert_eq!(again.payload, payload);
    }

    #[tokio::test]
    async fn test_backups_are_owner_scoped() {
        let service = test_service().await;

        let backup = service
            .create_backup("user-a", backup_dto(json!({})))
            .await
            .unwrap();

        let err = service
            .restore_backup(backup.id, "user-b")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let (listed, total) = service
            .list_backups("user-b", &PaginationQuery::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_backup_double_delete_is_not_found() {
        let service = test_service().await;

        let backup = service
            .create_backup("user-a", backup_dto(json!({})))
            .await
            .unwrap();

        service.delete_backup(backup.id, "user-a").await.unwrap();
        let err = service
            .delete_backup(backup.id, "user-a")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_descriptor_lifecycle() {
        let service = test_service().await;

        let file = service
            .create_file("user-a", file_dto("report.pdf"))
            .await
            .unwrap();

        // Read-soft across users
        assert!(service.get_file(file.id, "user-b").await.unwrap().is_none());

        let renamed = service
            .update_file(
                file.id,
                "user-a",
                UpdateLibraryFileDto {
                    filename: "final-report.pdf".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.filename, "final-report.pdf");
        assert_eq!(renamed.storage_key, "uploads/report.pdf");

        service.delete_file(file.id, "user-a").await.unwrap();
        let err = service.delete_file(file.id, "user-a").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_files_listed_newest_first() {
        let service = test_service().await;

        let first = service
            .create_file("user-a", file_dto("one.pdf"))
            .await
            .unwrap();
        let second = service
            .create_file("user-a", file_dto("two.pdf"))
            .await
            .unwrap();

        let (files, total) = service
            .list_files("user-a", &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(files[0].id, second.id);
        assert_eq!(files[1].id, first.id);
    }
}
