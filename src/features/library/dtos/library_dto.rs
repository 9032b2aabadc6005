use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::library::models::{BackupType, LibraryBackup, LibraryFile};

/// Response DTO for a backup. The payload is omitted from listings; it
/// only comes back through a restore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupResponseDto {
    pub id: Uuid,
    pub backup_type: BackupType,
    pub is_restored: bool,
    pub created_at: DateTime<Utc>,
}

impl From<LibraryBackup> for BackupResponseDto {
    fn from(b: LibraryBackup) -> Self {
        Self {
            id: b.id,
            backup_type: b.backup_type,
            is_restored: b.is_restored,
            created_at: b.created_at,
        }
    }
}

/// Request DTO for snapshotting client-side state
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBackupDto {
    pub backup_type: BackupType,
    pub payload: serde_json::Value,
}

/// Result of restoring a backup: the stored payload, handed back as-is
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreResultDto {
    pub id: Uuid,
    pub backup_type: BackupType,
    pub payload: serde_json::Value,
}

/// Response DTO for a library file descriptor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LibraryFileResponseDto {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LibraryFile> for LibraryFileResponseDto {
    fn from(f: LibraryFile) -> Self {
        Self {
            id: f.id,
            filename: f.filename,
            content_type: f.content_type,
            size_bytes: f.size_bytes,
            storage_key: f.storage_key,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// Request DTO for registering an uploaded file's descriptor
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLibraryFileDto {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
    #[validate(range(min = 0))]
    pub size_bytes: i64,
    #[validate(length(min = 1, max = 512))]
    pub storage_key: String,
}

/// Request DTO for renaming a library file
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateLibraryFileDto {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
}
