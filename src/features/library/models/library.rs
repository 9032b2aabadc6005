use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// What a backup snapshot covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    Settings,
    Chats,
    Artifacts,
    Full,
}

/// Database model for a library backup.
///
/// `is_restored` only ever flips false -> true; the payload itself is
/// opaque to the server.
#[derive(Debug, Clone, FromRow)]
pub struct LibraryBackup {
    pub id: Uuid,
    pub user_id: String,
    pub backup_type: BackupType,
    pub payload: Json<serde_json::Value>,
    pub is_restored: bool,
    pub created_at: DateTime<Utc>,
}

/// Database model for a library file's metadata. The bytes live in
/// external storage under `storage_key`; only the descriptor is kept here.
#[derive(Debug, Clone, FromRow)]
pub struct LibraryFile {
    pub id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
