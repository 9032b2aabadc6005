use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// What a shared link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareContentType {
    Chat,
    Artifact,
}

/// Who may resolve a shared link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareAccessLevel {
    /// Anyone with the link
    Public,
    /// Anyone with the link and the password
    Password,
    /// Anyone whose email domain is on the allow-list
    Domain,
}

/// Database model for a shared link.
///
/// `share_id` is the opaque token in the public URL. `password_hash` and
/// `allowed_domains` are populated only for their respective access
/// levels. An expired link resolves as if it never existed.
#[derive(Debug, Clone, FromRow)]
pub struct SharedLink {
    pub id: Uuid,
    pub share_id: String,
    pub user_id: String,
    pub content_type: ShareContentType,
    pub content_ref: Uuid,
    pub access_level: ShareAccessLevel,
    pub password_hash: Option<String>,
    pub allowed_domains: Option<Json<Vec<String>>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}
