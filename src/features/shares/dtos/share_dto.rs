use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::shares::models::{ShareAccessLevel, ShareContentType, SharedLink};

/// Response DTO for a shared link; the password hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareResponseDto {
    pub share_id: String,
    pub content_type: ShareContentType,
    pub content_ref: Uuid,
    pub access_level: ShareAccessLevel,
    pub allowed_domains: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SharedLink> for ShareResponseDto {
    fn from(s: SharedLink) -> Self {
        Self {
            share_id: s.share_id,
            content_type: s.content_type,
            content_ref: s.content_ref,
            access_level: s.access_level,
            allowed_domains: s.allowed_domains.map(|j| j.0),
            expires_at: s.expires_at,
            view_count: s.view_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Request DTO for sharing a chat or artifact
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateShareDto {
    pub content_type: ShareContentType,
    pub content_ref: Uuid,
    pub access_level: ShareAccessLevel,
    /// Required when `access_level` is `password`
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
    /// Required when `access_level` is `domain`
    pub allowed_domains: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request DTO for changing how a link may be resolved
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateShareDto {
    pub access_level: Option<ShareAccessLevel>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
    pub allowed_domains: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Credentials a visitor presents when resolving a link
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ResolveShareQuery {
    pub password: Option<String>,
    pub domain: Option<String>,
}

/// What a visitor gets back from a resolved link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedShareDto {
    pub share_id: String,
    pub content_type: ShareContentType,
    pub content_ref: Uuid,
}
