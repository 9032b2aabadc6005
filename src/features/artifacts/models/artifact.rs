use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::constants::PREVIEWABLE_LANGUAGES;

/// Cached external representation of an artifact held by one AI provider.
///
/// Lifecycle: absent -> present (valid) -> present (expired, still stored)
/// -> absent (after sweep). A read never extends or removes an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderFileEntry {
    pub external_file_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ProviderFileEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

/// Closed map from provider name to its cache entry
pub type ProviderFileMap = BTreeMap<String, ProviderFileEntry>;

/// Database model for an artifact.
///
/// `original_content` is frozen at insert; `edit_count` and `usage_count`
/// only ever increase. `provider_files` is NULL rather than an empty map
/// when no provider entries exist.
#[derive(Debug, Clone, FromRow)]
pub struct Artifact {
    pub id: Uuid,
    pub artifact_id: String,
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub language: String,
    pub content: String,
    pub original_content: String,
    pub edit_count: i64,
    pub is_previewable: bool,
    pub usage_count: i64,
    pub provider_files: Option<Json<ProviderFileMap>>,
    pub last_referenced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    /// Derive the preview flag from the language tag, case-insensitively.
    /// Computed once at creation and stored.
    pub fn is_previewable_language(language: &str) -> bool {
        let lowered = language.to_lowercase();
        PREVIEWABLE_LANGUAGES.contains(&lowered.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previewable_language_is_case_insensitive() {
        assert!(Artifact::is_previewable_language("html"));
        assert!(Artifact::is_previewable_language("HTML"));
        assert!(Artifact::is_previewable_language("Markdown"));
        assert!(Artifact::is_previewable_language("svg"));
    }

    #[test]
    fn test_non_previewable_languages() {
        assert!(!Artifact::is_previewable_language("rust"));
        assert!(!Artifact::is_previewable_language("python"));
        assert!(!Artifact::is_previewable_language(""));
    }

    #[test]
    fn test_entry_expiry() {
        let now = Utc::now();
        let entry = ProviderFileEntry {
            external_file_id: "f1".to_string(),
            uploaded_at: now,
            last_used_at: now,
            expires_at: Some(now - chrono::Duration::seconds(1)),
        };
        assert!(entry.is_expired(now));

        let fresh = ProviderFileEntry {
            expires_at: Some(now + chrono::Duration::hours(1)),
            ..entry.clone()
        };
        assert!(!fresh.is_expired(now));

        let unbounded = ProviderFileEntry {
            expires_at: None,
            ..entry
        };
        assert!(!unbounded.is_expired(now));
    }
}
