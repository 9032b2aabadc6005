use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::artifacts::dtos::{CacheProviderFileDto, ProviderFileEntryDto};
use crate::features::artifacts::models::{Artifact, ProviderFileEntry, ProviderFileMap};
use crate::features::artifacts::services::artifact_service::ARTIFACT_COLUMNS;
use crate::shared::validation::PROVIDER_NAME_REGEX;

/// Service for the per-artifact provider-file cache.
///
/// Entries track the file handle an AI provider issued for an artifact's
/// content so repeat requests can reuse the upload. Expired entries read as
/// misses but stay stored until the sweep removes them.
pub struct ProviderCacheService {
    pool: SqlitePool,
}

impl ProviderCacheService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate_provider(provider: &str) -> Result<()> {
        if !PROVIDER_NAME_REGEX.is_match(provider) {
            return Err(AppError::Validation(format!(
                "Invalid provider name '{}'",
                provider
            )));
        }
        Ok(())
    }

    /// Insert or replace the cache entry for one provider.
    ///
    /// Counts as a reference: bumps `usage_count` and `last_referenced_at`.
    /// The read-merge-write runs inside one transaction so concurrent
    /// upserts for different providers don't drop each other's entries.
    pub async fn upsert(
        &self,
        artifact_key: &str,
        user_id: &str,
        provider: &str,
        dto: CacheProviderFileDto,
    ) -> Result<ProviderFileEntryDto> {
        Self::validate_provider(provider)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let artifact = sqlx::query_as::<_, Artifact>(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE artifact_id = ?"
        ))
        .bind(artifact_key)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artifact '{}' not found", artifact_key)))?;

        if artifact.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this artifact".to_string(),
            ));
        }

        let entry = ProviderFileEntry {
            external_file_id: dto.external_file_id,
            uploaded_at: dto.uploaded_at.unwrap_or(now),
            last_used_at: now,
            expires_at: dto.expires_at,
        };

        let mut map = artifact.provider_files.map(|j| j.0).unwrap_or_default();
        map.insert(provider.to_string(), entry.clone());

        sqlx::query(
            r#"
            UPDATE artifacts
            SET provider_files = ?, usage_count = usage_count + 1,
                last_referenced_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Json(&map))
        .bind(now)
        .bind(now)
        .bind(artifact.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Provider file cached: key={}, provider={}",
            artifact_key,
            provider
        );

        Ok(ProviderFileEntryDto::from_entry(provider, entry))
    }

    /// Look up the cache entry for one provider.
    ///
    /// None when the artifact isn't visible, the provider has no entry, or
    /// the entry has expired. An expired entry is reported as a miss but
    /// left in place for the sweep.
    pub async fn get(
        &self,
        artifact_key: &str,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<ProviderFileEntryDto>> {
        Self::validate_provider(provider)?;

        let row = sqlx::query_as::<_, (Option<Json<ProviderFileMap>>,)>(
            "SELECT provider_files FROM artifacts WHERE artifact_id = ? AND user_id = ?",
        )
        .bind(artifact_key)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((Some(Json(map)),)) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        Ok(map
            .get(provider)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| ProviderFileEntryDto::from_entry(provider, entry.clone())))
    }

    /// Record a reuse of a cached provider file: refreshes `last_used_at`
    /// and bumps the artifact's `usage_count`. Missing or expired entries
    /// make this a no-op returning None.
    pub async fn touch(
        &self,
        artifact_key: &str,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<ProviderFileEntryDto>> {
        Self::validate_provider(provider)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let artifact = sqlx::query_as::<_, Artifact>(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE artifact_id = ?"
        ))
        .bind(artifact_key)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artifact '{}' not found", artifact_key)))?;

        if artifact.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this artifact".to_string(),
            ));
        }

        let mut map = match artifact.provider_files {
            Some(Json(map)) => map,
            None => return Ok(None),
        };

        let Some(entry) = map.get_mut(provider) else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            return Ok(None);
        }

        entry.last_used_at = now;
        let touched = entry.clone();

        sqlx::query(
            r#"
            UPDATE artifacts
            SET provider_files = ?, usage_count = usage_count + 1,
                last_referenced_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Json(&map))
        .bind(now)
        .bind(now)
        .bind(artifact.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ProviderFileEntryDto::from_entry(provider, touched)))
    }

    /// Drop every expired entry across all artifacts.
    ///
    /// A map that empties out is stored back as NULL. A failure on one
    /// record is logged and skipped so the rest of the sweep proceeds.
    /// Returns the number of entries removed.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let now = Utc::now();

        // Fetched as raw text and decoded row by row, so one undecodable
        // map cannot abort the whole sweep.
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, provider_files FROM artifacts WHERE provider_files IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut removed_count: u64 = 0;
        for (id, raw) in rows {
            let mut map: ProviderFileMap = match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!("Sweep skipped artifact {}: undecodable entry map: {}", id, e);
                    continue;
                }
            };

            let before = map.len();
            map.retain(|_, entry| !entry.is_expired(now));
            let removed = before - map.len();
            if removed == 0 {
                continue;
            }

            let stored = if map.is_empty() { None } else { Some(Json(&map)) };
            let result = sqlx::query(
                "UPDATE artifacts SET provider_files = ?, updated_at = ? WHERE id = ?",
            )
            .bind(stored)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => removed_count += removed as u64,
                Err(e) => {
                    tracing::warn!("Sweep skipped artifact {}: {:?}", id, e);
                }
            }
        }

        if removed_count > 0 {
            tracing::info!("Provider-file sweep removed {} entries", removed_count);
        }

        Ok(removed_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::artifacts::dtos::CreateArtifactDto;
    use crate::features::artifacts::services::ArtifactService;
    use crate::features::chats::dtos::CreateChatDto;
    use crate::features::chats::services::ChatService;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed_artifact(pool: &SqlitePool, user: &str) -> String {
        let chat_id = ChatService::new(pool.clone())
            .create(
                user,
                CreateChatDto {
                    title: None,
                    model: None,
                },
            )
            .await
            .unwrap()
            .id;
        ArtifactService::new(pool.clone())
            .create(
                user,
                CreateArtifactDto {
                    chat_id,
                    message_id: Uuid::now_v7(),
                    filename: "snippet".to_string(),
                    language: "markdown".to_string(),
                    content: "# hi".to_string(),
                },
            )
            .await
            .unwrap()
            .artifact_id
    }

    fn cache_dto(expires_at: Option<chrono::DateTime<Utc>>) -> CacheProviderFileDto {
        CacheProviderFileDto {
            external_file_id: "file-abc".to_string(),
            uploaded_at: None,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_upsert_then_get_round_trip() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool.clone());

        cache
            .upsert(&key, "user-a", "openai", cache_dto(None))
            .await
            .unwrap();

        let entry = cache.get(&key, "user-a", "openai").await.unwrap().unwrap();
        assert_eq!(entry.external_file_id, "file-abc");
        assert_eq!(entry.provider, "openai");

        // Unknown provider and foreign user both miss silently
        assert!(cache.get(&key, "user-a", "gemini").await.unwrap().is_none());
        assert!(cache.get(&key, "user-b", "openai").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_counts_usage() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let artifacts = ArtifactService::new(pool.clone());
        let cache = ProviderCacheService::new(pool);

        cache
            .upsert(&key, "user-a", "openai", cache_dto(None))
            .await
            .unwrap();
        cache
            .upsert(
                &key,
                "user-a",
                "openai",
                CacheProviderFileDto {
                    external_file_id: "file-def".to_string(),
                    uploaded_at: None,
                    expires_at: None,
                },
            )
            .await
            .unwrap();

        let entry = cache.get(&key, "user-a", "openai").await.unwrap().unwrap();
        assert_eq!(entry.external_file_id, "file-def");

        let artifact = artifacts.get_by_key(&key, "user-a").await.unwrap().unwrap();
        assert_eq!(artifact.usage_count, 2);
        assert!(artifact.last_referenced_at.is_some());
    }

    #[tokio::test]
    async fn test_entries_for_different_providers_coexist() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool);

        cache
            .upsert(&key, "user-a", "openai", cache_dto(None))
            .await
            .unwrap();
        cache
            .upsert(&key, "user-a", "gemini", cache_dto(None))
            .await
            .unwrap();

        assert!(cache.get(&key, "user-a", "openai").await.unwrap().is_some());
        assert!(cache.get(&key, "user-a", "gemini").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss_until_swept() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool.clone());

        let past = Utc::now() - chrono::Duration::hours(1);
        cache
            .upsert(&key, "user-a", "openai", cache_dto(Some(past)))
            .await
            .unwrap();

        // Expired: reads miss, but the stored map still holds the entry
        assert!(cache.get(&key, "user-a", "openai").await.unwrap().is_none());

        let (stored,): (Option<Json<ProviderFileMap>>,) =
            sqlx::query_as("SELECT provider_files FROM artifacts WHERE artifact_id = ?")
                .bind(&key)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(stored.unwrap().0.contains_key("openai"));

        let removed = cache.sweep_expired().await.unwrap();
        assert_eq!(removed, 1);

        // Map emptied out, so the column went back to NULL
        let (stored,): (Option<Json<ProviderFileMap>>,) =
            sqlx::query_as("SELECT provider_files FROM artifacts WHERE artifact_id = ?")
                .bind(&key)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool);

        let past = Utc::now() - chrono::Duration::hours(1);
        let future = Utc::now() + chrono::Duration::hours(1);
        cache
            .upsert(&key, "user-a", "openai", cache_dto(Some(past)))
            .await
            .unwrap();
        cache
            .upsert(&key, "user-a", "gemini", cache_dto(Some(future)))
            .await
            .unwrap();
        cache
            .upsert(&key, "user-a", "anthropic", cache_dto(None))
            .await
            .unwrap();

        let removed = cache.sweep_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(cache.get(&key, "user-a", "gemini").await.unwrap().is_some());
        assert!(cache
            .get(&key, "user-a", "anthropic")
            .await
            .unwrap()
            .is_some());

        // Nothing left to remove on a second pass
        assert_eq!(cache.sweep_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_continues_past_undecodable_map() {
        let pool = test_pool().await;
        let healthy = seed_artifact(&pool, "user-a").await;
        let corrupt = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool.clone());

        let past = Utc::now() - chrono::Duration::hours(1);
        cache
            .upsert(&healthy, "user-a", "openai", cache_dto(Some(past)))
            .await
            .unwrap();

        sqlx::query("UPDATE artifacts SET provider_files = 'not json' WHERE artifact_id = ?")
            .bind(&corrupt)
            .execute(&pool)
            .await
            .unwrap();

        // The bad row is skipped; the healthy artifact's expired entry still goes
        let removed = cache.sweep_expired().await.unwrap();
        assert_eq!(removed, 1);

        let (stored,): (Option<Json<ProviderFileMap>>,) =
            sqlx::query_as("SELECT provider_files FROM artifacts WHERE artifact_id = ?")
                .bind(&healthy)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_touch_refreshes_and_counts() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let artifacts = ArtifactService::new(pool.clone());
        let cache = ProviderCacheService::new(pool);

        cache
            .upsert(&key, "user-a", "openai", cache_dto(None))
            .await
            .unwrap();

        let touched = cache.touch(&key, "user-a", "openai").await.unwrap();
        assert!(touched.is_some());

        let artifact = artifacts.get_by_key(&key, "user-a").await.unwrap().unwrap();
        assert_eq!(artifact.usage_count, 2);

        // Touching a provider with no entry is a silent no-op
        let missed = cache.touch(&key, "user-a", "gemini").await.unwrap();
        assert!(missed.is_none());
        let artifact = artifacts.get_by_key(&key, "user-a").await.unwrap().unwrap();
        assert_eq!(artifact.usage_count, 2);
    }

    #[tokio::test]
    async fn test_writes_to_foreign_artifact_are_loud() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool);

        let err = cache
            .upsert(&key, "user-b", "openai", cache_dto(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = cache.touch(&key, "user-b", "openai").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = cache
            .upsert("art-missing", "user-a", "openai", cache_dto(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_provider_name_rejected() {
        let pool = test_pool().await;
        let key = seed_artifact(&pool, "user-a").await;
        let cache = ProviderCacheService::new(pool);

        for bad in ["OpenAI", "open_ai", "-openai", "openai-", ""] {
            let err = cache
                .upsert(&key, "user-a", bad, cache_dto(None))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {:?}", bad);
        }
    }
}
