use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::shares::dtos::{
    CreateShareDto, ResolveShareQuery, ResolvedShareDto, ShareResponseDto, UpdateShareDto,
};
use crate::features::shares::models::{ShareAccessLevel, ShareContentType, SharedLink};
use crate::shared::types::PaginationQuery;

const SHARE_COLUMNS: &str = "id, share_id, user_id, content_type, content_ref, access_level, \
     password_hash, allowed_domains, expires_at, view_count, created_at, updated_at";

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Service for shared links
pub struct ShareService {
    pool: SqlitePool,
}

impl ShareService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Share one of the user's chats or artifacts.
    ///
    /// The referenced content must exist and belong to the caller.
    pub async fn create(&self, user_id: &str, dto: CreateShareDto) -> Result<ShareResponseDto> {
        let password_hash = match dto.access_level {
            ShareAccessLevel::Password => {
                let password = dto.password.as_deref().ok_or_else(|| {
                    AppError::Validation(
                        "A password is required for password-protected links".to_string(),
                    )
                })?;
                Some(hash_password(password))
            }
            _ => None,
        };

        let allowed_domains = match dto.access_level {
            ShareAccessLevel::Domain => {
                let domains = dto.allowed_domains.filter(|d| !d.is_empty()).ok_or_else(|| {
                    AppError::Validation(
                        "At least one domain is required for domain-restricted links".to_string(),
                    )
                })?;
                Some(Json(domains))
            }
            _ => None,
        };

        self.check_content_ownership(dto.content_type, dto.content_ref, user_id)
            .await?;

        let now = Utc::now();
        let link = SharedLink {
            id: Uuid::now_v7(),
            share_id: Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            content_type: dto.content_type,
            content_ref: dto.content_ref,
            access_level: dto.access_level,
            password_hash,
            allowed_domains,
            expires_at: dto.expires_at,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO shared_links (
                id, share_id, user_id, content_type, content_ref, access_level,
                password_hash, allowed_domains, expires_at, view_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id)
        .bind(&link.share_id)
        .bind(&link.user_id)
        .bind(link.content_type)
        .bind(link.content_ref)
        .bind(link.access_level)
        .bind(&link.password_hash)
        .bind(&link.allowed_domains)
        .bind(link.expires_at)
        .bind(link.view_count)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create shared link: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Shared link created: share_id={}, type={:?}, level={:?}",
            link.share_id,
            link.content_type,
            link.access_level
        );

        Ok(link.into())
    }

    async fn check_content_ownership(
        &self,
        content_type: ShareContentType,
        content_ref: Uuid,
        user_id: &str,
    ) -> Result<()> {
        let (owner, label): (Option<String>, &str) = match content_type {
            ShareContentType::Chat => (
                sqlx::query_scalar("SELECT user_id FROM chats WHERE id = ?")
                    .bind(content_ref)
                    .fetch_optional(&self.pool)
                    .await?,
                "Chat",
            ),
            ShareContentType::Artifact => (
                sqlx::query_scalar("SELECT user_id FROM artifacts WHERE id = ?")
                    .bind(content_ref)
                    .fetch_optional(&self.pool)
                    .await?,
                "Artifact",
            ),
        };

        let owner =
            owner.ok_or_else(|| AppError::NotFound(format!("{} '{}' not found", label, content_ref)))?;
        if owner != user_id {
            return Err(AppError::Forbidden(
                "You can only share your own content".to_string(),
            ));
        }
        Ok(())
    }

    /// List the user's shared links, newest first
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ShareResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shared_links WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let links = sqlx::query_as::<_, SharedLink>(&format!(
            r#"
            SELECT {SHARE_COLUMNS}
            FROM shared_links
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

        Ok((links.into_iter().map(|l| l.into()).collect(), total))
    }

    /// Get one of the user's links by its token; None when absent or not
    /// owned
    pub async fn get_by_share_id(
        &self,
        share_id: &str,
        user_id: &str,
    ) -> Result<Option<ShareResponseDto>> {
        let link = sqlx::query_as::<_, SharedLink>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shared_links WHERE share_id = ? AND user_id = ?"
        ))
        .bind(share_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link.map(|l| l.into()))
    }

    /// Change how a link may be resolved
    pub async fn update(
        &self,
        share_id: &str,
        user_id: &str,
        dto: UpdateShareDto,
    ) -> Result<ShareResponseDto> {
        let mut link = self.resolve_for_write(share_id, user_id).await?;

        if let Some(level) = dto.access_level {
            link.access_level = level;
        }
        if let Some(password) = dto.password.as_deref() {
            link.password_hash = Some(hash_password(password));
        }
        if let Some(domains) = dto.allowed_domains {
            link.allowed_domains = Some(Json(domains));
        }
        if dto.expires_at.is_some() {
            link.expires_at = dto.expires_at;
        }

        match link.access_level {
            ShareAccessLevel::Password if link.password_hash.is_none() => {
                return Err(AppError::Validation(
                    "A password is required for password-protected links".to_string(),
                ));
            }
            ShareAccessLevel::Domain
                if link.allowed_domains.as_ref().is_none_or(|d| d.0.is_empty()) =>
            {
                return Err(AppError::Validation(
                    "At least one domain is required for domain-restricted links".to_string(),
                ));
            }
            _ => {}
        }

        link.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE shared_links
            SET access_level = ?, password_hash = ?, allowed_domains = ?,
                expires_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(link.access_level)
        .bind(&link.password_hash)
        .bind(&link.allowed_domains)
        .bind(link.expires_at)
        .bind(link.updated_at)
        .bind(link.id)
        .execute(&self.pool)
        .await?;

        Ok(link.into())
    }

    /// Revoke a link. Not idempotent: a second delete surfaces NotFound.
    pub async fn delete(&self, share_id: &str, user_id: &str) -> Result<String> {
        let link = self.resolve_for_write(share_id, user_id).await?;

        sqlx::query("DELETE FROM shared_links WHERE id = ?")
            .bind(link.id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Shared link revoked: share_id={}", share_id);

        Ok(link.share_id)
    }

    /// Resolve a link for an anonymous visitor.
    ///
    /// Expired links read as if they never existed. Password and domain
    /// checks reject loudly; a successful resolve counts a view.
    pub async fn resolve_public(
        &self,
        share_id: &str,
        query: &ResolveShareQuery,
    ) -> Result<ResolvedShareDto> {
        let link = sqlx::query_as::<_, SharedLink>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shared_links WHERE share_id = ?"
        ))
        .bind(share_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Share '{}' not found", share_id)))?;

        if link.is_expired(Utc::now()) {
            return Err(AppError::NotFound(format!(
                "Share '{}' not found",
                share_id
            )));
        }

        match link.access_level {
            ShareAccessLevel::Public => {}
            ShareAccessLevel::Password => {
                let presented = query.password.as_deref().unwrap_or_default();
                let matches = link
                    .password_hash
                    .as_deref()
                    .is_some_and(|stored| stored == hash_password(presented));
                if !matches {
                    return Err(AppError::Forbidden(
                        "This link requires the correct password".to_string(),
                    ));
                }
            }
            ShareAccessLevel::Domain => {
                let presented = query.domain.as_deref().unwrap_or_default().to_lowercase();
                let allowed = link.allowed_domains.as_ref().is_some_and(|domains| {
                    domains.0.iter().any(|d| d.to_lowercase() == presented)
                });
                if !allowed {
                    return Err(AppError::Forbidden(
                        "This link is restricted to specific domains".to_string(),
                    ));
                }
            }
        }

        sqlx::query("UPDATE shared_links SET view_count = view_count + 1 WHERE id = ?")
            .bind(link.id)
            .execute(&self.pool)
            .await?;

        Ok(ResolvedShareDto {
            share_id: link.share_id,
            content_type: link.content_type,
            content_ref: link.content_ref,
        })
    }

    async fn resolve_for_write(&self, share_id: &str, user_id: &str) -> Result<SharedLink> {
        let link = sqlx::query_as::<_, SharedLink>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shared_links WHERE share_id = ?"
        ))
        .bind(share_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Share '{}' not found", share_id)))?;

        if link.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't have permission to modify this link".to_string(),
            ));
        }

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    async fn seed_chat(pool: &SqlitePool, user: &str) -> Uuid {
        ChatService::new(pool.clone())
            .create(
                user,
                CreateChatDto {
                    title: None,
                    model: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    fn share_dto(content_ref: Uuid, access_level: ShareAccessLevel) -> CreateShareDto {
        CreateShareDto {
            content_type: ShareContentType::Chat,
            content_ref,
            access_level,
            password: None,
            allowed_domains: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_public_link_resolves_and_counts_views() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let link = service
            .create("user-a", share_dto(chat_id, ShareAccessLevel::Public))
            .await
            .unwrap();
        assert_eq!(link.share_id.len(), 32);

        let resolved = service
            .resolve_public(&link.share_id, &ResolveShareQuery::default())
            .await
            .unwrap();
        assert_eq!(resolved.content_ref, chat_id);

        service
            .resolve_public(&link.share_id, &ResolveShareQuery::default())
            .await
            .unwrap();

        let stored = service
            .get_by_share_id(&link.share_id, "user-a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.view_count, 2);
    }

    #[tokio::test]
    async fn test_password_link_requires_matching_password() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let link = service
            .create(
                "user-a",
                CreateShareDto {
                    password: Some("hunter22".to_string()),
                    ..share_dto(chat_id, ShareAccessLevel::Password)
                },
            )
            .await
            .unwrap();

        let err = service
            .resolve_public(&link.share_id, &ResolveShareQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .resolve_public(
                &link.share_id,
                &ResolveShareQuery {
                    password: Some("wrong".to_string()),
                    domain: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let resolved = service
            .resolve_public(
                &link.share_id,
                &ResolveShareQuery {
                    password: Some("hunter22".to_string()),
                    domain: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.content_ref, chat_id);
    }

    #[tokio::test]
    async fn test_domain_link_checks_allow_list() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let link = service
            .create(
                "user-a",
                CreateShareDto {
                    allowed_domains: Some(vec!["example.com".to_string()]),
                    ..share_dto(chat_id, ShareAccessLevel::Domain)
                },
            )
            .await
            .unwrap();

        let resolved = service
            .resolve_public(
                &link.share_id,
                &ResolveShareQuery {
                    password: None,
                    domain: Some("Example.COM".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.content_ref, chat_id);

        let err = service
            .resolve_public(
                &link.share_id,
                &ResolveShareQuery {
                    password: None,
                    domain: Some("other.org".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_expired_link_reads_as_absent() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let link = service
            .create(
                "user-a",
                CreateShareDto {
                    expires_at: Some(Utc::now() - chrono::Duration::hours(1)),
                    ..share_dto(chat_id, ShareAccessLevel::Public)
                },
            )
            .await
            .unwrap();

        let err = service
            .resolve_public(&link.share_id, &ResolveShareQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // The owner can still see and manage the expired link
        assert!(service
            .get_by_share_id(&link.share_id, "user-a")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_sharing_requires_ownership_of_the_content() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let err = service
            .create("user-b", share_dto(chat_id, ShareAccessLevel::Public))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .create(
                "user-a",
                share_dto(Uuid::now_v7(), ShareAccessLevel::Public),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Password level without a password is rejected before any lookup
        let err = service
            .create("user-a", share_dto(chat_id, ShareAccessLevel::Password))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_revoke_is_not_idempotent() {
        let pool = test_pool().await;
        let chat_id = seed_chat(&pool, "user-a").await;
        let service = ShareService::new(pool);

        let link = service
            .create("user-a", share_dto(chat_id, ShareAccessLevel::Public))
            .await
            .unwrap();

        service.delete(&link.share_id, "user-a").await.unwrap();
        let err = service.delete(&link.share_id, "user-a").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .resolve_public(&link.share_id, &ResolveShareQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
