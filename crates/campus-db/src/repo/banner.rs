//! Hero banner repository.

use async_trait::async_trait;
use campus_core::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::apply_order;
use crate::{DbError, DbResult};

/// A slide of the home page hero carousel.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HeroBanner {
    pub id: uuid::Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    pub image_key: String,
    pub image_url: String,
    pub position: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    pub image_key: String,
    pub image_url: String,
    pub active: bool,
}

/// Editable text fields of a banner.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerUpdate {
    pub title: String,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    pub active: bool,
}

#[async_trait]
pub trait BannerRepo: Send + Sync {
    async fn list(&self) -> DbResult<Vec<HeroBanner>>;
    async fn list_active(&self) -> DbResult<Vec<HeroBanner>>;
    async fn get(&self, id: ResourceId) -> DbResult<HeroBanner>;
    async fn create(&self, id: ResourceId, banner: &NewBanner) -> DbResult<HeroBanner>;
    async fn update(&self, id: ResourceId, update: &BannerUpdate) -> DbResult<HeroBanner>;
    async fn set_image(&self, id: ResourceId, key: &str, url: &str) -> DbResult<HeroBanner>;
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<HeroBanner>;
    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()>;
}

/// PostgreSQL implementation of BannerRepo.
pub struct PgBannerRepo {
    pool: PgPool,
}

impl PgBannerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BannerRepo for PgBannerRepo {
    async fn list(&self) -> DbResult<Vec<HeroBanner>> {
        let banners = sqlx::query_as::<_, HeroBanner>(
            "SELECT * FROM hero_banners ORDER BY position, created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(banners)
    }

    async fn list_active(&self) -> DbResult<Vec<HeroBanner>> {
        let banners = sqlx::query_as::<_, HeroBanner>(
            "SELECT * FROM hero_banners WHERE active ORDER BY position, created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(banners)
    }

    async fn get(&self, id: ResourceId) -> DbResult<HeroBanner> {
        let banner = sqlx::query_as::<_, HeroBanner>("SELECT * FROM hero_banners WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))?;
        Ok(banner)
    }

    async fn create(&self, id: ResourceId, banner: &NewBanner) -> DbResult<HeroBanner> {
        let banner = sqlx::query_as::<_, HeroBanner>(
            r#"
            INSERT INTO hero_banners
                (id, title, subtitle, link_url, image_key, image_url, position, active, created_at, updated_at)
            VALUES (
                $1, $2, $3, $4, $5, $6,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM hero_banners),
                $7, NOW(), NOW()
            )
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&banner.title)
        .bind(&banner.subtitle)
        .bind(&banner.link_url)
        .bind(&banner.image_key)
        .bind(&banner.image_url)
        .bind(banner.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(banner)
    }

    async fn update(&self, id: ResourceId, update: &BannerUpdate) -> DbResult<HeroBanner> {
        let banner = sqlx::query_as::<_, HeroBanner>(
            r#"
            UPDATE hero_banners
            SET title = $2, subtitle = $3, link_url = $4, active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&update.title)
        .bind(&update.subtitle)
        .bind(&update.link_url)
        .bind(update.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))?;
        Ok(banner)
    }

    async fn set_image(&self, id: ResourceId, key: &str, url: &str) -> DbResult<HeroBanner> {
        let banner = sqlx::query_as::<_, HeroBanner>(
            r#"
            UPDATE hero_banners
            SET image_key = $2, image_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(key)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))?;
        Ok(banner)
    }

    async fn delete_by_id(&self, id: ResourceId) -> DbResult<HeroBanner> {
        let banner =
            sqlx::query_as::<_, HeroBanner>("DELETE FROM hero_banners WHERE id = $1 RETURNING *")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))?;
        Ok(banner)
    }

    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()> {
        apply_order(&self.pool, "hero_banners", None, ids).await
    }
}
