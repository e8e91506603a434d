//! Curriculum page repository.

use async_trait::async_trait;
use campus_core::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::apply_order;
use crate::{DbError, DbResult};

/// A curriculum stage (early years, elementary, high school...).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Curriculum {
    pub id: uuid::Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub cover_key: Option<String>,
    pub cover_url: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumInput {
    /// Derived from the title when empty.
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
}

#[async_trait]
pub trait CurriculumRepo: Send + Sync {
    async fn list(&self) -> DbResult<Vec<Curriculum>>;
    async fn get(&self, id: ResourceId) -> DbResult<Curriculum>;
    async fn get_by_slug(&self, slug: &str) -> DbResult<Curriculum>;
    async fn create(&self, input: &CurriculumInput) -> DbResult<Curriculum>;
    async fn update(&self, id: ResourceId, input: &CurriculumInput) -> DbResult<Curriculum>;
    async fn set_cover(&self, id: ResourceId, key: &str, url: &str) -> DbResult<Curriculum>;
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Curriculum>;
    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()>;
}

pub struct PgCurriculumRepo {
    pool: PgPool,
}

impl PgCurriculumRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurriculumRepo for PgCurriculumRepo {
    async fn list(&self) -> DbResult<Vec<Curriculum>> {
        let rows =
            sqlx::query_as::<_, Curriculum>("SELECT * FROM curricula ORDER BY position, title")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn get(&self, id: ResourceId) -> DbResult<Curriculum> {
        let row = sqlx::query_as::<_, Curriculum>("SELECT * FROM curricula WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("curriculum {}", id)))?;
        Ok(row)
    }

    async fn get_by_slug(&self, slug: &str) -> DbResult<Curriculum> {
        let row = sqlx::query_as::<_, Curriculum>("SELECT * FROM curricula WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("curriculum with slug {}", slug)))?;
        Ok(row)
    }

    async fn create(&self, input: &CurriculumInput) -> DbResult<Curriculum> {
        let row = sqlx::query_as::<_, Curriculum>(
            r#"
            INSERT INTO curricula (id, slug, title, summary, body, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM curricula),
                NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: ResourceId, input: &CurriculumInput) -> DbResult<Curriculum> {
        let row = sqlx::query_as::<_, Curriculum>(
            r#"
            UPDATE curricula
            SET slug = $2, title = $3, summary = $4, body = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(&input.body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("curriculum {}", id)))?;
        Ok(row)
    }

    async fn set_cover(&self, id: ResourceId, key: &str, url: &str) -> DbResult<Curriculum> {
        let row = sqlx::query_as::<_, Curriculum>(
            r#"
            UPDATE curricula
            SET cover_key = $2, cover_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(key)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("curriculum {}", id)))?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Curriculum> {
        let row =
            sqlx::query_as::<_, Curriculum>("DELETE FROM curricula WHERE id = $1 RETURNING *")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("curriculum {}", id)))?;
        Ok(row)
    }

    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()> {
        apply_order(&self.pool, "curricula", None, ids).await
    }
}
