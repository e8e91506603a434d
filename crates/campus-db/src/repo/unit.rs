//! School unit repository.

use async_trait::async_trait;
use campus_core::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::apply_order;
use crate::{DbError, DbResult};

/// One school of the group.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Unit {
    pub id: uuid::Uuid,
    pub slug: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub map_url: Option<String>,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitInput {
    /// Derived from the name when empty.
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub map_url: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[async_trait]
pub trait UnitRepo: Send + Sync {
    async fn list(&self) -> DbResult<Vec<Unit>>;
    async fn get(&self, id: ResourceId) -> DbResult<Unit>;
    async fn get_by_slug(&self, slug: &str) -> DbResult<Unit>;
    async fn create(&self, input: &UnitInput) -> DbResult<Unit>;
    async fn update(&self, id: ResourceId, input: &UnitInput) -> DbResult<Unit>;
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Unit>;
    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()>;
}

pub struct PgUnitRepo {
    pool: PgPool,
}

impl PgUnitRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitRepo for PgUnitRepo {
    async fn list(&self) -> DbResult<Vec<Unit>> {
        let units = sqlx::query_as::<_, Unit>("SELECT * FROM units ORDER BY position, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    async fn get(&self, id: ResourceId) -> DbResult<Unit> {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("unit {}", id)))?;
        Ok(unit)
    }

    async fn get_by_slug(&self, slug: &str) -> DbResult<Unit> {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM units WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("unit with slug {}", slug)))?;
        Ok(unit)
    }

    async fn create(&self, input: &UnitInput) -> DbResult<Unit> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units
                (id, slug, name, address, phone, email, map_url, description, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM units),
                NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.map_url)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(unit)
    }

    async fn update(&self, id: ResourceId, input: &UnitInput) -> DbResult<Unit> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET slug = $2, name = $3, address = $4, phone = $5, email = $6,
                map_url = $7, description = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.map_url)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("unit {}", id)))?;
        Ok(unit)
    }

    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Unit> {
        let unit = sqlx::query_as::<_, Unit>("DELETE FROM units WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("unit {}", id)))?;
        Ok(unit)
    }

    async fn reorder(&self, ids: &[ResourceId]) -> DbResult<()> {
        apply_order(&self.pool, "units", None, ids).await
    }
}
