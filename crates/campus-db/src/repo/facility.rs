//! Facility repository - facilities of a unit and their image galleries.

use async_trait::async_trait;
use campus_core::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{NewImage, apply_order};
use crate::{DbError, DbResult};

/// A place inside a unit (library, sports court, lab...).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Facility {
    pub id: uuid::Uuid,
    pub unit_id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FacilityImage {
    pub id: uuid::Uuid,
    pub facility_id: uuid::Uuid,
    pub key: String,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[async_trait]
pub trait FacilityRepo: Send + Sync {
    // Facilities
    async fn list_by_unit(&self, unit_id: ResourceId) -> DbResult<Vec<Facility>>;
    async fn get(&self, id: ResourceId) -> DbResult<Facility>;
    async fn create(&self, unit_id: ResourceId, input: &FacilityInput) -> DbResult<Facility>;
    async fn update(&self, id: ResourceId, input: &FacilityInput) -> DbResult<Facility>;
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Facility>;

    // Images
    async fn list_images(&self, facility_id: ResourceId) -> DbResult<Vec<FacilityImage>>;
    /// Images of every facility of a unit, in facility then image order.
    async fn list_images_for_unit(&self, unit_id: ResourceId) -> DbResult<Vec<FacilityImage>>;
    async fn add_images(
        &self,
        facility_id: ResourceId,
        images: &[NewImage],
    ) -> DbResult<Vec<FacilityImage>>;
    async fn get_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage>;
    async fn delete_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage>;
    async fn reorder_images(&self, facility_id: ResourceId, ids: &[ResourceId]) -> DbResult<()>;
}

pub struct PgFacilityRepo {
    pool: PgPool,
}

impl PgFacilityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityRepo for PgFacilityRepo {
    async fn list_by_unit(&self, unit_id: ResourceId) -> DbResult<Vec<Facility>> {
        let facilities = sqlx::query_as::<_, Facility>(
            "SELECT * FROM facilities WHERE unit_id = $1 ORDER BY position, name",
        )
        .bind(unit_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(facilities)
    }

    async fn get(&self, id: ResourceId) -> DbResult<Facility> {
        let facility = sqlx::query_as::<_, Facility>("SELECT * FROM facilities WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("facility {}", id)))?;
        Ok(facility)
    }

    async fn create(&self, unit_id: ResourceId, input: &FacilityInput) -> DbResult<Facility> {
        let facility = sqlx::query_as::<_, Facility>(
            r#"
            INSERT INTO facilities (id, unit_id, name, description, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM facilities WHERE unit_id = $2),
                NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(unit_id.as_uuid())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DbError::NotFound(format!("unit {}", unit_id))
            }
            other => other.into(),
        })?;
        Ok(facility)
    }

    async fn update(&self, id: ResourceId, input: &FacilityInput) -> DbResult<Facility> {
        let facility = sqlx::query_as::<_, Facility>(
            r#"
            UPDATE facilities
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("facility {}", id)))?;
        Ok(facility)
    }

    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Facility> {
        let facility =
            sqlx::query_as::<_, Facility>("DELETE FROM facilities WHERE id = $1 RETURNING *")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("facility {}", id)))?;
        Ok(facility)
    }

    async fn list_images(&self, facility_id: ResourceId) -> DbResult<Vec<FacilityImage>> {
        let images = sqlx::query_as::<_, FacilityImage>(
            "SELECT * FROM facility_images WHERE facility_id = $1 ORDER BY position, created_at",
        )
        .bind(facility_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn list_images_for_unit(&self, unit_id: ResourceId) -> DbResult<Vec<FacilityImage>> {
        let images = sqlx::query_as::<_, FacilityImage>(
            r#"
            SELECT i.* FROM facility_images i
            JOIN facilities f ON f.id = i.facility_id
            WHERE f.unit_id = $1
            ORDER BY f.position, i.position, i.created_at
            "#,
        )
        .bind(unit_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn add_images(
        &self,
        facility_id: ResourceId,
        images: &[NewImage],
    ) -> DbResult<Vec<FacilityImage>> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM facilities WHERE id = $1)")
                .bind(facility_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(DbError::NotFound(format!("facility {}", facility_id)));
        }

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM facility_images WHERE facility_id = $1",
        )
        .bind(facility_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let mut inserted = Vec::with_capacity(images.len());
        for (offset, image) in images.iter().enumerate() {
            let row = sqlx::query_as::<_, FacilityImage>(
                r#"
                INSERT INTO facility_images (id, facility_id, key, url, position, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                RETURNING *
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(facility_id.as_uuid())
            .bind(&image.key)
            .bind(&image.url)
            .bind(next + offset as i32)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage> {
        let image = sqlx::query_as::<_, FacilityImage>(
            "SELECT * FROM facility_images WHERE id = $1 AND facility_id = $2",
        )
        .bind(image_id.as_uuid())
        .bind(facility_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("facility image {}", image_id)))?;
        Ok(image)
    }

    async fn delete_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage> {
        let image = sqlx::query_as::<_, FacilityImage>(
            "DELETE FROM facility_images WHERE id = $1 AND facility_id = $2 RETURNING *",
        )
        .bind(image_id.as_uuid())
        .bind(facility_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("facility image {}", image_id)))?;
        Ok(image)
    }

    async fn reorder_images(&self, facility_id: ResourceId, ids: &[ResourceId]) -> DbResult<()> {
        apply_order(
            &self.pool,
            "facility_images",
            Some(("facility_id", facility_id)),
            ids,
        )
        .await
    }
}
