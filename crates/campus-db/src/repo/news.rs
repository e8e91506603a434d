//! News repository - posts and their image galleries.

use async_trait::async_trait;
use campus_core::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{NewImage, apply_order};
use crate::{DbError, DbResult};

/// A news post. Drafts have no `published_at`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsPost {
    pub id: uuid::Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A gallery image of a news post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsImage {
    pub id: uuid::Uuid,
    pub news_id: uuid::Uuid,
    pub key: String,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsInput {
    /// Derived from the title when empty.
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    // Posts
    async fn list(&self) -> DbResult<Vec<NewsPost>>;
    async fn list_published(&self, limit: i64, offset: i64) -> DbResult<Vec<NewsPost>>;
    async fn count_published(&self) -> DbResult<i64>;
    async fn get(&self, id: ResourceId) -> DbResult<NewsPost>;
    async fn get_by_slug(&self, slug: &str) -> DbResult<NewsPost>;
    async fn create(&self, input: &NewsInput) -> DbResult<NewsPost>;
    async fn update(&self, id: ResourceId, input: &NewsInput) -> DbResult<NewsPost>;
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<NewsPost>;

    // Images
    async fn list_images(&self, news_id: ResourceId) -> DbResult<Vec<NewsImage>>;
    /// The lead image of each listed post, in one query. Posts without
    /// images are absent from the result.
    async fn first_images(&self, news_ids: &[ResourceId]) -> DbResult<Vec<NewsImage>>;
    async fn add_images(&self, news_id: ResourceId, images: &[NewImage])
    -> DbResult<Vec<NewsImage>>;
    async fn get_image(&self, news_id: ResourceId, image_id: ResourceId) -> DbResult<NewsImage>;
    async fn delete_image(&self, news_id: ResourceId, image_id: ResourceId)
    -> DbResult<NewsImage>;
    async fn reorder_images(&self, news_id: ResourceId, ids: &[ResourceId]) -> DbResult<()>;
}

pub struct PgNewsRepo {
    pool: PgPool,
}

impl PgNewsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsRepo for PgNewsRepo {
    async fn list(&self) -> DbResult<Vec<NewsPost>> {
        let posts = sqlx::query_as::<_, NewsPost>(
            "SELECT * FROM news_posts ORDER BY published_at DESC NULLS FIRST, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn list_published(&self, limit: i64, offset: i64) -> DbResult<Vec<NewsPost>> {
        let posts = sqlx::query_as::<_, NewsPost>(
            r#"
            SELECT * FROM news_posts
            WHERE published_at IS NOT NULL AND published_at <= NOW()
            ORDER BY published_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn count_published(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM news_posts WHERE published_at IS NOT NULL AND published_at <= NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn get(&self, id: ResourceId) -> DbResult<NewsPost> {
        let post = sqlx::query_as::<_, NewsPost>("SELECT * FROM news_posts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("news {}", id)))?;
        Ok(post)
    }

    async fn get_by_slug(&self, slug: &str) -> DbResult<NewsPost> {
        let post = sqlx::query_as::<_, NewsPost>(
            r#"
            SELECT * FROM news_posts
            WHERE slug = $1 AND published_at IS NOT NULL AND published_at <= NOW()
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("news with slug {}", slug)))?;
        Ok(post)
    }

    async fn create(&self, input: &NewsInput) -> DbResult<NewsPost> {
        let post = sqlx::query_as::<_, NewsPost>(
            r#"
            INSERT INTO news_posts (id, slug, title, excerpt, body, published_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.excerpt)
        .bind(&input.body)
        .bind(input.published_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update(&self, id: ResourceId, input: &NewsInput) -> DbResult<NewsPost> {
        let post = sqlx::query_as::<_, NewsPost>(
            r#"
            UPDATE news_posts
            SET slug = $2, title = $3, excerpt = $4, body = $5, published_at = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.excerpt)
        .bind(&input.body)
        .bind(input.published_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("news {}", id)))?;
        Ok(post)
    }

    async fn delete_by_id(&self, id: ResourceId) -> DbResult<NewsPost> {
        let post =
            sqlx::query_as::<_, NewsPost>("DELETE FROM news_posts WHERE id = $1 RETURNING *")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("news {}", id)))?;
        Ok(post)
    }

    async fn list_images(&self, news_id: ResourceId) -> DbResult<Vec<NewsImage>> {
        let images = sqlx::query_as::<_, NewsImage>(
            "SELECT * FROM news_images WHERE news_id = $1 ORDER BY position, created_at",
        )
        .bind(news_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn first_images(&self, news_ids: &[ResourceId]) -> DbResult<Vec<NewsImage>> {
        if news_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<uuid::Uuid> = news_ids.iter().map(|id| *id.as_uuid()).collect();
        let images = sqlx::query_as::<_, NewsImage>(
            r#"
            SELECT DISTINCT ON (news_id) * FROM news_images
            WHERE news_id = ANY($1)
            ORDER BY news_id, position, created_at
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn add_images(
        &self,
        news_id: ResourceId,
        images: &[NewImage],
    ) -> DbResult<Vec<NewsImage>> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM news_posts WHERE id = $1)")
                .bind(news_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(DbError::NotFound(format!("news {}", news_id)));
        }

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM news_images WHERE news_id = $1",
        )
        .bind(news_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let mut inserted = Vec::with_capacity(images.len());
        for (offset, image) in images.iter().enumerate() {
            let row = sqlx::query_as::<_, NewsImage>(
                r#"
                INSERT INTO news_images (id, news_id, key, url, position, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                RETURNING *
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(news_id.as_uuid())
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

    async fn get_image(&self, news_id: ResourceId, image_id: ResourceId) -> DbResult<NewsImage> {
        let image = sqlx::query_as::<_, NewsImage>(
            "SELECT * FROM news_images WHERE id = $1 AND news_id = $2",
        )
        .bind(image_id.as_uuid())
        .bind(news_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("news image {}", image_id)))?;
        Ok(image)
    }

    async fn delete_image(
        &self,
        news_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<NewsImage> {
        let image = sqlx::query_as::<_, NewsImage>(
            "DELETE FROM news_images WHERE id = $1 AND news_id = $2 RETURNING *",
        )
        .bind(image_id.as_uuid())
        .bind(news_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("news image {}", image_id)))?;
        Ok(image)
    }

    async fn reorder_images(&self, news_id: ResourceId, ids: &[ResourceId]) -> DbResult<()> {
        apply_order(&self.pool, "news_images", Some(("news_id", news_id)), ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str) -> NewsInput {
        NewsInput {
            slug: slug.to_string(),
            title: slug.to_string(),
            excerpt: String::new(),
            body: String::new(),
            published_at: Some(Utc::now()),
        }
    }

    fn images(keys: &[&str]) -> Vec<NewImage> {
        keys.iter()
            .map(|key| NewImage {
                key: key.to_string(),
                url: format!("https://cdn.example.edu/{}", key),
            })
            .collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_first_images_follows_gallery_order(pool: PgPool) {
        let repo = PgNewsRepo::new(pool);
        let feira = ResourceId::from_uuid(repo.create(&post("feira")).await.unwrap().id);
        let festa = ResourceId::from_uuid(repo.create(&post("festa")).await.unwrap().id);
        let sem_fotos = ResourceId::from_uuid(repo.create(&post("sem-fotos")).await.unwrap().id);

        let added = repo
            .add_images(feira, &images(&["feira/a.png", "feira/b.png"]))
            .await
            .unwrap();
        repo.add_images(festa, &images(&["festa/a.png"]))
            .await
            .unwrap();
        repo.reorder_images(
            feira,
            &[
                ResourceId::from_uuid(added[1].id),
                ResourceId::from_uuid(added[0].id),
            ],
        )
        .await
        .unwrap();

        let mut keys: Vec<String> = repo
            .first_images(&[feira, festa, sem_fotos])
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["feira/b.png", "festa/a.png"]);

        assert!(repo.first_images(&[]).await.unwrap().is_empty());
    }
}
