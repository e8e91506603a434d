//! Search index repository.

use async_trait::async_trait;
use campus_core::SearchDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::DbResult;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchEntry {
    pub id: uuid::Uuid,
    pub url: String,
    pub title: String,
    pub content: String,
    pub indexed_at: DateTime<Utc>,
}

#[async_trait]
pub trait SearchRepo: Send + Sync {
    /// Swap the whole index for `docs` in one transaction.
    async fn replace_all(&self, docs: &[SearchDocument]) -> DbResult<u64>;
    /// Case-insensitive substring search, title matches first.
    async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<SearchEntry>>;
    async fn count(&self) -> DbResult<i64>;
}

pub struct PgSearchRepo {
    pool: PgPool,
}

impl PgSearchRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl SearchRepo for PgSearchRepo {
    async fn replace_all(&self, docs: &[SearchDocument]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM search_entries")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut inserted = 0u64;
        for doc in docs {
            inserted += sqlx::query(
                r#"
                INSERT INTO search_entries (id, url, title, content, indexed_at)
                VALUES ($1, $2, $3, $4, NOW())
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(&doc.url)
            .bind(&doc.title)
            .bind(&doc.content)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        info!(removed, inserted, "Search index replaced");
        Ok(inserted)
    }

    async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<SearchEntry>> {
        let pattern = like_pattern(query.trim());
        let entries = sqlx::query_as::<_, SearchEntry>(
            r#"
            SELECT * FROM search_entries
            WHERE title ILIKE $1 OR content ILIKE $1
            ORDER BY (title ILIKE $1) DESC, title
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
