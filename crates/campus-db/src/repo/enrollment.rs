//! Enrollment information repository (a single row).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::DbResult;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub headline: String,
    pub body: String,
    pub contact_email: Option<String>,
    pub is_open: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for Enrollment {
    fn default() -> Self {
        Self {
            headline: "Matrículas".to_string(),
            body: String::new(),
            contact_email: None,
            is_open: false,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentInput {
    pub headline: String,
    #[serde(default)]
    pub body: String,
    pub contact_email: Option<String>,
    #[serde(default)]
    pub is_open: bool,
}

#[async_trait]
pub trait EnrollmentRepo: Send + Sync {
    /// Current enrollment info, or the defaults when it was never saved.
    async fn get(&self) -> DbResult<Enrollment>;
    async fn update(&self, input: &EnrollmentInput) -> DbResult<Enrollment>;
}

pub struct PgEnrollmentRepo {
    pool: PgPool,
}

impl PgEnrollmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepo for PgEnrollmentRepo {
    async fn get(&self) -> DbResult<Enrollment> {
        let row = sqlx::query_as::<_, Enrollment>(
            "SELECT headline, body, contact_email, is_open, updated_at FROM enrollment WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.unwrap_or_default())
    }

    async fn update(&self, input: &EnrollmentInput) -> DbResult<Enrollment> {
        let row = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollment (id, headline, body, contact_email, is_open, updated_at)
            VALUES (1, $1, $2, $3, $4, NOW())
            ON CONFLICT (id) DO UPDATE
            SET headline = EXCLUDED.headline,
                body = EXCLUDED.body,
                contact_email = EXCLUDED.contact_email,
                is_open = EXCLUDED.is_open,
                updated_at = NOW()
            RETURNING headline, body, contact_email, is_open, updated_at
            "#,
        )
        .bind(&input.headline)
        .bind(&input.body)
        .bind(&input.contact_email)
        .bind(input.is_open)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
