//! PostgreSQL storage for the site content and the search index.
//!
//! Each table group (banners, curricula, news, units with their facilities,
//! enrollment, search) has a repository trait and a `Pg*Repo` implementation,
//! so handlers can be tested against in-memory stubs.

pub mod error;
pub mod repo;

pub use error::{DbError, DbResult};
pub use repo::*;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply pending migrations and return how many the schema now has.
pub async fn run_migrations(pool: &PgPool) -> DbResult<usize> {
    MIGRATOR.run(pool).await?;
    let total = MIGRATOR.iter().count();
    tracing::info!(migrations = total, "Database schema up to date");
    Ok(total)
}

/// Round trip used by the readiness check.
pub async fn ping(pool: &PgPool) -> DbResult<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
