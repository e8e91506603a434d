//! Repository traits and implementations.

pub mod banner;
pub mod curriculum;
pub mod enrollment;
pub mod facility;
pub mod news;
pub mod search;
pub mod unit;

pub use banner::{BannerRepo, BannerUpdate, HeroBanner, NewBanner, PgBannerRepo};
pub use curriculum::{Curriculum, CurriculumInput, CurriculumRepo, PgCurriculumRepo};
pub use enrollment::{Enrollment, EnrollmentInput, EnrollmentRepo, PgEnrollmentRepo};
pub use facility::{Facility, FacilityImage, FacilityInput, FacilityRepo, PgFacilityRepo};
pub use news::{NewsImage, NewsInput, NewsPost, NewsRepo, PgNewsRepo};
pub use search::{PgSearchRepo, SearchEntry, SearchRepo};
pub use unit::{PgUnitRepo, Unit, UnitInput, UnitRepo};

use std::collections::HashSet;

use campus_core::ResourceId;
use sqlx::PgPool;

use crate::{DbError, DbResult};

/// An uploaded object to attach to a parent record.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub key: String,
    pub url: String,
}

/// Rewrite `position` so it follows the order of `ids`.
///
/// `ids` must name every row in scope (the whole table, or the children of
/// one parent) exactly once. A partial list would leave two rows sharing a
/// position.
pub(crate) async fn apply_order(
    pool: &PgPool,
    table: &'static str,
    scope: Option<(&'static str, ResourceId)>,
    ids: &[ResourceId],
) -> DbResult<()> {
    let distinct: HashSet<&ResourceId> = ids.iter().collect();
    if distinct.len() != ids.len() {
        return Err(DbError::IncompleteOrder {
            expected: distinct.len() as i64,
            given: ids.len(),
        });
    }

    let count_sql = match scope {
        Some((column, _)) => format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, column),
        None => format!("SELECT COUNT(*) FROM {}", table),
    };
    let sql = match scope {
        Some((column, _)) => format!(
            "UPDATE {} SET position = $1 WHERE id = $2 AND {} = $3",
            table, column
        ),
        None => format!("UPDATE {} SET position = $1 WHERE id = $2", table),
    };

    let mut tx = pool.begin().await?;
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some((_, parent)) = scope {
        count = count.bind(*parent.as_uuid());
    }
    let expected = count.fetch_one(&mut *tx).await?;
    for (position, id) in ids.iter().enumerate() {
        let mut query = sqlx::query(&sql).bind(position as i32).bind(id.as_uuid());
        if let Some((_, parent)) = scope {
            query = query.bind(*parent.as_uuid());
        }
        let result = query.execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("{} row {}", table, id)));
        }
    }
    // Checked after the updates so a foreign id reports NotFound first.
    if expected != ids.len() as i64 {
        return Err(DbError::IncompleteOrder {
            expected,
            given: ids.len(),
        });
    }
    tx.commit().await?;
    Ok(())
}
