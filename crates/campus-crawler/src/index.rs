//! Swapping a crawl result into the search index.

use campus_db::SearchRepo;
use tracing::{info, warn};

use crate::{CrawlReport, CrawlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The index now holds this many entries.
    Replaced(u64),
    /// The crawl found nothing, the previous index was kept.
    Skipped,
}

/// Replace the search index with the documents of `report`.
///
/// An empty crawl usually means the site was unreachable, so it never wipes
/// an existing index.
pub async fn rebuild_index(repo: &dyn SearchRepo, report: &CrawlReport) -> CrawlResult<IndexOutcome> {
    if report.documents.is_empty() {
        warn!(
            visited = report.visited,
            failed = report.failed,
            "Crawl produced no documents, keeping current index"
        );
        return Ok(IndexOutcome::Skipped);
    }

    let inserted = repo.replace_all(&report.documents).await?;
    info!(inserted, "Search index rebuilt");
    Ok(IndexOutcome::Replaced(inserted))
}
