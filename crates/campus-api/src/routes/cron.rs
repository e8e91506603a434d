//! Scheduled jobs triggered over HTTP.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use campus_crawler::{CrawlSummary, Crawler, IndexOutcome, rebuild_index};
use serde::Serialize;

use crate::AppState;
use crate::auth::authorize;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/update-search", get(update_search))
}

#[derive(Debug, Serialize)]
struct UpdateSearchResponse {
    /// False when the crawl found nothing and the old index was kept.
    replaced: bool,
    entries: u64,
    crawl: CrawlSummary,
}

/// Crawl the public site and swap the search index.
async fn update_search(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UpdateSearchResponse>, ApiError> {
    authorize(state.config.cron_secret.as_deref(), &headers)?;

    let Ok(_guard) = state.crawl_lock.try_lock() else {
        return Err(ApiError::Conflict("a crawl is already running".to_string()));
    };

    let crawler = Crawler::new(state.config.crawler.clone())?;
    let report = crawler.crawl().await;
    let outcome = rebuild_index(state.search_repo.as_ref(), &report).await?;

    let (replaced, entries) = match outcome {
        IndexOutcome::Replaced(count) => (true, count),
        IndexOutcome::Skipped => (false, 0),
    };
    Ok(Json(UpdateSearchResponse {
        replaced,
        entries,
        crawl: report.summary(),
    }))
}
