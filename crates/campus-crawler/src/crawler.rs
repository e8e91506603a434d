//! Breadth-first crawl with per-page and total time budgets.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use campus_config::CrawlerSettings;
use campus_core::SearchDocument;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::{extract_links, page_document};
use crate::links::{normalize, should_follow};
use crate::{CrawlError, CrawlResult};

/// Everything a crawl produced.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub documents: Vec<SearchDocument>,
    /// Pages fetched, successfully or not.
    pub visited: usize,
    pub failed: usize,
    /// Pages fetched but judged not worth indexing.
    pub skipped_garbage: usize,
    pub elapsed: Duration,
    pub budget_exhausted: bool,
}

/// Serializable overview of a crawl, without the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub indexed: usize,
    pub visited: usize,
    pub failed: usize,
    pub skipped_garbage: usize,
    pub elapsed_ms: u128,
    pub budget_exhausted: bool,
}

impl CrawlReport {
    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            indexed: self.documents.len(),
            visited: self.visited,
            failed: self.failed,
            skipped_garbage: self.skipped_garbage,
            elapsed_ms: self.elapsed.as_millis(),
            budget_exhausted: self.budget_exhausted,
        }
    }
}

#[derive(Debug)]
enum PageError {
    Timeout,
    Status(u16),
    NotHtml(String),
    OffSite(Url),
    Request(reqwest::Error),
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::Timeout => write!(f, "timed out"),
            PageError::Status(code) => write!(f, "status {}", code),
            PageError::NotHtml(ct) => write!(f, "content type {}", ct),
            PageError::OffSite(url) => write!(f, "redirected off site to {}", url),
            PageError::Request(e) => write!(f, "{}", e),
        }
    }
}

struct FetchedPage {
    url: Url,
    body: String,
}

/// Site crawler. Holds no state between runs.
pub struct Crawler {
    client: reqwest::Client,
    settings: CrawlerSettings,
    start: Url,
}

impl Crawler {
    pub fn new(settings: CrawlerSettings) -> CrawlResult<Self> {
        let start = Url::parse(&settings.start_url)
            .map_err(|e| CrawlError::InvalidStartUrl(format!("{}: {}", settings.start_url, e)))?;
        if !matches!(start.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidStartUrl(settings.start_url.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            start: normalize(&start),
            settings,
        })
    }

    pub fn start_url(&self) -> &Url {
        &self.start
    }

    /// Crawl the site once.
    ///
    /// Individual page failures never abort the crawl; the run only stops
    /// early when the page limit or the total budget is reached.
    pub async fn crawl(&self) -> CrawlReport {
        let started = Instant::now();
        let deadline = started + self.settings.total_budget;

        let mut report = CrawlReport::default();
        let mut frontier = VecDeque::from([self.start.clone()]);
        let mut seen: HashSet<String> = HashSet::from([self.start.to_string()]);
        let mut indexed: HashSet<String> = HashSet::new();

        info!(start = %self.start, max_pages = self.settings.max_pages, "Starting crawl");

        while let Some(url) = frontier.pop_front() {
            if report.visited >= self.settings.max_pages {
                debug!(remaining = frontier.len() + 1, "Page limit reached");
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                report.budget_exhausted = true;
                warn!(remaining = frontier.len() + 1, "Crawl budget exhausted");
                break;
            }
            let timeout = self.settings.page_timeout.min(deadline - now);

            report.visited += 1;
            let page = match self.fetch(&url, timeout).await {
                Ok(page) => page,
                Err(e) => {
                    report.failed += 1;
                    debug!(url = %url, error = %e, "Skipping page");
                    continue;
                }
            };

            let final_url = normalize(&page.url);
            seen.insert(final_url.to_string());

            for link in extract_links(&page.url, &page.body) {
                let link = normalize(&link);
                if should_follow(&link, &self.start, &self.settings.exclude)
                    && seen.insert(link.to_string())
                {
                    frontier.push_back(link);
                }
            }

            if !indexed.insert(final_url.to_string()) {
                continue;
            }
            match page_document(&final_url, &page.body, self.settings.min_content_chars) {
                Some(doc) => report.documents.push(doc),
                None => {
                    report.skipped_garbage += 1;
                    debug!(url = %final_url, "Page not indexed");
                }
            }
        }

        // A fetch cut short by the deadline also counts.
        if Instant::now() >= deadline {
            report.budget_exhausted = true;
        }
        report.elapsed = started.elapsed();
        info!(
            indexed = report.documents.len(),
            visited = report.visited,
            failed = report.failed,
            skipped = report.skipped_garbage,
            elapsed_ms = report.elapsed.as_millis() as u64,
            budget_exhausted = report.budget_exhausted,
            "Crawl finished"
        );
        report
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, PageError> {
        let request = async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(PageError::Request)?;

            let status = response.status();
            if !status.is_success() {
                return Err(PageError::Status(status.as_u16()));
            }

            let final_url = response.url().clone();
            if !should_follow(&final_url, &self.start, &self.settings.exclude) {
                return Err(PageError::OffSite(final_url));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();
            if !content_type.starts_with("text/html")
                && !content_type.starts_with("application/xhtml")
            {
                return Err(PageError::NotHtml(content_type));
            }

            let body = response.text().await.map_err(PageError::Request)?;
            Ok(FetchedPage {
                url: final_url,
                body,
            })
        };

        tokio::time::timeout(timeout, request)
            .await
            .unwrap_or(Err(PageError::Timeout))
    }
}
