//! Breadth-first crawler for the public site.
//!
//! A crawl starts at the configured root, follows same-site links inside a
//! per-page timeout and a total time budget, and turns every page that looks
//! like real content into a [`SearchDocument`](campus_core::SearchDocument).
//! Nothing is kept between runs.

pub mod crawler;
pub mod error;
pub mod extract;
pub mod index;
pub mod links;

pub use crawler::{CrawlReport, CrawlSummary, Crawler};
pub use error::{CrawlError, CrawlResult};
pub use index::{IndexOutcome, rebuild_index};
