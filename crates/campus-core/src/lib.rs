//! Core domain types for the Campus school site.
//!
//! This crate contains:
//! - Resource identifiers and the shared error type
//! - Media object keys, CDN URLs and upload validation
//! - Slug generation for public URLs
//! - The infinite-loop carousel state machine
//! - The search document produced by the crawler

pub mod carousel;
pub mod error;
pub mod id;
pub mod media;
pub mod search;
pub mod slug;

pub use carousel::{Carousel, Settle};
pub use error::{Error, Result};
pub use id::ResourceId;
pub use media::MediaKind;
pub use search::SearchDocument;
pub use slug::slugify;
