//! Search index documents.

use serde::{Deserialize, Serialize};

/// One indexed page of the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub url: String,
    pub title: String,
    pub content: String,
}
