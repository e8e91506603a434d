//! Admin JSON API.
//!
//! Every route requires the configured admin bearer token. Media-bearing
//! writes upload first and remove the uploaded objects again when the
//! database write fails; deletes remove the row first and the objects after.

pub mod banners;
pub mod curricula;
pub mod enrollment;
pub mod facilities;
pub mod form;
pub mod news;
#[cfg(test)]
pub(crate) mod stubs;
pub mod units;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use campus_core::{ResourceId, slugify};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::auth::require_admin;
use crate::error::ApiError;
use form::MAX_FILES_PER_REQUEST;

// Room for the non-file fields of a multipart body.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state
        .media
        .max_bytes()
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .nest("/banners", banners::router())
        .nest("/curricula", curricula::router())
        .nest("/news", news::router())
        .nest("/units", units::router())
        .nest("/facilities", facilities::router())
        .nest("/enrollment", enrollment::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state, require_admin))
}

/// Body of every `PUT .../order` route.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

impl ReorderRequest {
    pub fn ids(&self) -> Result<Vec<ResourceId>, ApiError> {
        if self.ids.is_empty() {
            return Err(ApiError::BadRequest("ids must not be empty".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        if !self.ids.iter().all(|id| seen.insert(id)) {
            return Err(ApiError::BadRequest("ids must be unique".to_string()));
        }
        Ok(self.ids.iter().copied().map(ResourceId::from_uuid).collect())
    }
}

/// Normalize a submitted slug, deriving it from `fallback` when blank.
pub fn resolve_slug(slug: &str, fallback: &str) -> Result<String, ApiError> {
    let source = if slug.trim().is_empty() { fallback } else { slug };
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(ApiError::BadRequest(
            "a slug needs at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}
