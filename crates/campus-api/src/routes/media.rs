//! Media objects served straight from the configured store.
//!
//! Deployments behind a CDN point `storage cdn-url` at the CDN and never hit
//! this route. Local setups keep the default `http://localhost:3000/media`,
//! which resolves here for either backend.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/media/{*key}", get(serve_object))
}

async fn serve_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let object = state
        .media
        .store()
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("media {}", key)))?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        object.data,
    )
        .into_response())
}
