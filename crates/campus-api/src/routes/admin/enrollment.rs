//! Enrollment information.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use campus_db::{Enrollment, EnrollmentInput};

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_enrollment).put(update_enrollment))
}

async fn get_enrollment(State(state): State<AppState>) -> Result<Json<Enrollment>, ApiError> {
    Ok(Json(state.enrollment_repo.get().await?))
}

async fn update_enrollment(
    State(state): State<AppState>,
    Json(mut input): Json<EnrollmentInput>,
) -> Result<Json<Enrollment>, ApiError> {
    input.headline = input.headline.trim().to_string();
    if input.headline.is_empty() {
        return Err(ApiError::BadRequest("headline must not be empty".to_string()));
    }
    input.contact_email = input
        .contact_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let enrollment = state.enrollment_repo.update(&input).await?;
    tracing::info!(is_open = enrollment.is_open, "Updated enrollment");
    Ok(Json(enrollment))
}
