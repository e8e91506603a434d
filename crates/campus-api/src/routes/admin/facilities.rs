//! Facilities of a unit and their image galleries.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use campus_core::{MediaKind, ResourceId};
use campus_db::{Facility, FacilityImage, FacilityInput, NewImage};
use serde::Deserialize;
use uuid::Uuid;

use super::ReorderRequest;
use super::form::UploadForm;
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_facilities).post(create_facility))
        .route(
            "/{id}",
            get(get_facility)
                .put(update_facility)
                .delete(delete_facility),
        )
        .route("/{id}/images", get(list_images).post(upload_images))
        .route("/{id}/images/order", put(reorder_images))
        .route("/{id}/images/{image_id}", delete(delete_image))
}

#[derive(Debug, Deserialize)]
struct UnitQuery {
    unit_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct CreateFacilityRequest {
    unit_id: Uuid,
    #[serde(flatten)]
    facility: FacilityInput,
}

fn check(input: &FacilityInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    Ok(())
}

/// `GET /facilities?unit_id=...`
async fn list_facilities(
    State(state): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> Result<Json<Vec<Facility>>, ApiError> {
    Ok(Json(
        state
            .facility_repo
            .list_by_unit(ResourceId::from_uuid(query.unit_id))
            .await?,
    ))
}

async fn get_facility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Facility>, ApiError> {
    Ok(Json(
        state.facility_repo.get(ResourceId::from_uuid(id)).await?,
    ))
}

async fn create_facility(
    State(state): State<AppState>,
    Json(req): Json<CreateFacilityRequest>,
) -> Result<(StatusCode, Json<Facility>), ApiError> {
    check(&req.facility)?;
    let facility = state
        .facility_repo
        .create(ResourceId::from_uuid(req.unit_id), &req.facility)
        .await?;
    tracing::info!(facility_id = %facility.id, unit_id = %facility.unit_id, "Created facility");
    Ok((StatusCode::CREATED, Json(facility)))
}

async fn update_facility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<FacilityInput>,
) -> Result<Json<Facility>, ApiError> {
    check(&input)?;
    let facility = state
        .facility_repo
        .update(ResourceId::from_uuid(id), &input)
        .await?;
    Ok(Json(facility))
}

async fn delete_facility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceId::from_uuid(id);
    let keys: Vec<String> = state
        .facility_repo
        .list_images(id)
        .await?
        .into_iter()
        .map(|image| image.key)
        .collect();

    state.facility_repo.delete_by_id(id).await?;
    let failed = state.media.discard(&keys).await;
    tracing::info!(facility_id = %id, images = keys.len(), failed, "Deleted facility");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FacilityImage>>, ApiError> {
    Ok(Json(
        state
            .facility_repo
            .list_images(ResourceId::from_uuid(id))
            .await?,
    ))
}

/// Multipart with one or more `images` files, stored as one batch.
async fn upload_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<FacilityImage>>), ApiError> {
    let id = ResourceId::from_uuid(id);
    let mut form = UploadForm::read(multipart).await?;
    let files = form.files("images");

    state.facility_repo.get(id).await?;
    let repo = state.facility_repo.clone();
    let images = state
        .media
        .upload_and_commit(MediaKind::Facility, id, files, |stored| async move {
            let rows: Vec<NewImage> = stored
                .into_iter()
                .map(|s| NewImage {
                    key: s.key,
                    url: s.url,
                })
                .collect();
            repo.add_images(id, &rows).await.map_err(ApiError::from)
        })
        .await?;

    tracing::info!(facility_id = %id, count = images.len(), "Added facility images");
    Ok((StatusCode::CREATED, Json(images)))
}

async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let image = state
        .facility_repo
        .delete_image(ResourceId::from_uuid(id), ResourceId::from_uuid(image_id))
        .await?;
    state.media.discard(&[image.key]).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .facility_repo
        .reorder_images(ResourceId::from_uuid(id), &req.ids()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
