//! News post and gallery management.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use campus_core::{MediaKind, ResourceId};
use campus_db::{NewImage, NewsImage, NewsInput, NewsPost};
use uuid::Uuid;

use super::form::UploadForm;
use super::{ReorderRequest, resolve_slug};
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route(
            "/{id}",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/{id}/images", get(list_images).post(upload_images))
        .route("/{id}/images/order", put(reorder_images))
        .route("/{id}/images/{image_id}", delete(delete_image))
}

fn normalize(mut input: NewsInput) -> Result<NewsInput, ApiError> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    input.slug = resolve_slug(&input.slug, &input.title)?;
    Ok(input)
}

async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<NewsPost>>, ApiError> {
    Ok(Json(state.news_repo.list().await?))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NewsPost>, ApiError> {
    Ok(Json(state.news_repo.get(ResourceId::from_uuid(id)).await?))
}

async fn create_news(
    State(state): State<AppState>,
    Json(input): Json<NewsInput>,
) -> Result<(StatusCode, Json<NewsPost>), ApiError> {
    let input = normalize(input)?;
    let post = state.news_repo.create(&input).await?;
    tracing::info!(news_id = %post.id, slug = %post.slug, "Created news post");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewsInput>,
) -> Result<Json<NewsPost>, ApiError> {
    let input = normalize(input)?;
    let post = state
        .news_repo
        .update(ResourceId::from_uuid(id), &input)
        .await?;
    Ok(Json(post))
}

async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceId::from_uuid(id);
    // Image rows go with the post, so collect their keys first.
    let keys: Vec<String> = state
        .news_repo
        .list_images(id)
        .await?
        .into_iter()
        .map(|image| image.key)
        .collect();

    state.news_repo.delete_by_id(id).await?;
    let failed = state.media.discard(&keys).await;
    tracing::info!(news_id = %id, images = keys.len(), failed, "Deleted news post");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NewsImage>>, ApiError> {
    Ok(Json(
        state.news_repo.list_images(ResourceId::from_uuid(id)).await?,
    ))
}

/// Multipart with one or more `images` files, stored as one batch.
async fn upload_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<NewsImage>>), ApiError> {
    let id = ResourceId::from_uuid(id);
    let mut form = UploadForm::read(multipart).await?;
    let files = form.files("images");

    state.news_repo.get(id).await?;
    let repo = state.news_repo.clone();
    let images = state
        .media
        .upload_and_commit(MediaKind::News, id, files, |stored| async move {
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

    tracing::info!(news_id = %id, count = images.len(), "Added news images");
    Ok((StatusCode::CREATED, Json(images)))
}

async fn delete_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let image = state
        .news_repo
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
        .news_repo
        .reorder_images(ResourceId::from_uuid(id), &req.ids()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
