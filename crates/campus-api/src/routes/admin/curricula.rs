//! Curriculum page management.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use campus_core::{MediaKind, ResourceId};
use campus_db::{Curriculum, CurriculumInput};
use uuid::Uuid;

use super::form::UploadForm;
use super::{ReorderRequest, resolve_slug};
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_curricula).post(create_curriculum))
        .route("/order", put(reorder_curricula))
        .route(
            "/{id}",
            get(get_curriculum)
                .put(update_curriculum)
                .delete(delete_curriculum),
        )
        .route("/{id}/cover", put(replace_cover))
}

fn normalize(mut input: CurriculumInput) -> Result<CurriculumInput, ApiError> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    input.slug = resolve_slug(&input.slug, &input.title)?;
    Ok(input)
}

async fn list_curricula(State(state): State<AppState>) -> Result<Json<Vec<Curriculum>>, ApiError> {
    Ok(Json(state.curriculum_repo.list().await?))
}

async fn get_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Curriculum>, ApiError> {
    Ok(Json(
        state.curriculum_repo.get(ResourceId::from_uuid(id)).await?,
    ))
}

async fn create_curriculum(
    State(state): State<AppState>,
    Json(input): Json<CurriculumInput>,
) -> Result<(StatusCode, Json<Curriculum>), ApiError> {
    let input = normalize(input)?;
    let curriculum = state.curriculum_repo.create(&input).await?;
    tracing::info!(curriculum_id = %curriculum.id, slug = %curriculum.slug, "Created curriculum");
    Ok((StatusCode::CREATED, Json(curriculum)))
}

async fn update_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CurriculumInput>,
) -> Result<Json<Curriculum>, ApiError> {
    let input = normalize(input)?;
    let curriculum = state
        .curriculum_repo
        .update(ResourceId::from_uuid(id), &input)
        .await?;
    Ok(Json(curriculum))
}

/// Multipart with one `cover` file.
async fn replace_cover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Curriculum>, ApiError> {
    let id = ResourceId::from_uuid(id);
    let mut form = UploadForm::read(multipart).await?;
    let cover = form.single_file("cover")?;

    let current = state.curriculum_repo.get(id).await?;
    let repo = state.curriculum_repo.clone();
    let curriculum = state
        .media
        .replace_and_commit(
            MediaKind::Curriculum,
            id,
            cover,
            current.cover_key,
            |stored| async move {
                repo.set_cover(id, &stored.key, &stored.url)
                    .await
                    .map_err(ApiError::from)
            },
        )
        .await?;
    Ok(Json(curriculum))
}

async fn delete_curriculum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let curriculum = state
        .curriculum_repo
        .delete_by_id(ResourceId::from_uuid(id))
        .await?;
    if let Some(key) = curriculum.cover_key {
        state.media.discard(&[key]).await;
    }
    tracing::info!(curriculum_id = %curriculum.id, "Deleted curriculum");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_curricula(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    state.curriculum_repo.reorder(&req.ids()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::Method;
    use bytes::Bytes;
    use campus_db::{CurriculumRepo, DbError, DbResult};
    use campus_storage::{MemoryStore, ObjectStore};
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::routes::test_support::{admin_multipart, body_json, multipart, state};

    use super::*;

    /// A single curriculum page kept in memory.
    struct StubCurriculumRepo {
        page: Mutex<Curriculum>,
    }

    impl StubCurriculumRepo {
        fn new(cover_key: Option<&str>) -> Self {
            Self {
                page: Mutex::new(Curriculum {
                    id: Uuid::now_v7(),
                    slug: "ensino-medio".to_string(),
                    title: "Ensino Médio".to_string(),
                    summary: String::new(),
                    body: String::new(),
                    cover_key: cover_key.map(str::to_string),
                    cover_url: cover_key.map(|k| format!("https://cdn.example.edu/{}", k)),
                    position: 0,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }),
            }
        }

        fn id(&self) -> Uuid {
            self.page.lock().unwrap().id
        }

        fn check(&self, id: ResourceId) -> DbResult<Curriculum> {
            let page = self.page.lock().unwrap().clone();
            if page.id == *id.as_uuid() {
                Ok(page)
            } else {
                Err(DbError::NotFound(format!("curriculum {}", id)))
            }
        }
    }

    #[async_trait]
    impl CurriculumRepo for StubCurriculumRepo {
        async fn list(&self) -> DbResult<Vec<Curriculum>> {
            Ok(vec![self.page.lock().unwrap().clone()])
        }
        async fn get(&self, id: ResourceId) -> DbResult<Curriculum> {
            self.check(id)
        }
        async fn get_by_slug(&self, slug: &str) -> DbResult<Curriculum> {
            Err(DbError::NotFound(slug.to_string()))
        }
        async fn create(&self, _input: &CurriculumInput) -> DbResult<Curriculum> {
            Ok(self.page.lock().unwrap().clone())
        }
        async fn update(&self, id: ResourceId, _input: &CurriculumInput) -> DbResult<Curriculum> {
            self.check(id)
        }
        async fn set_cover(&self, id: ResourceId, key: &str, url: &str) -> DbResult<Curriculum> {
            self.check(id)?;
            let mut page = self.page.lock().unwrap();
            page.cover_key = Some(key.to_string());
            page.cover_url = Some(url.to_string());
            Ok(page.clone())
        }
        async fn delete_by_id(&self, id: ResourceId) -> DbResult<Curriculum> {
            self.check(id)
        }
        async fn reorder(&self, _ids: &[ResourceId]) -> DbResult<()> {
            Ok(())
        }
    }

    async fn put_cover(app_state: AppState, id: Uuid) -> axum::response::Response {
        router(app_state)
            .oneshot(admin_multipart(
                Method::PUT,
                &format!("/admin/api/curricula/{}/cover", id),
                multipart(&[], &[("cover", "capa.png")]),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_cover_is_stored() {
        let store = Arc::new(MemoryStore::new());
        let repo = Arc::new(StubCurriculumRepo::new(None));
        let mut app_state = state(store.clone());
        app_state.curriculum_repo = repo.clone();

        let response = put_cover(app_state, repo.id()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let key = body["cover_key"].as_str().unwrap().to_string();
        assert!(key.starts_with(&format!("curriculum/{}/", repo.id())));
        assert_eq!(store.keys().await, vec![key]);
    }

    #[tokio::test]
    async fn test_replacing_cover_discards_old_object() {
        let store = Arc::new(MemoryStore::new());
        let old_key = "curriculum/old/capa.png";
        store
            .put(old_key, Bytes::from_static(b"old"), "image/png")
            .await
            .unwrap();
        let repo = Arc::new(StubCurriculumRepo::new(Some(old_key)));
        let mut app_state = state(store.clone());
        app_state.curriculum_repo = repo.clone();

        let response = put_cover(app_state, repo.id()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let keys = store.keys().await;
        assert_eq!(keys.len(), 1);
        assert_ne!(keys[0], old_key);
        assert_eq!(repo.page.lock().unwrap().cover_key.as_deref(), Some(keys[0].as_str()));
    }

    #[tokio::test]
    async fn test_cover_for_unknown_page_uploads_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut app_state = state(store.clone());
        app_state.curriculum_repo = Arc::new(StubCurriculumRepo::new(None));

        let response = put_cover(app_state, Uuid::now_v7()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_normalize_derives_slug() {
        let input = CurriculumInput {
            slug: String::new(),
            title: "  Educação Infantil ".to_string(),
            summary: String::new(),
            body: String::new(),
        };
        let input = normalize(input).unwrap();
        assert_eq!(input.title, "Educação Infantil");
        assert_eq!(input.slug, "educacao-infantil");
    }

    #[test]
    fn test_normalize_rejects_blank_title() {
        let input = CurriculumInput {
            slug: "x".to_string(),
            title: " ".to_string(),
            summary: String::new(),
            body: String::new(),
        };
        assert!(matches!(normalize(input), Err(ApiError::BadRequest(_))));
    }
}
