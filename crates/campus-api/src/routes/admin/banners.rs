//! Hero banner management.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use campus_core::{MediaKind, ResourceId};
use campus_db::{BannerUpdate, HeroBanner, NewBanner};
use uuid::Uuid;

use super::ReorderRequest;
use super::form::UploadForm;
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_banners).post(create_banner))
        .route("/order", put(reorder_banners))
        .route("/{id}", put(update_banner).delete(delete_banner))
        .route("/{id}/image", put(replace_image))
}

async fn list_banners(State(state): State<AppState>) -> Result<Json<Vec<HeroBanner>>, ApiError> {
    Ok(Json(state.banner_repo.list().await?))
}

/// Multipart: `title`, optional `subtitle` / `link_url` / `active`, and one `image`.
async fn create_banner(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<HeroBanner>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let title = form.required("title")?;
    let subtitle = form.text("subtitle");
    let link_url = form.text("link_url");
    let active = form.text("active").is_none() || form.flag("active");
    let image = form.single_file("image")?;

    let id = ResourceId::new();
    let repo = state.banner_repo.clone();
    let banner = state
        .media
        .replace_and_commit(MediaKind::Banner, id, image, None, |stored| async move {
            let banner = NewBanner {
                title,
                subtitle,
                link_url,
                image_key: stored.key,
                image_url: stored.url,
                active,
            };
            repo.create(id, &banner).await.map_err(ApiError::from)
        })
        .await?;

    tracing::info!(banner_id = %banner.id, "Created banner");
    Ok((StatusCode::CREATED, Json(banner)))
}

async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<BannerUpdate>,
) -> Result<Json<HeroBanner>, ApiError> {
    if update.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let banner = state
        .banner_repo
        .update(ResourceId::from_uuid(id), &update)
        .await?;
    Ok(Json(banner))
}

async fn replace_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<HeroBanner>, ApiError> {
    let id = ResourceId::from_uuid(id);
    let mut form = UploadForm::read(multipart).await?;
    let image = form.single_file("image")?;

    let current = state.banner_repo.get(id).await?;
    let repo = state.banner_repo.clone();
    let banner = state
        .media
        .replace_and_commit(
            MediaKind::Banner,
            id,
            image,
            Some(current.image_key),
            |stored| async move {
                repo.set_image(id, &stored.key, &stored.url)
                    .await
                    .map_err(ApiError::from)
            },
        )
        .await?;
    Ok(Json(banner))
}

async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let banner = state
        .banner_repo
        .delete_by_id(ResourceId::from_uuid(id))
        .await?;
    state.media.discard(&[banner.image_key]).await;
    tracing::info!(banner_id = %banner.id, "Deleted banner");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_banners(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    state.banner_repo.reorder(&req.ids()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::Method;
    use bytes::Bytes;
    use campus_db::{BannerRepo, DbError, DbResult};
    use campus_storage::{MemoryStore, ObjectStore};
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::routes::test_support::{admin_multipart, body_json, multipart, state};

    use super::*;

    #[derive(Default)]
    struct StubBannerRepo {
        banners: Mutex<Vec<HeroBanner>>,
        fail_writes: bool,
    }

    impl StubBannerRepo {
        fn find(&self, id: ResourceId) -> DbResult<HeroBanner> {
            self.banners
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == *id.as_uuid())
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))
        }

        fn refuse(&self) -> DbResult<()> {
            if self.fail_writes {
                Err(DbError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl BannerRepo for StubBannerRepo {
        async fn list(&self) -> DbResult<Vec<HeroBanner>> {
            Ok(self.banners.lock().unwrap().clone())
        }
        async fn list_active(&self) -> DbResult<Vec<HeroBanner>> {
            self.list().await
        }
        async fn get(&self, id: ResourceId) -> DbResult<HeroBanner> {
            self.find(id)
        }
        async fn create(&self, id: ResourceId, banner: &NewBanner) -> DbResult<HeroBanner> {
            self.refuse()?;
            let row = HeroBanner {
                id: *id.as_uuid(),
                title: banner.title.clone(),
                subtitle: banner.subtitle.clone(),
                link_url: banner.link_url.clone(),
                image_key: banner.image_key.clone(),
                image_url: banner.image_url.clone(),
                position: self.banners.lock().unwrap().len() as i32,
                active: banner.active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.banners.lock().unwrap().push(row.clone());
            Ok(row)
        }
        async fn update(&self, id: ResourceId, _update: &BannerUpdate) -> DbResult<HeroBanner> {
            self.find(id)
        }
        async fn set_image(&self, id: ResourceId, key: &str, url: &str) -> DbResult<HeroBanner> {
            self.refuse()?;
            let mut banners = self.banners.lock().unwrap();
            let banner = banners
                .iter_mut()
                .find(|b| b.id == *id.as_uuid())
                .ok_or_else(|| DbError::NotFound(format!("banner {}", id)))?;
            banner.image_key = key.to_string();
            banner.image_url = url.to_string();
            Ok(banner.clone())
        }
        async fn delete_by_id(&self, id: ResourceId) -> DbResult<HeroBanner> {
            let banner = self.find(id)?;
            self.banners.lock().unwrap().retain(|b| b.id != banner.id);
            Ok(banner)
        }
        async fn reorder(&self, _ids: &[ResourceId]) -> DbResult<()> {
            Ok(())
        }
    }

    /// A banner whose current image already sits in `store`.
    async fn seeded(store: &MemoryStore, fail_writes: bool) -> (Arc<StubBannerRepo>, Uuid, String) {
        let id = Uuid::now_v7();
        let old_key = format!("banners/{}/old.png", id);
        store
            .put(&old_key, Bytes::from_static(b"old"), "image/png")
            .await
            .unwrap();
        let repo = StubBannerRepo {
            fail_writes,
            ..Default::default()
        };
        repo.banners.lock().unwrap().push(HeroBanner {
            id,
            title: "Matrículas abertas".to_string(),
            subtitle: None,
            link_url: None,
            image_key: old_key.clone(),
            image_url: format!("https://cdn.example.edu/{}", old_key),
            position: 0,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        (Arc::new(repo), id, old_key)
    }

    #[tokio::test]
    async fn test_create_banner_stores_image_and_row() {
        let store = Arc::new(MemoryStore::new());
        let repo = Arc::new(StubBannerRepo::default());
        let mut app_state = state(store.clone());
        app_state.banner_repo = repo.clone();

        let body = multipart(&[("title", "Feira de Ciências")], &[("image", "feira.png")]);
        let response = router(app_state)
            .oneshot(admin_multipart(Method::POST, "/admin/api/banners", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let key = body["image_key"].as_str().unwrap().to_string();
        assert_eq!(store.keys().await, vec![key.clone()]);
        assert_eq!(body["image_url"], format!("https://cdn.example.edu/{}", key));
        assert_eq!(body["active"], true);
        assert_eq!(repo.banners.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_banner_without_image_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut app_state = state(store.clone());
        app_state.banner_repo = Arc::new(StubBannerRepo::default());

        let body = multipart(&[("title", "Sem imagem")], &[]);
        let response = router(app_state)
            .oneshot(admin_multipart(Method::POST, "/admin/api/banners", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_image_discards_previous_object() {
        let store = Arc::new(MemoryStore::new());
        let (repo, id, old_key) = seeded(&store, false).await;
        let mut app_state = state(store.clone());
        app_state.banner_repo = repo.clone();

        let body = multipart(&[], &[("image", "nova.png")]);
        let response = router(app_state)
            .oneshot(admin_multipart(
                Method::PUT,
                &format!("/admin/api/banners/{}/image", id),
                body,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let keys = store.keys().await;
        assert_eq!(keys.len(), 1);
        assert_ne!(keys[0], old_key);
        assert_eq!(repo.banners.lock().unwrap()[0].image_key, keys[0]);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_object() {
        let store = Arc::new(MemoryStore::new());
        let (repo, id, old_key) = seeded(&store, true).await;
        let mut app_state = state(store.clone());
        app_state.banner_repo = repo.clone();

        let body = multipart(&[], &[("image", "nova.png")]);
        let response = router(app_state)
            .oneshot(admin_multipart(
                Method::PUT,
                &format!("/admin/api/banners/{}/image", id),
                body,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.keys().await, vec![old_key.clone()]);
        assert_eq!(repo.banners.lock().unwrap()[0].image_key, old_key);
    }
}
