//! School unit management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use campus_core::ResourceId;
use campus_db::{Unit, UnitInput};
use uuid::Uuid;

use super::{ReorderRequest, resolve_slug};
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/order", put(reorder_units))
        .route(
            "/{id}",
            get(get_unit).put(update_unit).delete(delete_unit),
        )
}

fn normalize(mut input: UnitInput) -> Result<UnitInput, ApiError> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    input.slug = resolve_slug(&input.slug, &input.name)?;
    for field in [&mut input.phone, &mut input.email, &mut input.map_url] {
        *field = field.take().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    }
    Ok(input)
}

async fn list_units(State(state): State<AppState>) -> Result<Json<Vec<Unit>>, ApiError> {
    Ok(Json(state.unit_repo.list().await?))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Unit>, ApiError> {
    Ok(Json(state.unit_repo.get(ResourceId::from_uuid(id)).await?))
}

async fn create_unit(
    State(state): State<AppState>,
    Json(input): Json<UnitInput>,
) -> Result<(StatusCode, Json<Unit>), ApiError> {
    let input = normalize(input)?;
    let unit = state.unit_repo.create(&input).await?;
    tracing::info!(unit_id = %unit.id, slug = %unit.slug, "Created unit");
    Ok((StatusCode::CREATED, Json(unit)))
}

async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UnitInput>,
) -> Result<Json<Unit>, ApiError> {
    let input = normalize(input)?;
    let unit = state
        .unit_repo
        .update(ResourceId::from_uuid(id), &input)
        .await?;
    Ok(Json(unit))
}

/// Facilities and their images cascade with the unit; their objects are
/// discarded afterwards.
async fn delete_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceId::from_uuid(id);
    let keys: Vec<String> = state
        .facility_repo
        .list_images_for_unit(id)
        .await?
        .into_iter()
        .map(|image| image.key)
        .collect();

    state.unit_repo.delete_by_id(id).await?;
    let failed = state.media.discard(&keys).await;
    tracing::info!(unit_id = %id, images = keys.len(), failed, "Deleted unit");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_units(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    state.unit_repo.reorder(&req.ids()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Method;
    use bytes::Bytes;
    use campus_storage::{MemoryStore, ObjectStore};
    use tower::ServiceExt;

    use super::super::stubs::{StubFacilityRepo, StubUnitRepo};
    use crate::routes::router;
    use crate::routes::test_support::{admin_request, state};

    use super::*;

    #[tokio::test]
    async fn test_delete_unit_discards_facility_images() {
        let store = Arc::new(MemoryStore::new());
        let (units, centro) = StubUnitRepo::with_unit("Unidade Centro");
        let (_, norte) = StubUnitRepo::with_unit("Unidade Norte");
        let facilities = StubFacilityRepo::default();
        let quadra = facilities.add_facility(centro, "Quadra");
        let biblioteca = facilities.add_facility(centro, "Biblioteca");
        let lab = facilities.add_facility(norte, "Laboratório");
        for (facility, key) in [
            (quadra, "facilities/quadra/1.png"),
            (biblioteca, "facilities/biblioteca/1.png"),
            (lab, "facilities/lab/1.png"),
        ] {
            facilities.add_image(facility, key);
            store
                .put(key, Bytes::from_static(b"png"), "image/png")
                .await
                .unwrap();
        }

        let units = Arc::new(units);
        let mut app_state = state(store.clone());
        app_state.unit_repo = units.clone();
        app_state.facility_repo = Arc::new(facilities);

        let response = router(app_state)
            .oneshot(admin_request(
                Method::DELETE,
                &format!("/admin/api/units/{}", centro),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(units.units.lock().unwrap().is_empty());
        assert_eq!(store.keys().await, vec!["facilities/lab/1.png".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_unknown_unit_keeps_objects() {
        let store = Arc::new(MemoryStore::new());
        store
            .put("facilities/x/1.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let (units, _) = StubUnitRepo::with_unit("Unidade Centro");
        let mut app_state = state(store.clone());
        app_state.unit_repo = Arc::new(units);
        app_state.facility_repo = Arc::new(StubFacilityRepo::default());

        let response = router(app_state)
            .oneshot(admin_request(
                Method::DELETE,
                &format!("/admin/api/units/{}", Uuid::now_v7()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_normalize_blanks_optional_fields() {
        let input = UnitInput {
            slug: String::new(),
            name: "Unidade Centro".to_string(),
            address: "Rua A, 1".to_string(),
            phone: Some("  ".to_string()),
            email: Some(" centro@example.edu ".to_string()),
            map_url: None,
            description: String::new(),
        };
        let input = normalize(input).unwrap();
        assert_eq!(input.slug, "unidade-centro");
        assert_eq!(input.phone, None);
        assert_eq!(input.email.as_deref(), Some("centro@example.edu"));
    }
}
