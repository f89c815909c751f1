//! CRUD endpoints shared by the four reference kinds. Each route is an
//! instantiation of these handlers for one entity type.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    handlers::{json_body, parse_path_id},
    models::actor::Actor,
    repositories::reference::ReferenceEntity,
    services::reference as reference_service,
    state::AppState,
};

pub async fn list_references<T: ReferenceEntity>(
    State(state): State<AppState>,
) -> Result<Json<Vec<T>>, AppError> {
    Ok(Json(reference_service::list::<T>(&state.pool).await?))
}

pub async fn get_reference<T: ReferenceEntity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<T>, AppError> {
    let id: i64 = parse_path_id(&id, T::KIND.label())?;
    Ok(Json(reference_service::get::<T>(&state.pool, id).await?))
}

pub async fn create_reference<T: ReferenceEntity>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<T::Payload>, JsonRejection>,
) -> Result<(StatusCode, Json<T>), AppError> {
    let payload = json_body(payload)?;
    let created = reference_service::create::<T>(&state.pool, payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_reference<T: ReferenceEntity>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<T::Payload>, JsonRejection>,
) -> Result<Json<T>, AppError> {
    let id: i64 = parse_path_id(&id, T::KIND.label())?;
    let payload = json_body(payload)?;
    Ok(Json(
        reference_service::update::<T>(&state.pool, id, payload, &actor).await?,
    ))
}

pub async fn delete_reference<T: ReferenceEntity>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: i64 = parse_path_id(&id, T::KIND.label())?;
    reference_service::delete::<T>(&state.pool, id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
