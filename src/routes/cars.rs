//! Car routes
//!
//! A caller only ever sees and edits their own cars.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::*;
use crate::error::{ApiError, ApiResult};

/// POST /cars
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateCarRequest>,
) -> ApiResult<impl IntoResponse> {
    let car = state.services.cars.create_car(auth.user_id, req).await?;
    Ok(Created(car))
}

/// GET /cars/my
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.cars.list_by_user(auth.user_id).await?))
}

/// GET /cars/:id
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let car = state.services.cars.get_by_id(id).await?;
    if !auth.is_user(car.owner_id) {
        return Err(ApiError::forbidden("not your car"));
    }
    Ok(DataResponse::new(car))
}

/// PUT /cars/:id
pub async fn update_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(patch): Json<CarPatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.cars.update_car(auth.user_id, id, patch).await?))
}

/// DELETE /cars/:id
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    state.services.cars.delete_car(auth.user_id, id).await?;
    Ok(MessageResponse::new("car deleted"))
}

/// PATCH /cars/:id/default
pub async fn set_default(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.cars.set_default(auth.user_id, id).await?))
}
