//! Carwash routes
//!
//! Directory listings and search are open to any signed-in caller. Edits go
//! through the owning business account.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{managed_carwash, staffed_carwash, DayQuery};
use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::{RequireAuth, Role};
use crate::domain::*;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueueRequest {
    pub queue_count: i32,
}

/// POST /carwashes
pub async fn create_carwash(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateCarwashRequest>,
) -> ApiResult<impl IntoResponse> {
    if !matches!(auth.role, Role::Business | Role::Admin) {
        return Err(ApiError::forbidden("only business accounts can register a carwash"));
    }

    let carwash = state.services.carwashes.create_carwash(auth.user_id, req).await?;
    Ok(Created(carwash))
}

/// GET /carwashes
pub async fn list_active(State(state): State<Arc<AppState>>, _auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.carwashes.list_active().await?))
}

/// GET /carwashes/mine
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.carwashes.list_by_owner(auth.user_id).await?))
}

/// GET /carwashes/nearby?lat=..&lng=..
///
/// Widens from 10 km to 100 km to everything until something is found.
pub async fn find_nearby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let result = state.services.carwashes.find_nearby_for_user(query.lat, query.lng).await?;
    Ok(DataResponse::new(result))
}

/// GET /carwashes/:id
pub async fn get_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.carwashes.get_by_id(id).await?))
}

/// PATCH /carwashes/:id
pub async fn update_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(patch): Json<CarwashPatch>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.carwashes.update_fields(id, patch).await?))
}

/// PUT /carwashes/:id/active
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<ActiveRequest>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.carwashes.set_active(id, req.is_active).await?))
}

/// PUT /carwashes/:id/location
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<LocationUpdate>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.carwashes.update_location(id, req).await?))
}

/// PUT /carwashes/:id/queue
pub async fn update_queue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<QueueRequest>,
) -> ApiResult<impl IntoResponse> {
    staffed_carwash(&state, &auth, id).await?;
    let carwash = state.services.carwashes.update_queue_count(id, req.queue_count).await?;
    Ok(DataResponse::new(carwash))
}

/// GET /carwashes/:id/slots?date=YYYY-MM-DD
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DayQuery>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let date = query.date.ok_or_else(|| ApiError::bad_request("date is required"))?;
    let slots = state.services.carwashes.available_slots(id, date, query.offset()?).await?;
    Ok(DataResponse::new(slots))
}

// ============================================================================
// Services
// ============================================================================

/// GET /carwashes/:id/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.carwashes.list_services(id).await?))
}

/// POST /carwashes/:id/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<ServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(Created(state.services.carwashes.create_service(id, req).await?))
}

/// GET /carwashes/:id/services/:service_id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.carwashes.get_service(id, service_id).await?))
}

/// PUT /carwashes/:id/services/:service_id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
    Json(req): Json<ServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    let service = state.services.carwashes.update_service(id, service_id, req).await?;
    Ok(DataResponse::new(service))
}

/// DELETE /carwashes/:id/services/:service_id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    state.services.carwashes.delete_service(id, service_id).await?;
    Ok(MessageResponse::new("service removed"))
}
