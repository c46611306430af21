use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{managed_carwash, require_party, staffed_carwash};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::*;
use crate::error::{ApiError, ApiResult};

/// POST /bookings/:id/order
///
/// Staff accept a booking by turning it into an order.
pub async fn create_from_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.get_by_id(booking_id).await?;
    staffed_carwash(&state, &auth, booking.carwash_id).await?;

    let order = state.services.orders.create_order_from_booking(booking_id).await?;
    Ok(Created(order))
}

/// GET /orders/mine
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.orders.list_by_user(auth.user_id).await?))
}

/// GET /orders/:id
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(id).await?;
    if order.worker_id != Some(auth.user_id) {
        require_party(&state, &auth, order.user_id, order.carwash_id).await?;
    }
    Ok(DataResponse::new(order))
}

/// PUT /orders/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(id).await?;
    staffed_carwash(&state, &auth, order.carwash_id).await?;
    Ok(DataResponse::new(state.services.orders.update_status(id, &req.status).await?))
}

/// PUT /orders/:id/payment-status
///
/// Manual settlement, e.g. cash taken at the counter without a payment record.
pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<PaymentStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(id).await?;
    managed_carwash(&state, &auth, order.carwash_id).await?;
    let order = state.services.orders.update_payment_status(id, req.payment_status).await?;
    Ok(DataResponse::new(order))
}

/// PUT /orders/:id/worker
pub async fn assign_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<AssignWorkerRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(id).await?;
    managed_carwash(&state, &auth, order.carwash_id).await?;

    let worker = state.services.workers.get_by_id(req.worker_id).await?;
    if worker.business_id != order.carwash_id {
        return Err(ApiError::bad_request("worker does not belong to this carwash"));
    }

    Ok(DataResponse::new(state.services.orders.assign_worker(id, req.worker_id).await?))
}

/// DELETE /orders/:id/worker/:worker_id
///
/// The carwash owner or the assigned worker may release the order.
pub async fn remove_worker(
    State(state): State<Arc<AppState>>,
    Path((id, worker_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(id).await?;
    if auth.user_id != worker_id {
        managed_carwash(&state, &auth, order.carwash_id).await?;
    }
    Ok(DataResponse::new(state.services.orders.remove_worker(id, worker_id).await?))
}

/// GET /carwashes/:id/orders
pub async fn list_for_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    staffed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.orders.list_by_carwash(id).await?))
}
