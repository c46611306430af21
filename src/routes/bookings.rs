use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{require_party, staffed_carwash, DayQuery};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::*;
use crate::error::{ApiError, ApiResult};

/// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.create(auth.user_id, req).await?;
    Ok(Created(booking))
}

/// GET /bookings/mine
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.bookings.list_by_user(auth.user_id).await?))
}

/// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.get_by_id(id).await?;
    require_party(&state, &auth, booking.user_id, booking.carwash_id).await?;
    Ok(DataResponse::new(booking))
}

/// PATCH /bookings/:id
///
/// Only the customer who made the booking may reschedule it.
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(patch): Json<BookingPatch>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.get_by_id(id).await?;
    if !auth.is_user(booking.user_id) {
        return Err(ApiError::forbidden("not your booking"));
    }
    Ok(DataResponse::new(state.services.bookings.update_details(id, patch).await?))
}

/// PUT /bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.get_by_id(id).await?;
    staffed_carwash(&state, &auth, booking.carwash_id).await?;
    Ok(DataResponse::new(state.services.bookings.update_status(id, &req.status).await?))
}

/// POST /bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let booking = state.services.bookings.get_by_id(id).await?;
    require_party(&state, &auth, booking.user_id, booking.carwash_id).await?;
    Ok(DataResponse::new(state.services.bookings.cancel(id).await?))
}

/// GET /carwashes/:id/bookings[?date=YYYY-MM-DD]
pub async fn list_for_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DayQuery>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    staffed_carwash(&state, &auth, id).await?;
    let bookings = match query.date {
        Some(date) => {
            state
                .services
                .bookings
                .list_by_carwash_and_date(id, date, query.offset()?)
                .await?
        }
        None => state.services.bookings.list_by_carwash(id).await?,
    };
    Ok(DataResponse::new(bookings))
}
