use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::CreateReviewRequest;
use crate::error::{ApiError, ApiResult};

/// POST /reviews
///
/// A review tied to an order may only come from that order's customer.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(order_id) = req.order_id {
        let order = state.services.orders.get_by_id(order_id).await?;
        if order.user_id != auth.user_id {
            return Err(ApiError::forbidden("you can only review your own orders"));
        }
    }

    Ok(Created(state.services.reviews.create_review(auth.user_id, req).await?))
}

/// GET /reviews/mine
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.reviews.list_by_user(auth.user_id).await?))
}

/// GET /carwashes/:id/reviews
pub async fn list_for_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.reviews.list_by_carwash(id).await?))
}

/// GET /carwashes/:id/rating
pub async fn average_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.reviews.average_rating(id).await?))
}

/// GET /orders/:id/review
pub async fn get_for_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    _auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.reviews.get_by_order(order_id).await?))
}
