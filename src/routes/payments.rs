use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{managed_carwash, require_party};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::CreatePaymentRequest;
use crate::error::ApiResult;

/// POST /payments
///
/// Records a payment against an order. The customer or carwash staff may
/// record it; the payment is attributed to the order's customer.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(req.order_id).await?;
    require_party(&state, &auth, order.user_id, order.carwash_id).await?;

    let payment = state.services.payments.create_payment(order.user_id, req).await?;
    Ok(Created(payment))
}

/// GET /payments/mine
pub async fn list_mine(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.payments.list_by_user(auth.user_id).await?))
}

/// GET /carwashes/:id/payments
pub async fn list_for_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.payments.list_by_carwash(id).await?))
}

/// GET /carwashes/:id/earnings
pub async fn earnings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.payments.earnings_by_carwash(id).await?))
}

/// GET /orders/:id/payment
pub async fn get_for_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.orders.get_by_id(order_id).await?;
    require_party(&state, &auth, order.user_id, order.carwash_id).await?;
    Ok(DataResponse::new(state.services.payments.get_by_order(order_id).await?))
}
