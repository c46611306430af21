pub mod bookings;
pub mod cars;
pub mod carwashes;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod workers;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use chrono::{FixedOffset, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::domain::Carwash;
use crate::error::{ApiError, ApiResult};

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Carwashes
        .route("/carwashes", post(carwashes::create_carwash).get(carwashes::list_active))
        .route("/carwashes/mine", get(carwashes::list_mine))
        .route("/carwashes/nearby", get(carwashes::find_nearby))
        .route("/carwashes/:id", get(carwashes::get_carwash).patch(carwashes::update_carwash))
        .route("/carwashes/:id/active", put(carwashes::set_active))
        .route("/carwashes/:id/location", put(carwashes::update_location))
        .route("/carwashes/:id/queue", put(carwashes::update_queue))
        .route("/carwashes/:id/slots", get(carwashes::available_slots))
        // Services (embedded in a carwash)
        .route(
            "/carwashes/:id/services",
            get(carwashes::list_services).post(carwashes::create_service),
        )
        .route(
            "/carwashes/:id/services/:service_id",
            get(carwashes::get_service)
                .put(carwashes::update_service)
                .delete(carwashes::delete_service),
        )
        // Per-carwash listings
        .route("/carwashes/:id/bookings", get(bookings::list_for_carwash))
        .route("/carwashes/:id/orders", get(orders::list_for_carwash))
        .route("/carwashes/:id/workers", get(workers::list_for_carwash))
        .route("/carwashes/:id/reviews", get(reviews::list_for_carwash))
        .route("/carwashes/:id/rating", get(reviews::average_rating))
        .route("/carwashes/:id/payments", get(payments::list_for_carwash))
        .route("/carwashes/:id/earnings", get(payments::earnings))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/mine", get(bookings::list_mine))
        .route("/bookings/:id", get(bookings::get_booking).patch(bookings::update_booking))
        .route("/bookings/:id/status", put(bookings::update_status))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/order", post(orders::create_from_booking))
        // Orders
        .route("/orders/mine", get(orders::list_mine))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/orders/:id/payment-status", put(orders::update_payment_status))
        .route("/orders/:id/worker", put(orders::assign_worker))
        .route("/orders/:id/worker/:worker_id", axum::routing::delete(orders::remove_worker))
        .route("/orders/:id/review", get(reviews::get_for_order))
        .route("/orders/:id/payment", get(payments::get_for_order))
        // Workers
        .route("/workers", post(workers::create_worker))
        .route("/workers/:id", get(workers::get_worker).patch(workers::update_worker))
        .route("/workers/:id/account-status", put(workers::set_account_status))
        .route("/workers/:id/work-status", put(workers::set_work_status))
        .route(
            "/workers/:id/orders/:order_id",
            post(workers::assign_to_order).delete(workers::remove_from_order),
        )
        // Cars
        .route("/cars", post(cars::create_car))
        .route("/cars/my", get(cars::list_mine))
        .route(
            "/cars/:id",
            get(cars::get_car).put(cars::update_car).delete(cars::delete_car),
        )
        .route("/cars/:id/default", patch(cars::set_default))
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route("/reviews/mine", get(reviews::list_mine))
        // Payments
        .route("/payments", post(payments::create_payment))
        .route("/payments/mine", get(payments::list_mine))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::get_unread_count))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/:id/read", put(notifications::mark_notification_read))
}

/// `?date=YYYY-MM-DD&utc_offset_minutes=60`
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl DayQuery {
    pub fn offset(&self) -> ApiResult<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ApiError::bad_request("utc_offset_minutes is out of range"))
    }
}

/// Loads a carwash the caller owns. Admins pass too.
pub(crate) async fn managed_carwash(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Carwash> {
    let carwash = state.services.carwashes.get_by_id(id).await?;
    if !auth.can_manage(carwash.owner_id) {
        return Err(ApiError::forbidden("you do not manage this carwash"));
    }
    Ok(carwash)
}

/// Loads a carwash the caller owns or works at.
pub(crate) async fn staffed_carwash(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Carwash> {
    let carwash = state.services.carwashes.get_by_id(id).await?;
    if !auth.is_staff_of(carwash.id, carwash.owner_id) {
        return Err(ApiError::forbidden("you are not staff of this carwash"));
    }
    Ok(carwash)
}

/// Customer of the record or staff of its carwash.
pub(crate) async fn require_party(
    state: &AppState,
    auth: &AuthContext,
    customer_id: Uuid,
    carwash_id: Uuid,
) -> ApiResult<()> {
    if auth.is_user(customer_id) {
        return Ok(());
    }
    staffed_carwash(state, auth, carwash_id).await.map(|_| ())
}
