//! Persistence layer
//!
//! One async trait per aggregate. Services depend on these traits only;
//! [`PgStore`] backs them with PostgreSQL and [`MemoryStore`] keeps
//! everything in process for local runs and tests.
//!
//! Cross-record invariants that must survive concurrent writers (one booking
//! per carwash slot, one order per booking, one review per user and order)
//! are enforced by the store itself and reported as [`StoreError::Duplicate`].
//! Default-car switching is a single store call for the same reason.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::*;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.constraint().unwrap_or("unique").to_string());
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Runs a store operation under a deadline.
///
/// An elapsed deadline is reported as [`StoreError::Timeout`]; the operation
/// future is dropped.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| StoreError::Timeout)?
}

#[async_trait]
pub trait CarwashStore: Send + Sync {
    async fn insert_carwash(&self, carwash: &Carwash) -> StoreResult<()>;
    async fn find_carwash(&self, id: Uuid) -> StoreResult<Option<Carwash>>;
    async fn list_active_carwashes(&self) -> StoreResult<Vec<Carwash>>;
    async fn list_carwashes_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Carwash>>;
    async fn update_carwash(&self, id: Uuid, patch: &CarwashPatch, now: DateTime<Utc>) -> StoreResult<()>;
    async fn set_carwash_active(&self, id: Uuid, is_active: bool, now: DateTime<Utc>) -> StoreResult<()>;
    async fn set_carwash_location(
        &self,
        id: Uuid,
        location: GeoPoint,
        service_range_minutes: i32,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;
    async fn set_queue_count(&self, id: Uuid, count: i32, now: DateTime<Utc>) -> StoreResult<()>;

    /// Active carwashes with a location, nearest first.
    ///
    /// With `radius_km` set only carwashes within that great-circle distance
    /// of the point are returned.
    async fn find_located_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
    ) -> StoreResult<Vec<Carwash>>;

    async fn push_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<()>;

    /// Replaces the embedded service with the same id. `Ok(false)` when the
    /// carwash exists but has no such service.
    async fn replace_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Removes the embedded service. `Ok(false)` when it was not present.
    async fn remove_service(&self, carwash_id: Uuid, service_id: Uuid, now: DateTime<Utc>) -> StoreResult<bool>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the carwash already has a
    /// booking at exactly the same instant.
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    async fn list_bookings_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;
    async fn list_bookings_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Bookings with `start <= booking_time < end`, earliest first.
    async fn list_bookings_between(
        &self,
        carwash_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Booking>>;
    async fn set_booking_status(&self, id: Uuid, status: BookingStatus, now: DateTime<Utc>) -> StoreResult<()>;
    async fn update_booking_details(
        &self,
        id: Uuid,
        booking_time: Option<DateTime<Utc>>,
        notes: Option<&str>,
        address_note: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when an order already exists for
    /// the same booking.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn list_orders_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn set_order_status(&self, id: Uuid, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<()>;
    async fn set_order_worker(&self, id: Uuid, worker_id: Option<Uuid>, now: DateTime<Utc>) -> StoreResult<()>;
    async fn set_order_payment_status(&self, id: Uuid, status: PaymentStatus, now: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait WorkerStore: Send + Sync {
    async fn insert_worker(&self, worker: &Worker) -> StoreResult<()>;
    async fn find_worker(&self, id: Uuid) -> StoreResult<Option<Worker>>;
    async fn list_workers_by_business(&self, business_id: Uuid) -> StoreResult<Vec<Worker>>;

    /// Active, online workers with no active orders.
    async fn list_available_workers(&self, business_id: Uuid) -> StoreResult<Vec<Worker>>;
    async fn update_worker_details(&self, id: Uuid, patch: &WorkerPatch, now: DateTime<Utc>) -> StoreResult<()>;
    async fn set_worker_account_status(&self, id: Uuid, status: AccountStatus, now: DateTime<Utc>) -> StoreResult<()>;

    /// Also stamps `last_seen`.
    async fn set_worker_work_status(&self, id: Uuid, status: WorkStatus, now: DateTime<Utc>) -> StoreResult<()>;

    /// Marks the worker busy, records the order as active and stamps `last_seen`.
    async fn attach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()>;

    /// Drops the order from the worker's active set, marks them online and
    /// stamps `last_seen`.
    async fn detach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn review_exists(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<bool>;

    /// Fails with [`StoreError::Duplicate`] when the user already reviewed the order.
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn list_reviews_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn find_review_by_order(&self, order_id: Uuid) -> StoreResult<Option<Review>>;

    /// `None` when the carwash has no reviews.
    async fn average_rating(&self, carwash_id: Uuid) -> StoreResult<Option<f64>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()>;
    async fn list_payments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Payment>>;
    async fn list_payments_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Payment>>;
    async fn find_payment_by_order(&self, order_id: Uuid) -> StoreResult<Option<Payment>>;

    /// Sum of `paid` payments for the carwash.
    async fn total_paid_for_carwash(&self, carwash_id: Uuid) -> StoreResult<Decimal>;
}

#[async_trait]
pub trait CarStore: Send + Sync {
    /// A car inserted as default takes the flag from the owner's other cars.
    async fn insert_car(&self, car: &Car) -> StoreResult<()>;
    async fn find_car(&self, id: Uuid) -> StoreResult<Option<Car>>;

    /// Oldest first.
    async fn list_cars_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Car>>;
    async fn update_car(&self, id: Uuid, patch: &CarPatch, now: DateTime<Utc>) -> StoreResult<()>;
    async fn delete_car(&self, id: Uuid) -> StoreResult<()>;

    /// Clears the flag on every other car of the owner and sets it on `id`,
    /// atomically.
    async fn set_default_car(&self, owner_id: Uuid, id: Uuid, now: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;

    /// Newest first.
    async fn list_notifications(&self, user_id: Uuid, limit: u32) -> StoreResult<Vec<Notification>>;
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<()>;
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64>;
    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64>;
    async fn mark_email_sent(&self, id: Uuid) -> StoreResult<()>;
    async fn recipient_email(&self, user_id: Uuid) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything a backend must provide to run the application.
pub trait Store:
    CarwashStore
    + BookingStore
    + OrderStore
    + WorkerStore
    + ReviewStore
    + PaymentStore
    + CarStore
    + NotificationStore
    + StoreHealth
{
}

impl<T> Store for T where
    T: CarwashStore
        + BookingStore
        + OrderStore
        + WorkerStore
        + ReviewStore
        + PaymentStore
        + CarStore
        + NotificationStore
        + StoreHealth
{
}
