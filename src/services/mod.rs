//! Service layer
//!
//! Each ledger owns the rules for one aggregate and talks to persistence only
//! through the store traits. `Services` wires them all against one backend.

pub mod bookings;
pub mod cars;
pub mod carwashes;
pub mod error;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod workers;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

pub use bookings::BookingLedger;
pub use cars::CarRegistry;
pub use carwashes::CarwashDirectory;
pub use error::{ServiceError, ServiceResult};
pub use notifications::{
    EmailDispatcher, EmailQueue, EmailSender, HttpEmailSender, LogEmailSender, NotificationService,
};
pub use orders::OrderLifecycle;
pub use payments::PaymentLedger;
pub use reviews::ReviewLedger;
pub use workers::WorkerRegistry;

use crate::store::Store;

pub(crate) fn validate_point(latitude: f64, longitude: f64) -> ServiceResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ServiceError::validation("latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ServiceError::validation("longitude must be between -180 and 180"));
    }
    Ok(())
}

pub struct Services {
    pub carwashes: CarwashDirectory,
    pub bookings: BookingLedger,
    pub orders: OrderLifecycle,
    pub workers: Arc<WorkerRegistry>,
    pub reviews: ReviewLedger,
    pub payments: PaymentLedger,
    pub cars: Arc<CarRegistry>,
    pub notifications: Arc<NotificationService>,
}

impl Services {
    /// Every store call made by the services is bounded by `timeout`.
    pub fn new<S: Store + 'static>(store: Arc<S>, emails: EmailQueue, timeout: Duration) -> Self {
        let notifications = Arc::new(NotificationService::new(store.clone(), emails, timeout));
        let cars = Arc::new(CarRegistry::new(store.clone(), timeout));
        let workers = Arc::new(WorkerRegistry::new(
            store.clone(),
            store.clone(),
            notifications.clone(),
            timeout,
        ));

        Self {
            carwashes: CarwashDirectory::new(store.clone(), store.clone(), timeout),
            bookings: BookingLedger::new(
                store.clone(),
                store.clone(),
                cars.clone(),
                notifications.clone(),
                timeout,
            ),
            orders: OrderLifecycle::new(
                store.clone(),
                store.clone(),
                workers.clone(),
                notifications.clone(),
                timeout,
            ),
            workers,
            reviews: ReviewLedger::new(store.clone(), store.clone(), store.clone(), timeout),
            payments: PaymentLedger::new(store.clone(), store, timeout),
            cars,
            notifications,
        }
    }
}
