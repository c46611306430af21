//! Order lifecycle
//!
//! Orders are only ever created from a booking. Creating one approves the
//! booking on a best-effort basis; the order is the durable side effect.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::notifications::NotificationService;
use super::workers::WorkerRegistry;
use crate::domain::*;
use crate::store::{bounded, BookingStore, OrderStore, StoreError};

const ALREADY_PROCESSED: &str = "booking already approved or processed";

pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    bookings: Arc<dyn BookingStore>,
    workers: Arc<WorkerRegistry>,
    notifications: Arc<NotificationService>,
    timeout: Duration,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        bookings: Arc<dyn BookingStore>,
        workers: Arc<WorkerRegistry>,
        notifications: Arc<NotificationService>,
        timeout: Duration,
    ) -> Self {
        Self {
            orders,
            bookings,
            workers,
            notifications,
            timeout,
        }
    }

    /// Converts a booking into an active, unpaid order.
    ///
    /// A booking that is already approved or completed is rejected, and the
    /// store refuses a second order for the same booking.
    pub async fn create_order_from_booking(&self, booking_id: Uuid) -> ServiceResult<Order> {
        let booking = bounded(self.timeout, self.bookings.find_booking(booking_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Booking))?;

        if matches!(booking.status, BookingStatus::Approved | BookingStatus::Completed) {
            return Err(ServiceError::conflict(ALREADY_PROCESSED));
        }

        let now = Utc::now();
        let order = Order::from_booking(&booking, now);

        bounded(self.timeout, self.orders.insert_order(&order))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => ServiceError::conflict(ALREADY_PROCESSED),
                other => other.into(),
            })?;

        tracing::info!(
            order_id = %order.id,
            booking_id = %booking.id,
            carwash_id = %order.carwash_id,
            "Order created from booking"
        );

        if let Err(e) = bounded(
            self.timeout,
            self.bookings.set_booking_status(booking.id, BookingStatus::Approved, now),
        )
        .await
        {
            tracing::warn!(
                order_id = %order.id,
                booking_id = %booking.id,
                error = %e,
                "Order created but booking approval failed"
            );
        }

        self.notifications.order_created(&order).await;

        Ok(order)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Order> {
        bounded(self.timeout, self.orders.find_order(id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Order))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ServiceResult<Vec<Order>> {
        Ok(bounded(self.timeout, self.orders.list_orders_by_user(user_id)).await?)
    }

    pub async fn list_by_carwash(&self, carwash_id: Uuid) -> ServiceResult<Vec<Order>> {
        Ok(bounded(self.timeout, self.orders.list_orders_by_carwash(carwash_id)).await?)
    }

    /// Overwrites the status. Transitions are not checked.
    pub async fn update_status(&self, id: Uuid, status: &str) -> ServiceResult<Order> {
        let status: OrderStatus = status.parse().map_err(ServiceError::Validation)?;
        bounded(self.timeout, self.orders.set_order_status(id, status, Utc::now())).await?;

        tracing::info!(order_id = %id, status = %status, "Order status updated");

        let order = self.get_by_id(id).await?;
        self.notifications.order_status_changed(&order).await;
        Ok(order)
    }

    pub async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> ServiceResult<Order> {
        bounded(self.timeout, self.orders.set_order_payment_status(id, status, Utc::now())).await?;
        self.get_by_id(id).await
    }

    /// Goes through the worker registry, so availability and exclusivity
    /// checks apply here too.
    pub async fn assign_worker(&self, order_id: Uuid, worker_id: Uuid) -> ServiceResult<Order> {
        self.workers.assign_to_order(worker_id, order_id).await
    }

    pub async fn remove_worker(&self, order_id: Uuid, worker_id: Uuid) -> ServiceResult<Order> {
        self.workers.remove_from_order(worker_id, order_id).await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::services::testing::Harness;
    use crate::store::memory::FailPoint;

    #[tokio::test]
    async fn order_copies_booking() {
        let h = Harness::new();
        let booking = h.booking().await;

        let order = h.services.orders.create_order_from_booking(booking.id).await.unwrap();
        assert_eq!(order.booking_id, Some(booking.id));
        assert_eq!(order.user_id, booking.user_id);
        assert_eq!(order.carwash_id, booking.carwash_id);
        assert_eq!(order.queue_number, booking.queue_number);
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total_amount, Decimal::ZERO);
        assert_eq!(order.worker_id, None);

        let booking = h.services.bookings.get_by_id(booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Approved);
    }

    #[tokio::test]
    async fn second_conversion_is_rejected() {
        let h = Harness::new();
        let booking = h.booking().await;

        h.services.orders.create_order_from_booking(booking.id).await.unwrap();
        let err = h.services.orders.create_order_from_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ALREADY_PROCESSED));

        assert_eq!(h.services.orders.list_by_user(booking.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completed_booking_is_rejected() {
        let h = Harness::new();
        let booking = h.booking().await;
        h.services.bookings.update_status(booking.id, "completed").await.unwrap();

        let err = h.services.orders.create_order_from_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn store_constraint_backs_the_status_guard() {
        let h = Harness::new();
        let booking = h.booking().await;

        // Approval fails, so the booking stays pending after the first order.
        h.store.fail_next(FailPoint::BookingStatus);
        let order = h.services.orders.create_order_from_booking(booking.id).await.unwrap();
        assert_eq!(h.services.bookings.get_by_id(booking.id).await.unwrap().status, BookingStatus::Pending);
        assert_eq!(h.services.orders.get_by_id(order.id).await.unwrap().id, order.id);

        let err = h.services.orders.create_order_from_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ALREADY_PROCESSED));
    }

    #[tokio::test]
    async fn missing_booking() {
        let h = Harness::new();
        let err = h.services.orders.create_order_from_booking(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Booking)));
    }

    #[tokio::test]
    async fn status_overwrite_notifies_customer() {
        let h = Harness::new();
        let order = h.order().await;

        let err = h.services.orders.update_status(order.id, "washing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let updated = h.services.orders.update_status(order.id, "in_progress").await.unwrap();
        assert_eq!(updated.status, OrderStatus::InProgress);

        let inbox = h.services.notifications.list_for_user(order.user_id, None).await.unwrap();
        assert!(inbox.iter().any(|n| n.title == "Order status update"));
    }

    #[tokio::test]
    async fn payment_status_can_be_settled_manually() {
        let h = Harness::new();
        let order = h.order().await;

        let paid = h.services.orders.update_payment_status(order.id, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Active);

        let err = h
            .services
            .orders
            .update_payment_status(Uuid::new_v4(), PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Order)));
    }

    #[tokio::test]
    async fn assign_worker_uses_guarded_path() {
        let h = Harness::new();
        let first = h.order().await;
        let second = h.order().await;
        let worker = h.online_worker(first.carwash_id).await;

        let assigned = h.services.orders.assign_worker(first.id, worker.id).await.unwrap();
        assert_eq!(assigned.worker_id, Some(worker.id));

        let err = h.services.orders.assign_worker(second.id, worker.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let released = h.services.orders.remove_worker(first.id, worker.id).await.unwrap();
        assert_eq!(released.worker_id, None);
    }

    #[tokio::test]
    async fn carwash_listing() {
        let h = Harness::new();
        let order = h.order().await;
        h.order().await;

        let listed = h.services.orders.list_by_carwash(order.carwash_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, order.id);
    }
}
