//! In-process store
//!
//! Keeps every aggregate in a `Vec` behind one lock, so uniqueness checks and
//! the write they guard happen atomically. Used for local runs with
//! `STORE_BACKEND=memory` and throughout the service tests, where
//! [`FailPoint`]s let a test make a single write fail on demand.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;
use crate::geo;

/// A write that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    BookingStatus,
    WorkerAssignment,
    WorkerRelease,
    OrderWorker,
}

#[derive(Default)]
struct Tables {
    carwashes: Vec<Carwash>,
    bookings: Vec<Booking>,
    orders: Vec<Order>,
    workers: Vec<Worker>,
    reviews: Vec<Review>,
    payments: Vec<Payment>,
    notifications: Vec<Notification>,
    cars: Vec<Car>,
    contacts: HashMap<Uuid, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    armed: Mutex<HashSet<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write guarded by `point` fail with a database error.
    #[cfg(test)]
    pub fn fail_next(&self, point: FailPoint) {
        self.armed.lock().insert(point);
    }

    /// Registers an email address for a user that is not a worker.
    #[cfg(test)]
    pub fn add_contact(&self, user_id: Uuid, email: impl Into<String>) {
        self.tables.lock().contacts.insert(user_id, email.into());
    }

    fn trip(&self, point: FailPoint) -> StoreResult<()> {
        if self.armed.lock().remove(&point) {
            return Err(StoreError::Database(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

fn carwash_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut Carwash> {
    tables
        .carwashes
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or(StoreError::NotFound(Entity::Carwash))
}

fn booking_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut Booking> {
    tables
        .bookings
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or(StoreError::NotFound(Entity::Booking))
}

fn order_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut Order> {
    tables
        .orders
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or(StoreError::NotFound(Entity::Order))
}

fn worker_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut Worker> {
    tables
        .workers
        .iter_mut()
        .find(|w| w.id == id)
        .ok_or(StoreError::NotFound(Entity::Worker))
}

fn car_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut Car> {
    tables
        .cars
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or(StoreError::NotFound(Entity::Car))
}

#[async_trait]
impl CarwashStore for MemoryStore {
    async fn insert_carwash(&self, carwash: &Carwash) -> StoreResult<()> {
        self.tables.lock().carwashes.push(carwash.clone());
        Ok(())
    }

    async fn find_carwash(&self, id: Uuid) -> StoreResult<Option<Carwash>> {
        Ok(self.tables.lock().carwashes.iter().find(|c| c.id == id).cloned())
    }

    async fn list_active_carwashes(&self) -> StoreResult<Vec<Carwash>> {
        Ok(self
            .tables
            .lock()
            .carwashes
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn list_carwashes_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Carwash>> {
        Ok(self
            .tables
            .lock()
            .carwashes
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_carwash(&self, id: Uuid, patch: &CarwashPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, id)?;
        patch.apply_to(carwash);
        carwash.updated_at = now;
        Ok(())
    }

    async fn set_carwash_active(&self, id: Uuid, is_active: bool, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, id)?;
        carwash.is_active = is_active;
        carwash.updated_at = now;
        Ok(())
    }

    async fn set_carwash_location(
        &self,
        id: Uuid,
        location: GeoPoint,
        service_range_minutes: i32,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, id)?;
        carwash.location = Some(location);
        carwash.has_location = true;
        carwash.service_range_minutes = service_range_minutes;
        if let Some(address) = address {
            carwash.address = address.to_string();
        }
        carwash.updated_at = now;
        Ok(())
    }

    async fn set_queue_count(&self, id: Uuid, count: i32, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, id)?;
        carwash.queue_count = count;
        carwash.updated_at = now;
        Ok(())
    }

    async fn find_located_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
    ) -> StoreResult<Vec<Carwash>> {
        let tables = self.tables.lock();
        let mut hits: Vec<(f64, Carwash)> = tables
            .carwashes
            .iter()
            .filter(|c| c.is_active && c.has_location)
            .filter_map(|c| {
                let point = c.location?;
                let distance = geo::distance_km(latitude, longitude, point.latitude(), point.longitude());
                match radius_km {
                    Some(radius) if distance > radius => None,
                    _ => Some((distance, c.clone())),
                }
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits.into_iter().map(|(_, c)| c).collect())
    }

    async fn push_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, carwash_id)?;
        carwash.services.push(service.clone());
        carwash.updated_at = now;
        Ok(())
    }

    async fn replace_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, carwash_id)?;
        match carwash.services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => {
                *existing = service.clone();
                carwash.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_service(&self, carwash_id: Uuid, service_id: Uuid, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let carwash = carwash_mut(&mut tables, carwash_id)?;
        let before = carwash.services.len();
        carwash.services.retain(|s| s.id != service_id);
        let removed = carwash.services.len() != before;
        if removed {
            carwash.updated_at = now;
        }
        Ok(removed)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let taken = tables
            .bookings
            .iter()
            .any(|b| b.carwash_id == booking.carwash_id && b.booking_time == booking.booking_time);
        if taken {
            return Err(StoreError::Duplicate("bookings_slot_unique".into()));
        }
        tables.bookings.push(booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.lock().bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables
            .lock()
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_time.cmp(&a.booking_time));
        Ok(bookings)
    }

    async fn list_bookings_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables
            .lock()
            .bookings
            .iter()
            .filter(|b| b.carwash_id == carwash_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_time.cmp(&a.booking_time));
        Ok(bookings)
    }

    async fn list_bookings_between(
        &self,
        carwash_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables
            .lock()
            .bookings
            .iter()
            .filter(|b| b.carwash_id == carwash_id && b.booking_time >= start && b.booking_time < end)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.booking_time);
        Ok(bookings)
    }

    async fn set_booking_status(&self, id: Uuid, status: BookingStatus, now: DateTime<Utc>) -> StoreResult<()> {
        self.trip(FailPoint::BookingStatus)?;
        let mut tables = self.tables.lock();
        let booking = booking_mut(&mut tables, id)?;
        booking.status = status;
        booking.updated_at = now;
        Ok(())
    }

    async fn update_booking_details(
        &self,
        id: Uuid,
        booking_time: Option<DateTime<Utc>>,
        notes: Option<&str>,
        address_note: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(time) = booking_time {
            let carwash_id = tables
                .bookings
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.carwash_id)
                .ok_or(StoreError::NotFound(Entity::Booking))?;
            let taken = tables
                .bookings
                .iter()
                .any(|b| b.id != id && b.carwash_id == carwash_id && b.booking_time == time);
            if taken {
                return Err(StoreError::Duplicate("bookings_slot_unique".into()));
            }
        }

        let booking = booking_mut(&mut tables, id)?;
        if let Some(time) = booking_time {
            booking.booking_time = time;
        }
        if let Some(notes) = notes {
            booking.notes = Some(notes.to_string());
        }
        if let Some(address_note) = address_note {
            booking.address_note = Some(address_note.to_string());
        }
        booking.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(booking_id) = order.booking_id {
            if tables.orders.iter().any(|o| o.booking_id == Some(booking_id)) {
                return Err(StoreError::Duplicate("orders_booking_unique".into()));
            }
        }
        tables.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .tables
            .lock()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .tables
            .lock()
            .orders
            .iter()
            .filter(|o| o.carwash_id == carwash_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let order = order_mut(&mut tables, id)?;
        order.status = status;
        order.updated_at = now;
        Ok(())
    }

    async fn set_order_worker(&self, id: Uuid, worker_id: Option<Uuid>, now: DateTime<Utc>) -> StoreResult<()> {
        self.trip(FailPoint::OrderWorker)?;
        let mut tables = self.tables.lock();
        let order = order_mut(&mut tables, id)?;
        order.worker_id = worker_id;
        order.updated_at = now;
        Ok(())
    }

    async fn set_order_payment_status(&self, id: Uuid, status: PaymentStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let order = order_mut(&mut tables, id)?;
        order.payment_status = status;
        order.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl WorkerStore for MemoryStore {
    async fn insert_worker(&self, worker: &Worker) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let email_taken = tables.workers.iter().any(|w| w.email == worker.email)
            || tables.contacts.values().any(|email| *email == worker.email);
        if email_taken {
            return Err(StoreError::Duplicate("users_email_key".into()));
        }
        tables.workers.push(worker.clone());
        Ok(())
    }

    async fn find_worker(&self, id: Uuid) -> StoreResult<Option<Worker>> {
        Ok(self.tables.lock().workers.iter().find(|w| w.id == id).cloned())
    }

    async fn list_workers_by_business(&self, business_id: Uuid) -> StoreResult<Vec<Worker>> {
        Ok(self
            .tables
            .lock()
            .workers
            .iter()
            .filter(|w| w.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn list_available_workers(&self, business_id: Uuid) -> StoreResult<Vec<Worker>> {
        Ok(self
            .tables
            .lock()
            .workers
            .iter()
            .filter(|w| w.business_id == business_id && w.is_available())
            .cloned()
            .collect())
    }

    async fn update_worker_details(&self, id: Uuid, patch: &WorkerPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let worker = worker_mut(&mut tables, id)?;
        if let Some(name) = &patch.name {
            worker.name = name.clone();
        }
        if let Some(phone) = &patch.phone {
            worker.phone = Some(phone.clone());
        }
        if let Some(job_role) = &patch.job_role {
            worker.job_role = Some(job_role.clone());
        }
        worker.updated_at = now;
        Ok(())
    }

    async fn set_worker_account_status(&self, id: Uuid, status: AccountStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let worker = worker_mut(&mut tables, id)?;
        worker.account_status = status;
        worker.updated_at = now;
        Ok(())
    }

    async fn set_worker_work_status(&self, id: Uuid, status: WorkStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let worker = worker_mut(&mut tables, id)?;
        worker.work_status = status;
        worker.last_seen = Some(now);
        worker.updated_at = now;
        Ok(())
    }

    async fn attach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        self.trip(FailPoint::WorkerAssignment)?;
        let mut tables = self.tables.lock();
        let worker = worker_mut(&mut tables, worker_id)?;
        if !worker.active_orders.contains(&order_id) {
            worker.active_orders.push(order_id);
        }
        worker.work_status = WorkStatus::Busy;
        worker.last_seen = Some(now);
        worker.updated_at = now;
        Ok(())
    }

    async fn detach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        self.trip(FailPoint::WorkerRelease)?;
        let mut tables = self.tables.lock();
        let worker = worker_mut(&mut tables, worker_id)?;
        worker.active_orders.retain(|id| *id != order_id);
        worker.work_status = WorkStatus::Online;
        worker.last_seen = Some(now);
        worker.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn review_exists(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .tables
            .lock()
            .reviews
            .iter()
            .any(|r| r.user_id == user_id && r.order_id == Some(order_id)))
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(order_id) = review.order_id {
            let exists = tables
                .reviews
                .iter()
                .any(|r| r.user_id == review.user_id && r.order_id == Some(order_id));
            if exists {
                return Err(StoreError::Duplicate("reviews_user_order_unique".into()));
            }
        }
        tables.reviews.push(review.clone());
        Ok(())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .tables
            .lock()
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn list_reviews_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .tables
            .lock()
            .reviews
            .iter()
            .filter(|r| r.carwash_id == carwash_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn find_review_by_order(&self, order_id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self
            .tables
            .lock()
            .reviews
            .iter()
            .find(|r| r.order_id == Some(order_id))
            .cloned())
    }

    async fn average_rating(&self, carwash_id: Uuid) -> StoreResult<Option<f64>> {
        let tables = self.tables.lock();
        let ratings: Vec<i32> = tables
            .reviews
            .iter()
            .filter(|r| r.carwash_id == carwash_id)
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        let sum: i32 = ratings.iter().sum();
        Ok(Some(f64::from(sum) / ratings.len() as f64))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()> {
        self.tables.lock().payments.push(payment.clone());
        Ok(())
    }

    async fn list_payments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .tables
            .lock()
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }

    async fn list_payments_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .tables
            .lock()
            .payments
            .iter()
            .filter(|p| p.carwash_id == carwash_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }

    async fn find_payment_by_order(&self, order_id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self
            .tables
            .lock()
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn total_paid_for_carwash(&self, carwash_id: Uuid) -> StoreResult<Decimal> {
        Ok(self
            .tables
            .lock()
            .payments
            .iter()
            .filter(|p| p.carwash_id == carwash_id && p.status == PaymentRecordStatus::Paid)
            .map(|p| p.amount)
            .sum())
    }
}

#[async_trait]
impl CarStore for MemoryStore {
    async fn insert_car(&self, car: &Car) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if car.is_default {
            for other in tables.cars.iter_mut().filter(|c| c.owner_id == car.owner_id) {
                other.is_default = false;
            }
        }
        tables.cars.push(car.clone());
        Ok(())
    }

    async fn find_car(&self, id: Uuid) -> StoreResult<Option<Car>> {
        Ok(self.tables.lock().cars.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cars_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Car>> {
        let mut cars: Vec<Car> = self
            .tables
            .lock()
            .cars
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        cars.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cars)
    }

    async fn update_car(&self, id: Uuid, patch: &CarPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let car = car_mut(&mut tables, id)?;
        if let Some(model) = &patch.model {
            car.model = model.clone();
        }
        if let Some(plate) = &patch.plate {
            car.plate = plate.clone();
        }
        if let Some(color) = &patch.color {
            car.color = Some(color.clone());
        }
        car.updated_at = now;
        Ok(())
    }

    async fn delete_car(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let before = tables.cars.len();
        tables.cars.retain(|c| c.id != id);
        if tables.cars.len() == before {
            return Err(StoreError::NotFound(Entity::Car));
        }
        Ok(())
    }

    async fn set_default_car(&self, owner_id: Uuid, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if !tables.cars.iter().any(|c| c.id == id && c.owner_id == owner_id) {
            return Err(StoreError::NotFound(Entity::Car));
        }
        for car in tables.cars.iter_mut().filter(|c| c.owner_id == owner_id) {
            let is_default = car.id == id;
            if car.is_default != is_default {
                car.is_default = is_default;
                car.updated_at = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.tables.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid, limit: u32) -> StoreResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .tables
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit as usize);
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(StoreError::NotFound(Entity::Notification))?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.lock();
        let mut marked = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .tables
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_email_sent(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StoreError::NotFound(Entity::Notification))?;
        notification.email_sent = true;
        Ok(())
    }

    async fn recipient_email(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        let tables = self.tables.lock();
        if let Some(email) = tables.contacts.get(&user_id) {
            return Ok(Some(email.clone()));
        }
        Ok(tables
            .workers
            .iter()
            .find(|w| w.id == user_id)
            .map(|w| w.email.clone()))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
