//! Shared fixtures for service tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use super::notifications::EmailJob;
use super::{EmailQueue, ServiceResult, Services};
use crate::domain::*;
use crate::store::MemoryStore;

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub services: Services,
    #[allow(dead_code)]
    pub emails: Receiver<EmailJob>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let (queue, emails) = EmailQueue::channel(64);
        let services = Services::new(store.clone(), queue, Duration::from_secs(1));
        Self {
            store,
            services,
            emails,
        }
    }

    /// Open every day, 00:00 to 23:59.
    pub fn carwash_input(&self, name: &str, point: Option<(f64, f64)>) -> CreateCarwashRequest {
        let open_hours = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
            .into_iter()
            .map(|day| {
                let hours = TimeRange {
                    start: "00:00".to_string(),
                    end: "23:59".to_string(),
                };
                (day.to_string(), hours)
            })
            .collect();
        CreateCarwashRequest {
            name: name.to_string(),
            description: None,
            address: "1 Test Street".to_string(),
            latitude: point.map(|(lat, _)| lat),
            longitude: point.map(|(_, lon)| lon),
            service_range_minutes: None,
            home_service: false,
            max_cars_per_slot: None,
            open_hours,
        }
    }

    pub async fn carwash_at(&self, name: &str, lat: f64, lon: f64) -> Carwash {
        self.services
            .carwashes
            .create_carwash(Uuid::new_v4(), self.carwash_input(name, Some((lat, lon))))
            .await
            .unwrap()
    }

    /// A fresh car owner and the id of their registered car.
    pub async fn driver(&self) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let car = self
            .services
            .cars
            .create_car(
                user_id,
                CreateCarRequest {
                    model: "Toyota Corolla".to_string(),
                    plate: "LAG-123".to_string(),
                    color: None,
                    is_default: true,
                },
            )
            .await
            .unwrap();
        (user_id, car.id)
    }

    pub fn booking_request(&self, car_id: Uuid, carwash_id: Uuid, at: DateTime<FixedOffset>) -> CreateBookingRequest {
        CreateBookingRequest {
            car_id,
            carwash_id,
            service_ids: Vec::new(),
            booking_time: Some(at),
            booking_type: BookingType::SlotBooking,
            user_location: None,
            address_note: None,
            notes: None,
        }
    }

    /// Books `at` for a fresh driver.
    pub async fn book(&self, carwash_id: Uuid, at: DateTime<FixedOffset>) -> ServiceResult<Booking> {
        let (user_id, car_id) = self.driver().await;
        self.services
            .bookings
            .create(user_id, self.booking_request(car_id, carwash_id, at))
            .await
    }

    /// A pending booking in a carwash of its own.
    pub async fn booking(&self) -> Booking {
        let carwash = self.carwash_at("Fixture", 6.5, 3.3).await;
        let at = DateTime::parse_from_rfc3339("2024-06-01T09:00:00Z").unwrap();
        self.book(carwash.id, at).await.unwrap()
    }

    /// An active order converted from a fresh booking.
    pub async fn order(&self) -> Order {
        let booking = self.booking().await;
        self.services.orders.create_order_from_booking(booking.id).await.unwrap()
    }

    pub async fn online_worker(&self, business_id: Uuid) -> Worker {
        self.services
            .workers
            .create_worker(CreateWorkerRequest {
                business_id,
                name: "Test Worker".to_string(),
                email: format!("worker-{}@example.com", Uuid::new_v4().simple()),
                phone: None,
                job_role: Some("washer".to_string()),
            })
            .await
            .unwrap()
    }
}
