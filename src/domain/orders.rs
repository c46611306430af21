use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bookings::{Booking, BookingType};
use super::carwashes::GeoPoint;

text_enum! {
    /// Order status
    pub enum OrderStatus {
        Active => "active",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
    }
}

/// Order entity: the billable unit of work created from a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub carwash_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub worker_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub queue_number: i32,
    pub booking_type: Option<BookingType>,
    pub user_location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a fresh, unpaid order from a booking.
    ///
    /// Price aggregation from the selected services is not done here, so the
    /// total starts at zero.
    pub fn from_booking(booking: &Booking, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: Some(booking.id),
            user_id: booking.user_id,
            car_id: booking.car_id,
            carwash_id: booking.carwash_id,
            service_ids: booking.service_ids.clone(),
            worker_id: None,
            status: OrderStatus::Active,
            payment_status: PaymentStatus::Unpaid,
            total_amount: Decimal::ZERO,
            queue_number: booking.queue_number,
            booking_type: Some(booking.booking_type),
            user_location: booking.user_location,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request DTO for assigning a worker to an order
#[derive(Debug, Clone, Deserialize)]
pub struct AssignWorkerRequest {
    pub worker_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusRequest {
    pub payment_status: PaymentStatus,
}
