use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::carwashes::GeoPoint;

text_enum! {
    /// Where the wash happens.
    pub enum BookingType {
        SlotBooking => "slot_booking",
        HomeService => "home_service",
    }
}

text_enum! {
    /// Booking status
    pub enum BookingStatus {
        Pending => "pending",
        Approved => "approved",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

/// Booking entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub carwash_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub booking_time: DateTime<Utc>,
    pub booking_type: BookingType,
    pub user_location: Option<GeoPoint>,
    pub address_note: Option<String>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    /// 1-based position among the carwash's bookings for that day. Fixed at creation.
    pub queue_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a booking
///
/// `booking_time` keeps the caller's UTC offset; the same-day window used
/// for queue numbering is computed in that offset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub carwash_id: Uuid,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
    #[serde(default)]
    pub booking_time: Option<DateTime<FixedOffset>>,
    pub booking_type: BookingType,
    #[serde(default)]
    pub user_location: Option<GeoPoint>,
    #[serde(default)]
    pub address_note: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Allow-listed booking edits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingPatch {
    #[serde(default)]
    pub booking_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub address_note: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.booking_time.is_none() && self.notes.is_none() && self.address_note.is_none()
    }
}

/// Request DTO for a status overwrite
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}
