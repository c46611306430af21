//! Carwash domain types
//!
//! Carwash locations, their embedded service menu and the shapes returned by
//! proximity search.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// GeoJSON point. Coordinates are stored in `[longitude, latitude]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PointType {
    #[default]
    Point,
}

fn point_type() -> PointType {
    PointType::Point
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            kind: PointType::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }
}

/// Opening window for one weekday, as "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// A service offered by a carwash, embedded in the carwash record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    #[serde(default)]
    pub is_addon: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Carwash entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carwash {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub location: Option<GeoPoint>,
    pub has_location: bool,
    pub service_range_minutes: i32,
    pub is_active: bool,
    pub home_service: bool,
    pub max_cars_per_slot: i32,
    /// Keyed by three-letter lowercase weekday ("mon" .. "sun").
    pub open_hours: BTreeMap<String, TimeRange>,
    pub photo_gallery: Vec<String>,
    pub services: Vec<Service>,
    pub queue_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a carwash
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCarwashRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub service_range_minutes: Option<i32>,
    #[serde(default)]
    pub home_service: bool,
    #[serde(default)]
    pub max_cars_per_slot: Option<i32>,
    #[serde(default)]
    pub open_hours: BTreeMap<String, TimeRange>,
}

/// Allow-listed partial update for a carwash.
///
/// Location and activation have their own operations and are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarwashPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub home_service: Option<bool>,
    #[serde(default)]
    pub max_cars_per_slot: Option<i32>,
    #[serde(default)]
    pub open_hours: Option<BTreeMap<String, TimeRange>>,
    #[serde(default)]
    pub photo_gallery: Option<Vec<String>>,
}

impl CarwashPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.home_service.is_none()
            && self.max_cars_per_slot.is_none()
            && self.open_hours.is_none()
            && self.photo_gallery.is_none()
    }

    /// Applies the provided fields to `carwash` in place.
    pub fn apply_to(&self, carwash: &mut Carwash) {
        if let Some(name) = &self.name {
            carwash.name = name.clone();
        }
        if let Some(description) = &self.description {
            carwash.description = Some(description.clone());
        }
        if let Some(address) = &self.address {
            carwash.address = address.clone();
        }
        if let Some(home_service) = self.home_service {
            carwash.home_service = home_service;
        }
        if let Some(max_cars) = self.max_cars_per_slot {
            carwash.max_cars_per_slot = max_cars;
        }
        if let Some(open_hours) = &self.open_hours {
            carwash.open_hours = open_hours.clone();
        }
        if let Some(gallery) = &self.photo_gallery {
            carwash.photo_gallery = gallery.clone();
        }
    }
}

/// Request DTO for setting a carwash's coordinates and service range
#[derive(Debug, Clone, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub service_range_minutes: i32,
    #[serde(default)]
    pub address: Option<String>,
}

/// Request DTO for creating or replacing a service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    #[serde(default)]
    pub is_addon: bool,
    #[serde(default)]
    pub is_active: Option<bool>,
}

text_enum! {
    /// Which radius tier produced a nearby-search result.
    pub enum SearchTier {
        Nearby => "nearby",
        Extended => "extended",
        All => "all",
    }
}

/// Carwash annotated with its distance from the searching user.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyCarwash {
    #[serde(flatten)]
    pub carwash: Carwash,
    pub distance_km: f64,
    pub distance_text: String,
    pub estimated_travel_time_minutes: i32,
    pub is_within_service_range: bool,
}

/// Result of a tiered proximity search
#[derive(Debug, Clone, Serialize)]
pub struct NearbySearchResult {
    pub carwashes: Vec<NearbyCarwash>,
    pub search_type: SearchTier,
    pub user_lat: f64,
    pub user_lng: f64,
    pub count: usize,
    pub message: String,
}

/// One bookable window of a carwash day
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub available: bool,
    pub current_cars: i32,
    pub max_cars: i32,
}
