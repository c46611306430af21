//! Carwash directory
//!
//! Carwash records, their embedded service menu and proximity search.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::bookings::{day_window, local_to_utc};
use super::error::{ServiceError, ServiceResult};
use super::validate_point;
use crate::domain::*;
use crate::geo;
use crate::store::{bounded, BookingStore, CarwashStore};

const DEFAULT_SERVICE_RANGE_MINUTES: i32 = 30;
const DEFAULT_MAX_CARS_PER_SLOT: i32 = 1;
const SLOT_MINUTES: i64 = 30;

/// Search radii, tried in order. `None` means no radius.
const SEARCH_TIERS: [(SearchTier, Option<f64>); 3] = [
    (SearchTier::Nearby, Some(10.0)),
    (SearchTier::Extended, Some(100.0)),
    (SearchTier::All, None),
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

pub(super) fn weekday_key(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize]
}

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ServiceResult<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(ServiceError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

fn validate_service_range(minutes: i32) -> ServiceResult<()> {
    if !(1..=180).contains(&minutes) {
        return Err(ServiceError::validation(
            "service_range_minutes must be between 1 and 180",
        ));
    }
    Ok(())
}

fn validate_max_cars(max_cars: i32) -> ServiceResult<()> {
    if max_cars < 1 {
        return Err(ServiceError::validation("max_cars_per_slot must be at least 1"));
    }
    Ok(())
}

pub(super) fn parse_clock(value: &str) -> ServiceResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ServiceError::Validation(format!("invalid time '{}', expected HH:MM", value)))
}

fn validate_open_hours(hours: &BTreeMap<String, TimeRange>) -> ServiceResult<()> {
    for (day, range) in hours {
        if !WEEKDAYS.contains(&day.as_str()) {
            return Err(ServiceError::Validation(format!(
                "invalid weekday '{}', expected one of: {}",
                day,
                WEEKDAYS.join(", ")
            )));
        }
        if parse_clock(&range.start)? >= parse_clock(&range.end)? {
            return Err(ServiceError::Validation(format!(
                "opening hours for '{}' must end after they start",
                day
            )));
        }
    }
    Ok(())
}

fn validate_service(input: &ServiceRequest) -> ServiceResult<()> {
    validate_length("service name", &input.name, 2, 50)?;
    if input.price <= Decimal::ZERO {
        return Err(ServiceError::validation("price must be greater than zero"));
    }
    if input.duration_minutes <= 0 {
        return Err(ServiceError::validation("duration_minutes must be greater than zero"));
    }
    Ok(())
}

fn search_message(tier: SearchTier, count: usize) -> String {
    match tier {
        _ if count == 0 => "No carwashes available at this time".to_string(),
        SearchTier::Nearby => format!("Found {} carwashes within 10km of your location", count),
        SearchTier::Extended => format!("Found {} carwashes within 100km of your location", count),
        SearchTier::All => format!("Showing all {} available carwashes", count),
    }
}

pub struct CarwashDirectory {
    carwashes: Arc<dyn CarwashStore>,
    bookings: Arc<dyn BookingStore>,
    timeout: Duration,
}

impl CarwashDirectory {
    pub fn new(carwashes: Arc<dyn CarwashStore>, bookings: Arc<dyn BookingStore>, timeout: Duration) -> Self {
        Self {
            carwashes,
            bookings,
            timeout,
        }
    }

    pub async fn create_carwash(&self, owner_id: Uuid, input: CreateCarwashRequest) -> ServiceResult<Carwash> {
        validate_length("name", &input.name, 2, 100)?;
        validate_length("address", &input.address, 5, 200)?;

        let location = match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) => {
                validate_point(lat, lon)?;
                Some(GeoPoint::new(lat, lon))
            }
            (None, None) => None,
            _ => {
                return Err(ServiceError::validation(
                    "latitude and longitude must be provided together",
                ))
            }
        };

        let service_range_minutes = input
            .service_range_minutes
            .unwrap_or(DEFAULT_SERVICE_RANGE_MINUTES);
        validate_service_range(service_range_minutes)?;

        let max_cars_per_slot = input.max_cars_per_slot.unwrap_or(DEFAULT_MAX_CARS_PER_SLOT);
        validate_max_cars(max_cars_per_slot)?;
        validate_open_hours(&input.open_hours)?;

        let now = Utc::now();
        let carwash = Carwash {
            id: Uuid::new_v4(),
            owner_id,
            name: input.name.trim().to_string(),
            description: input.description,
            address: input.address.trim().to_string(),
            location,
            has_location: location.is_some(),
            service_range_minutes,
            is_active: true,
            home_service: input.home_service,
            max_cars_per_slot,
            open_hours: input.open_hours,
            photo_gallery: Vec::new(),
            services: Vec::new(),
            queue_count: 0,
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.carwashes.insert_carwash(&carwash)).await?;

        tracing::info!(
            carwash_id = %carwash.id,
            owner_id = %owner_id,
            has_location = carwash.has_location,
            "Carwash created"
        );

        Ok(carwash)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Carwash> {
        bounded(self.timeout, self.carwashes.find_carwash(id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Carwash))
    }

    pub async fn list_active(&self) -> ServiceResult<Vec<Carwash>> {
        Ok(bounded(self.timeout, self.carwashes.list_active_carwashes()).await?)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> ServiceResult<Vec<Carwash>> {
        Ok(bounded(self.timeout, self.carwashes.list_carwashes_by_owner(owner_id)).await?)
    }

    /// Merges the provided fields. Location and activation are not patchable here.
    pub async fn update_fields(&self, id: Uuid, patch: CarwashPatch) -> ServiceResult<Carwash> {
        if patch.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        if let Some(name) = &patch.name {
            validate_length("name", name, 2, 100)?;
        }
        if let Some(address) = &patch.address {
            validate_length("address", address, 5, 200)?;
        }
        if let Some(max_cars) = patch.max_cars_per_slot {
            validate_max_cars(max_cars)?;
        }
        if let Some(hours) = &patch.open_hours {
            validate_open_hours(hours)?;
        }

        bounded(self.timeout, self.carwashes.update_carwash(id, &patch, Utc::now())).await?;
        tracing::info!(carwash_id = %id, "Carwash updated");

        self.get_by_id(id).await
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> ServiceResult<Carwash> {
        bounded(self.timeout, self.carwashes.set_carwash_active(id, is_active, Utc::now())).await?;
        tracing::info!(carwash_id = %id, is_active, "Carwash activation changed");
        self.get_by_id(id).await
    }

    pub async fn update_location(&self, id: Uuid, update: LocationUpdate) -> ServiceResult<Carwash> {
        validate_point(update.latitude, update.longitude)?;
        validate_service_range(update.service_range_minutes)?;
        if let Some(address) = &update.address {
            validate_length("address", address, 5, 200)?;
        }

        bounded(
            self.timeout,
            self.carwashes.set_carwash_location(
                id,
                GeoPoint::new(update.latitude, update.longitude),
                update.service_range_minutes,
                update.address.as_deref(),
                Utc::now(),
            ),
        )
        .await?;

        tracing::info!(
            carwash_id = %id,
            latitude = update.latitude,
            longitude = update.longitude,
            "Carwash location updated"
        );

        self.get_by_id(id).await
    }

    pub async fn update_queue_count(&self, id: Uuid, count: i32) -> ServiceResult<Carwash> {
        if count < 0 {
            return Err(ServiceError::validation("queue_count cannot be negative"));
        }
        bounded(self.timeout, self.carwashes.set_queue_count(id, count, Utc::now())).await?;
        self.get_by_id(id).await
    }

    /// Three-tier search: within 10 km, else within 100 km, else everything.
    ///
    /// An empty result is only possible when no active carwash has a location.
    pub async fn find_nearby_for_user(&self, user_lat: f64, user_lon: f64) -> ServiceResult<NearbySearchResult> {
        validate_point(user_lat, user_lon)?;

        let mut hit = None;
        for (tier, radius_km) in SEARCH_TIERS {
            let found = bounded(
                self.timeout,
                self.carwashes.find_located_near(user_lat, user_lon, radius_km),
            )
            .await?;
            if !found.is_empty() || radius_km.is_none() {
                hit = Some((tier, found));
                break;
            }
        }
        let (tier, found) = hit.unwrap_or((SearchTier::All, Vec::new()));

        let mut carwashes: Vec<NearbyCarwash> = found
            .into_iter()
            .filter_map(|carwash| {
                let (lat, lon) = carwash.location.map(|p| (p.latitude(), p.longitude()))?;
                let distance_km = geo::distance_km(user_lat, user_lon, lat, lon);
                Some(NearbyCarwash {
                    distance_text: geo::distance_text(distance_km),
                    estimated_travel_time_minutes: geo::estimated_travel_minutes(distance_km),
                    is_within_service_range: geo::is_within_service_range(
                        user_lat,
                        user_lon,
                        lat,
                        lon,
                        carwash.service_range_minutes,
                    ),
                    distance_km,
                    carwash,
                })
            })
            .collect();
        // Stable: equal distances keep the store's order.
        carwashes.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let count = carwashes.len();
        tracing::debug!(search_type = %tier, count, "Nearby search finished");

        Ok(NearbySearchResult {
            carwashes,
            search_type: tier,
            user_lat,
            user_lng: user_lon,
            count,
            message: search_message(tier, count),
        })
    }

    /// 30-minute slots inside the opening hours of `date`'s weekday.
    ///
    /// Cancelled bookings do not count towards `current_cars`, but a booking
    /// of any status at the slot's exact start still closes it: new bookings
    /// at that instant collide with it.
    pub async fn available_slots(&self, id: Uuid, date: NaiveDate, offset: FixedOffset) -> ServiceResult<Vec<Slot>> {
        let carwash = self.get_by_id(id).await?;

        let day = weekday_key(date.weekday());
        let hours = carwash
            .open_hours
            .get(day)
            .ok_or_else(|| ServiceError::Validation(format!("carwash is closed on {}", day)))?;
        let opens = date.and_time(parse_clock(&hours.start)?);
        let closes = date.and_time(parse_clock(&hours.end)?);

        let (day_start, day_end) = day_window(date, offset);
        let bookings = bounded(self.timeout, self.bookings.list_bookings_between(id, day_start, day_end)).await?;

        let step = chrono::Duration::minutes(SLOT_MINUTES);
        let mut slots = Vec::new();
        let mut slot_start = opens;
        while slot_start + step <= closes {
            let slot_end = slot_start + step;
            let (utc_start, utc_end) = (local_to_utc(slot_start, offset), local_to_utc(slot_end, offset));
            let current_cars = bookings
                .iter()
                .filter(|b| b.status != BookingStatus::Cancelled)
                .filter(|b| b.booking_time >= utc_start && b.booking_time < utc_end)
                .count() as i32;
            let start_taken = bookings.iter().any(|b| b.booking_time == utc_start);

            slots.push(Slot {
                start_time: utc_start.with_timezone(&offset),
                end_time: utc_end.with_timezone(&offset),
                available: current_cars < carwash.max_cars_per_slot && !start_taken,
                current_cars,
                max_cars: carwash.max_cars_per_slot,
            });
            slot_start = slot_end;
        }

        Ok(slots)
    }

    pub async fn create_service(&self, carwash_id: Uuid, input: ServiceRequest) -> ServiceResult<Service> {
        self.get_by_id(carwash_id).await?;
        validate_service(&input)?;

        let service = Service {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            duration_minutes: input.duration_minutes,
            is_addon: input.is_addon,
            is_active: input.is_active.unwrap_or(true),
        };

        bounded(self.timeout, self.carwashes.push_service(carwash_id, &service, Utc::now())).await?;
        tracing::info!(carwash_id = %carwash_id, service_id = %service.id, "Service added");

        Ok(service)
    }

    pub async fn list_services(&self, carwash_id: Uuid) -> ServiceResult<Vec<Service>> {
        Ok(self.get_by_id(carwash_id).await?.services)
    }

    pub async fn get_service(&self, carwash_id: Uuid, service_id: Uuid) -> ServiceResult<Service> {
        self.get_by_id(carwash_id)
            .await?
            .services
            .into_iter()
            .find(|s| s.id == service_id)
            .ok_or(ServiceError::NotFound(Entity::Service))
    }

    pub async fn update_service(
        &self,
        carwash_id: Uuid,
        service_id: Uuid,
        input: ServiceRequest,
    ) -> ServiceResult<Service> {
        let existing = self.get_service(carwash_id, service_id).await?;
        validate_service(&input)?;

        let service = Service {
            id: service_id,
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            duration_minutes: input.duration_minutes,
            is_addon: input.is_addon,
            is_active: input.is_active.unwrap_or(existing.is_active),
        };

        let replaced = bounded(
            self.timeout,
            self.carwashes.replace_service(carwash_id, &service, Utc::now()),
        )
        .await?;
        if !replaced {
            return Err(ServiceError::NotFound(Entity::Service));
        }

        tracing::info!(carwash_id = %carwash_id, service_id = %service_id, "Service updated");
        Ok(service)
    }

    /// Hard removal from the carwash's menu. Use `update_service` with
    /// `is_active = false` to hide a service instead.
    pub async fn delete_service(&self, carwash_id: Uuid, service_id: Uuid) -> ServiceResult<()> {
        self.get_by_id(carwash_id).await?;

        let removed = bounded(
            self.timeout,
            self.carwashes.remove_service(carwash_id, service_id, Utc::now()),
        )
        .await?;
        if !removed {
            return Err(ServiceError::NotFound(Entity::Service));
        }

        tracing::info!(carwash_id = %carwash_id, service_id = %service_id, "Service deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::services::testing::Harness;

    fn service_request(name: &str, cents: i64) -> ServiceRequest {
        ServiceRequest {
            name: name.to_string(),
            description: None,
            price: Decimal::new(cents, 2),
            duration_minutes: 30,
            is_addon: false,
            is_active: None,
        }
    }

    fn names(result: &NearbySearchResult) -> Vec<&str> {
        result.carwashes.iter().map(|c| c.carwash.name.as_str()).collect()
    }

    #[tokio::test]
    async fn nearby_tier_wins_when_close_results_exist() {
        let h = Harness::new();
        h.carwash_at("Far", 0.45, 0.0).await;
        h.carwash_at("Close", 0.045, 0.0).await;
        h.carwash_at("Closer", 0.01, 0.0).await;

        let result = h.services.carwashes.find_nearby_for_user(0.0, 0.0).await.unwrap();
        assert_eq!(result.search_type, SearchTier::Nearby);
        assert_eq!(names(&result), ["Closer", "Close"]);
        assert_eq!(result.count, 2);
        assert_eq!(result.message, "Found 2 carwashes within 10km of your location");
        assert!(result.carwashes[0].distance_km < result.carwashes[1].distance_km);
    }

    #[tokio::test]
    async fn falls_back_to_extended_then_all() {
        let h = Harness::new();
        h.carwash_at("Fifty", 0.45, 0.0).await;

        let result = h.services.carwashes.find_nearby_for_user(0.0, 0.0).await.unwrap();
        assert_eq!(result.search_type, SearchTier::Extended);
        assert_eq!(result.message, "Found 1 carwashes within 100km of your location");

        let h = Harness::new();
        h.carwash_at("Remote", 4.5, 0.0).await;
        h.carwash_at("Very remote", 9.0, 0.0).await;

        let result = h.services.carwashes.find_nearby_for_user(0.0, 0.0).await.unwrap();
        assert_eq!(result.search_type, SearchTier::All);
        assert_eq!(names(&result), ["Remote", "Very remote"]);
        assert_eq!(result.message, "Showing all 2 available carwashes");
    }

    #[tokio::test]
    async fn empty_directory_is_a_valid_result() {
        let h = Harness::new();
        let hidden = h.carwash_at("Hidden", 0.01, 0.0).await;
        h.services.carwashes.set_active(hidden.id, false).await.unwrap();
        h.services
            .carwashes
            .create_carwash(Uuid::new_v4(), h.carwash_input("Unmapped", None))
            .await
            .unwrap();

        let result = h.services.carwashes.find_nearby_for_user(0.0, 0.0).await.unwrap();
        assert_eq!(result.search_type, SearchTier::All);
        assert_eq!(result.count, 0);
        assert_eq!(result.message, "No carwashes available at this time");
    }

    #[tokio::test]
    async fn rows_are_annotated() {
        let h = Harness::new();
        h.carwash_at("Ten", 0.1, 0.0).await;

        let result = h.services.carwashes.find_nearby_for_user(0.0, 0.0).await.unwrap();
        let row = &result.carwashes[0];
        assert_eq!(result.search_type, SearchTier::Extended);
        assert_eq!(row.estimated_travel_time_minutes, 23);
        assert!(row.is_within_service_range);
        assert_eq!(row.distance_text, "11.1 km away");
        assert_eq!((result.user_lat, result.user_lng), (0.0, 0.0));
    }

    #[tokio::test]
    async fn user_coordinates_are_validated() {
        let h = Harness::new();
        let err = h.services.carwashes.find_nearby_for_user(91.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = h.services.carwashes.find_nearby_for_user(0.0, -181.0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_location_validates_and_makes_searchable() {
        let h = Harness::new();
        let carwash = h
            .services
            .carwashes
            .create_carwash(Uuid::new_v4(), h.carwash_input("Unmapped", None))
            .await
            .unwrap();
        assert!(!carwash.has_location);

        let directory = &h.services.carwashes;
        for (lat, lon, range) in [(90.5, 0.0, 30), (0.0, 180.5, 30), (0.0, 0.0, 0), (0.0, 0.0, 181)] {
            let update = LocationUpdate {
                latitude: lat,
                longitude: lon,
                service_range_minutes: range,
                address: None,
            };
            let err = directory.update_location(carwash.id, update).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        let update = LocationUpdate {
            latitude: 0.02,
            longitude: 0.0,
            service_range_minutes: 45,
            address: Some("12 Marina Road".into()),
        };
        let located = directory.update_location(carwash.id, update).await.unwrap();
        assert!(located.has_location);
        assert_eq!(located.service_range_minutes, 45);
        assert_eq!(located.address, "12 Marina Road");

        let result = directory.find_nearby_for_user(0.0, 0.0).await.unwrap();
        assert_eq!(names(&result), ["Unmapped"]);
    }

    #[tokio::test]
    async fn update_fields_merges_and_stamps() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 0.0, 0.0).await;

        let err = h
            .services
            .carwashes
            .update_fields(carwash.id, CarwashPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let patch = CarwashPatch {
            name: Some("Suds & Shine".into()),
            home_service: Some(true),
            ..Default::default()
        };
        let updated = h.services.carwashes.update_fields(carwash.id, patch).await.unwrap();
        assert_eq!(updated.name, "Suds & Shine");
        assert!(updated.home_service);
        assert_eq!(updated.address, carwash.address);
        assert!(updated.updated_at >= carwash.updated_at);

        let err = h
            .services
            .carwashes
            .update_fields(Uuid::new_v4(), CarwashPatch { home_service: Some(false), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Carwash)));
    }

    #[tokio::test]
    async fn service_not_found_is_distinct_from_carwash_not_found() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 0.0, 0.0).await;
        let directory = &h.services.carwashes;

        let err = directory
            .update_service(Uuid::new_v4(), Uuid::new_v4(), service_request("Wax", 1500))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Carwash)));

        let err = directory
            .update_service(carwash.id, Uuid::new_v4(), service_request("Wax", 1500))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Service)));

        let err = directory.delete_service(carwash.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Service)));

        let err = directory.delete_service(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Carwash)));
    }

    #[tokio::test]
    async fn service_lifecycle() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 0.0, 0.0).await;
        let directory = &h.services.carwashes;

        for bad in [service_request("W", 1500), service_request("Wax", 0)] {
            let err = directory.create_service(carwash.id, bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        let mut zero_duration = service_request("Wax", 1500);
        zero_duration.duration_minutes = 0;
        assert!(directory.create_service(carwash.id, zero_duration).await.is_err());

        let wax = directory.create_service(carwash.id, service_request("Wax", 1500)).await.unwrap();
        let rinse = directory.create_service(carwash.id, service_request("Rinse", 500)).await.unwrap();
        assert!(wax.is_active);

        let mut hidden = service_request("Wax deluxe", 2500);
        hidden.is_active = Some(false);
        let updated = directory.update_service(carwash.id, wax.id, hidden).await.unwrap();
        assert_eq!(updated.id, wax.id);
        assert!(!updated.is_active);
        assert_eq!(directory.get_service(carwash.id, wax.id).await.unwrap().name, "Wax deluxe");

        directory.delete_service(carwash.id, rinse.id).await.unwrap();
        let remaining = directory.list_services(carwash.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, wax.id);
    }

    #[tokio::test]
    async fn queue_count_cannot_go_negative() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 0.0, 0.0).await;
        assert!(h.services.carwashes.update_queue_count(carwash.id, -1).await.is_err());
        let updated = h.services.carwashes.update_queue_count(carwash.id, 4).await.unwrap();
        assert_eq!(updated.queue_count, 4);
    }

    #[tokio::test]
    async fn slots_follow_open_hours_and_bookings() {
        let h = Harness::new();
        let mut input = h.carwash_input("Suds", Some((0.0, 0.0)));
        input.max_cars_per_slot = Some(1);
        // 2024-06-01 is a Saturday
        input.open_hours.clear();
        input.open_hours.insert(
            "sat".into(),
            TimeRange {
                start: "09:00".into(),
                end: "11:00".into(),
            },
        );
        let carwash = h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.unwrap();

        let offset = FixedOffset::east_opt(3600).unwrap();
        let nine_thirty = offset.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let booking = h.book(carwash.id, nine_thirty).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let slots = h.services.carwashes.available_slots(carwash.id, date, offset).await.unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[1].start_time, nine_thirty);
        assert_eq!(slots.iter().map(|s| s.available).collect::<Vec<_>>(), [true, false, true, true]);
        assert_eq!(slots[1].current_cars, 1);

        // A cancelled booking frees its car space but still holds the start instant
        h.services.bookings.cancel(booking.id).await.unwrap();
        let slots = h.services.carwashes.available_slots(carwash.id, date, offset).await.unwrap();
        assert_eq!(slots[1].current_cars, 0);
        assert!(!slots[1].available);
        let err = h.book(carwash.id, slots[1].start_time).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Every slot advertised as available can be booked at its start
        for slot in slots.iter().filter(|s| s.available) {
            h.book(carwash.id, slot.start_time).await.unwrap();
        }

        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let err = h.services.carwashes.available_slots(carwash.id, sunday, offset).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_validates_input() {
        let h = Harness::new();
        let mut input = h.carwash_input("S", None);
        assert!(h.services.carwashes.create_carwash(Uuid::new_v4(), input.clone()).await.is_err());

        input.name = "Suds".into();
        input.latitude = Some(1.0);
        let err = h.services.carwashes.create_carwash(Uuid::new_v4(), input.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        input.latitude = None;
        input.open_hours.insert(
            "funday".into(),
            TimeRange {
                start: "09:00".into(),
                end: "17:00".into(),
            },
        );
        assert!(h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.is_err());
    }

    #[tokio::test]
    async fn owner_listing() {
        let h = Harness::new();
        let owner = Uuid::new_v4();
        let mine = h.services.carwashes.create_carwash(owner, h.carwash_input("Mine", None)).await.unwrap();
        h.carwash_at("Theirs", 0.0, 0.0).await;

        let listed = h.services.carwashes.list_by_owner(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
        assert_eq!(h.services.carwashes.list_active().await.unwrap().len(), 2);
    }

    #[test]
    fn weekday_keys() {
        assert_eq!(weekday_key(Weekday::Mon), "mon");
        assert_eq!(weekday_key(Weekday::Sun), "sun");
    }
}
