//! Booking ledger
//!
//! Slot reservations against a carwash. Queue numbers are assigned once, at
//! creation, from the number of bookings already on that local day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use uuid::Uuid;

use super::cars::CarRegistry;
use super::carwashes::{parse_clock, weekday_key};
use super::error::{ServiceError, ServiceResult};
use super::notifications::NotificationService;
use super::validate_point;
use crate::domain::*;
use crate::geo;
use crate::store::{bounded, BookingStore, CarwashStore, StoreError};

const SLOT_TAKEN: &str = "selected time slot is already taken";
const OUT_OF_RANGE: &str = "user is outside the service range for this carwash";

/// Converts a wall-clock time in `offset` to UTC.
pub(crate) fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))))
}

/// `[midnight, midnight + 24h)` of `day` in `offset`, as UTC instants.
pub(crate) fn day_window(day: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_to_utc(day.and_time(NaiveTime::MIN), offset);
    (start, start + chrono::Duration::hours(24))
}

/// The local day containing `at`, in `at`'s own offset.
pub(crate) fn local_day_window(at: &DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    day_window(at.date_naive(), *at.offset())
}

/// The booking's local weekday must have opening hours, and its local HH:MM
/// must fall within them, both ends included.
fn check_open_hours(carwash: &Carwash, at: &DateTime<FixedOffset>) -> ServiceResult<()> {
    let hours = carwash
        .open_hours
        .get(weekday_key(at.weekday()))
        .ok_or_else(|| ServiceError::validation("carwash is not open on this day"))?;

    let local = NaiveTime::from_hms_opt(at.hour(), at.minute(), 0)
        .ok_or_else(|| ServiceError::validation("invalid booking time"))?;
    if local < parse_clock(&hours.start)? || local > parse_clock(&hours.end)? {
        return Err(ServiceError::validation("booking time is outside of open hours"));
    }
    Ok(())
}

fn check_home_service(carwash: &Carwash, user_location: Option<&GeoPoint>) -> ServiceResult<()> {
    if !carwash.home_service {
        return Err(ServiceError::validation("carwash does not offer home service"));
    }
    let in_range = match (carwash.location, user_location) {
        (Some(site), Some(user)) => geo::is_within_service_range(
            user.latitude(),
            user.longitude(),
            site.latitude(),
            site.longitude(),
            carwash.service_range_minutes,
        ),
        _ => false,
    };
    if !in_range {
        return Err(ServiceError::validation(OUT_OF_RANGE));
    }
    Ok(())
}

fn slot_conflict(err: StoreError) -> ServiceError {
    match err {
        StoreError::Duplicate(_) => ServiceError::conflict(SLOT_TAKEN),
        other => other.into(),
    }
}

pub struct BookingLedger {
    bookings: Arc<dyn BookingStore>,
    carwashes: Arc<dyn CarwashStore>,
    cars: Arc<CarRegistry>,
    notifications: Arc<NotificationService>,
    timeout: Duration,
}

impl BookingLedger {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        carwashes: Arc<dyn CarwashStore>,
        cars: Arc<CarRegistry>,
        notifications: Arc<NotificationService>,
        timeout: Duration,
    ) -> Self {
        Self {
            bookings,
            carwashes,
            cars,
            notifications,
            timeout,
        }
    }

    pub async fn create(&self, user_id: Uuid, input: CreateBookingRequest) -> ServiceResult<Booking> {
        let booking_time = input
            .booking_time
            .ok_or_else(|| ServiceError::validation("booking_time is required"))?;

        match (input.booking_type, &input.user_location) {
            (BookingType::HomeService, None) => {
                return Err(ServiceError::validation(
                    "user_location is required for home service bookings",
                ));
            }
            (_, Some(point)) => validate_point(point.latitude(), point.longitude())?,
            _ => {}
        }

        let carwash = bounded(self.timeout, self.carwashes.find_carwash(input.carwash_id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Carwash))?;
        if !carwash.is_active {
            return Err(ServiceError::conflict("carwash is not accepting bookings"));
        }
        check_open_hours(&carwash, &booking_time)?;
        if input.booking_type == BookingType::HomeService {
            check_home_service(&carwash, input.user_location.as_ref())?;
        }
        self.cars.get_owned(user_id, input.car_id).await?;

        let (day_start, day_end) = local_day_window(&booking_time);
        let same_day = bounded(
            self.timeout,
            self.bookings.list_bookings_between(carwash.id, day_start, day_end),
        )
        .await?;

        let booking_time = booking_time.with_timezone(&Utc);
        if same_day.iter().any(|b| b.booking_time == booking_time) {
            return Err(ServiceError::conflict(SLOT_TAKEN));
        }

        let queue_number = i32::try_from(same_day.len() + 1)
            .map_err(|_| ServiceError::conflict("no queue positions left for this day"))?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            car_id: input.car_id,
            carwash_id: carwash.id,
            service_ids: input.service_ids,
            booking_time,
            booking_type: input.booking_type,
            user_location: input.user_location,
            address_note: input.address_note,
            notes: input.notes,
            status: BookingStatus::Pending,
            queue_number,
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, self.bookings.insert_booking(&booking))
            .await
            .map_err(slot_conflict)?;

        tracing::info!(
            booking_id = %booking.id,
            carwash_id = %booking.carwash_id,
            queue_number = booking.queue_number,
            "Booking created"
        );

        self.notifications.booking_confirmed(&booking).await;

        Ok(booking)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Booking> {
        bounded(self.timeout, self.bookings.find_booking(id))
            .await?
            .ok_or(ServiceError::NotFound(Entity::Booking))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ServiceResult<Vec<Booking>> {
        Ok(bounded(self.timeout, self.bookings.list_bookings_by_user(user_id)).await?)
    }

    pub async fn list_by_carwash(&self, carwash_id: Uuid) -> ServiceResult<Vec<Booking>> {
        Ok(bounded(self.timeout, self.bookings.list_bookings_by_carwash(carwash_id)).await?)
    }

    /// Bookings on `day` as seen from `offset`, earliest first.
    pub async fn list_by_carwash_and_date(
        &self,
        carwash_id: Uuid,
        day: NaiveDate,
        offset: FixedOffset,
    ) -> ServiceResult<Vec<Booking>> {
        let (start, end) = day_window(day, offset);
        Ok(bounded(
            self.timeout,
            self.bookings.list_bookings_between(carwash_id, start, end),
        )
        .await?)
    }

    /// Overwrites the status. Transitions are not checked.
    pub async fn update_status(&self, id: Uuid, status: &str) -> ServiceResult<Booking> {
        let status: BookingStatus = status.parse().map_err(ServiceError::Validation)?;
        self.set_status(id, status).await
    }

    pub async fn cancel(&self, id: Uuid) -> ServiceResult<Booking> {
        self.set_status(id, BookingStatus::Cancelled).await
    }

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> ServiceResult<Booking> {
        bounded(self.timeout, self.bookings.set_booking_status(id, status, Utc::now())).await?;
        tracing::info!(booking_id = %id, status = %status, "Booking status updated");
        self.get_by_id(id).await
    }

    /// Reschedules or edits notes. The queue number is kept.
    pub async fn update_details(&self, id: Uuid, patch: BookingPatch) -> ServiceResult<Booking> {
        if patch.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }

        bounded(
            self.timeout,
            self.bookings.update_booking_details(
                id,
                patch.booking_time.map(|t| t.with_timezone(&Utc)),
                patch.notes.as_deref(),
                patch.address_note.as_deref(),
                Utc::now(),
            ),
        )
        .await
        .map_err(slot_conflict)?;

        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Harness;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn hours(start: &str, end: &str) -> TimeRange {
        TimeRange {
            start: start.into(),
            end: end.into(),
        }
    }

    #[test]
    fn day_window_uses_the_timestamps_offset() {
        let (start, end) = local_day_window(&at("2024-06-01T00:30:00+02:00"));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 31, 22, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn queue_numbers_count_same_day_bookings() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;

        let first = h.book(carwash.id, at("2024-06-01T09:00:00+01:00")).await.unwrap();
        let second = h.book(carwash.id, at("2024-06-01T10:00:00+01:00")).await.unwrap();
        let next_day = h.book(carwash.id, at("2024-06-02T09:00:00+01:00")).await.unwrap();

        assert_eq!(first.queue_number, 1);
        assert_eq!(second.queue_number, 2);
        assert_eq!(next_day.queue_number, 1);
        assert_eq!(first.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn same_instant_is_rejected() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;

        h.book(carwash.id, at("2024-06-01T09:00:00+01:00")).await.unwrap();

        // Same instant written in another offset
        let err = h.book(carwash.id, at("2024-06-01T08:00:00Z")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == SLOT_TAKEN));
    }

    #[tokio::test]
    async fn queue_number_survives_cancellation() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let bookings = &h.services.bookings;

        let first = h.book(carwash.id, at("2024-06-01T09:00:00Z")).await.unwrap();
        let second = h.book(carwash.id, at("2024-06-01T10:00:00Z")).await.unwrap();

        let cancelled = bookings.cancel(first.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        assert_eq!(bookings.get_by_id(second.id).await.unwrap().queue_number, 2);
        let third = h.book(carwash.id, at("2024-06-01T11:00:00Z")).await.unwrap();
        assert_eq!(third.queue_number, 3);
    }

    #[tokio::test]
    async fn booking_time_is_required() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let (user, car) = h.driver().await;
        let mut request = h.booking_request(car, carwash.id, at("2024-06-01T09:00:00Z"));
        request.booking_time = None;

        let err = h.services.bookings.create(user, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn booking_must_fall_within_open_hours() {
        let h = Harness::new();
        let mut input = h.carwash_input("Suds", Some((6.5, 3.3)));
        input.open_hours.clear();
        input.open_hours.insert("sat".into(), hours("09:00", "11:00"));
        let carwash = h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.unwrap();

        // 2024-06-01 is a Saturday
        let err = h.book(carwash.id, at("2024-06-01T03:00:00+01:00")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "booking time is outside of open hours"));

        let err = h.book(carwash.id, at("2024-06-02T10:00:00+01:00")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "carwash is not open on this day"));

        // Judged in the booking's own offset: 08:30Z is 09:30 in Lagos
        h.book(carwash.id, at("2024-06-01T09:30:00+01:00")).await.unwrap();
        let err = h.book(carwash.id, at("2024-06-01T08:30:00Z")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // Both ends are open
        h.book(carwash.id, at("2024-06-01T09:00:00+01:00")).await.unwrap();
        h.book(carwash.id, at("2024-06-01T11:00:00+01:00")).await.unwrap();
        assert!(h.book(carwash.id, at("2024-06-01T11:01:00+01:00")).await.is_err());
    }

    #[tokio::test]
    async fn home_service_needs_location() {
        let h = Harness::new();
        let mut input = h.carwash_input("Suds", Some((6.5, 3.3)));
        input.home_service = true;
        let carwash = h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.unwrap();
        let (user, car) = h.driver().await;
        let mut request = h.booking_request(car, carwash.id, at("2024-06-01T09:00:00Z"));
        request.booking_type = BookingType::HomeService;

        let err = h.services.bookings.create(user, request.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        request.user_location = Some(GeoPoint::new(6.51, 3.31));
        let booking = h.services.bookings.create(user, request).await.unwrap();
        assert_eq!(booking.booking_type, BookingType::HomeService);
    }

    #[tokio::test]
    async fn home_service_must_be_offered_and_in_range() {
        let h = Harness::new();
        let (user, car) = h.driver().await;
        let home_request = |carwash_id: Uuid, user_location: GeoPoint| {
            let mut request = h.booking_request(car, carwash_id, at("2024-06-01T09:00:00Z"));
            request.booking_type = BookingType::HomeService;
            request.user_location = Some(user_location);
            request
        };

        let on_site_only = h.carwash_at("Suds", 0.0, 0.0).await;
        let err = h
            .services
            .bookings
            .create(user, home_request(on_site_only.id, GeoPoint::new(0.001, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "carwash does not offer home service"));

        let mut input = h.carwash_input("Mobile Suds", Some((0.0, 0.0)));
        input.home_service = true;
        let mobile = h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.unwrap();
        let err = h
            .services
            .bookings
            .create(user, home_request(mobile.id, GeoPoint::new(40.0, 40.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == OUT_OF_RANGE));

        let mut input = h.carwash_input("Nowhere", None);
        input.home_service = true;
        let unlocated = h.services.carwashes.create_carwash(Uuid::new_v4(), input).await.unwrap();
        let err = h
            .services
            .bookings
            .create(user, home_request(unlocated.id, GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == OUT_OF_RANGE));

        assert!(h.services.bookings.list_by_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn car_must_belong_to_the_user() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let (_, someone_elses_car) = h.driver().await;
        let user = Uuid::new_v4();

        let request = h.booking_request(someone_elses_car, carwash.id, at("2024-06-01T09:00:00Z"));
        let err = h.services.bookings.create(user, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));

        let request = h.booking_request(Uuid::new_v4(), carwash.id, at("2024-06-01T09:00:00Z"));
        let err = h.services.bookings.create(user, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Car)));

        assert!(h.services.bookings.list_by_carwash(carwash.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_or_inactive_carwash() {
        let h = Harness::new();
        let err = h.book(Uuid::new_v4(), at("2024-06-01T09:00:00Z")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Carwash)));

        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        h.services.carwashes.set_active(carwash.id, false).await.unwrap();
        let err = h.book(carwash.id, at("2024-06-01T09:00:00Z")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn status_text_is_validated() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let booking = h.book(carwash.id, at("2024-06-01T09:00:00Z")).await.unwrap();

        let err = h.services.bookings.update_status(booking.id, "done").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // No transition rules at this layer
        h.services.bookings.update_status(booking.id, "completed").await.unwrap();
        let back = h.services.bookings.update_status(booking.id, "pending").await.unwrap();
        assert_eq!(back.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn reschedule_checks_collisions() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let bookings = &h.services.bookings;
        let first = h.book(carwash.id, at("2024-06-01T09:00:00Z")).await.unwrap();
        let second = h.book(carwash.id, at("2024-06-01T10:00:00Z")).await.unwrap();

        let patch = BookingPatch {
            booking_time: Some(at("2024-06-01T09:00:00Z")),
            ..Default::default()
        };
        let err = bookings.update_details(second.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let patch = BookingPatch {
            booking_time: Some(at("2024-06-01T12:00:00Z")),
            notes: Some("Please vacuum the boot".into()),
            ..Default::default()
        };
        let moved = bookings.update_details(first.id, patch).await.unwrap();
        assert_eq!(moved.queue_number, 1);
        assert_eq!(moved.notes.as_deref(), Some("Please vacuum the boot"));

        let err = bookings
            .update_details(first.id, BookingPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn list_by_date_respects_offset() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        h.book(carwash.id, at("2024-06-01T23:30:00Z")).await.unwrap();

        let utc = FixedOffset::east_opt(0).unwrap();
        let lagos = FixedOffset::east_opt(3600).unwrap();
        let june_first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let june_second = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        let bookings = &h.services.bookings;
        assert_eq!(bookings.list_by_carwash_and_date(carwash.id, june_first, utc).await.unwrap().len(), 1);
        assert_eq!(bookings.list_by_carwash_and_date(carwash.id, june_first, lagos).await.unwrap().len(), 0);
        assert_eq!(bookings.list_by_carwash_and_date(carwash.id, june_second, lagos).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn creation_sends_confirmation() {
        let h = Harness::new();
        let carwash = h.carwash_at("Suds", 6.5, 3.3).await;
        let (user, car) = h.driver().await;
        h.services
            .bookings
            .create(user, h.booking_request(car, carwash.id, at("2024-06-01T09:00:00Z")))
            .await
            .unwrap();

        let inbox = h.services.notifications.list_for_user(user, None).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Booking);
    }
}
