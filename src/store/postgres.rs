//! PostgreSQL store
//!
//! Text enums are stored as their lowercase names; embedded collections
//! (services, open hours, gallery, locations) live in JSONB columns. Workers
//! are rows of the shared `users` table with `role = 'worker'`.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::*;

const CARWASH_COLUMNS: &str = "id, owner_id, name, description, address, latitude, longitude, \
     has_location, service_range_minutes, is_active, home_service, max_cars_per_slot, \
     open_hours, photo_gallery, services, queue_count, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, user_id, car_id, carwash_id, service_ids, booking_time, \
     booking_type, user_location, address_note, notes, status, queue_number, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, booking_id, user_id, car_id, carwash_id, service_ids, worker_id, \
     status, payment_status, total_amount, queue_number, booking_type, user_location, \
     created_at, updated_at";

const WORKER_COLUMNS: &str = "id, business_id, name, email, phone, job_role, account_status, \
     work_status, active_orders, last_seen, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, user_id, carwash_id, order_id, rating, accuracy, cleanliness, \
     worker_rating, comment, photos, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, user_id, carwash_id, order_id, amount, method, status, \
     transaction_ref, paid_at, created_at, updated_at";

const CAR_COLUMNS: &str = "id, owner_id, model, plate, color, is_default, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, is_read, email_sent, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_text<T>(column: &str, value: &str) -> StoreResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e| StoreError::Database(format!("column {}: {}", column, e)))
}

/// Fails with `NotFound(entity)` when an UPDATE touched no rows.
fn expect_row(rows_affected: u64, entity: Entity) -> StoreResult<()> {
    if rows_affected == 0 {
        Err(StoreError::NotFound(entity))
    } else {
        Ok(())
    }
}

/// Database row for carwash
#[derive(Debug, sqlx::FromRow)]
struct CarwashRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    has_location: bool,
    service_range_minutes: i32,
    is_active: bool,
    home_service: bool,
    max_cars_per_slot: i32,
    open_hours: Json<BTreeMap<String, TimeRange>>,
    photo_gallery: Json<Vec<String>>,
    services: Json<Vec<Service>>,
    queue_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CarwashRow> for Carwash {
    fn from(row: CarwashRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            address: row.address,
            location,
            has_location: row.has_location && location.is_some(),
            service_range_minutes: row.service_range_minutes,
            is_active: row.is_active,
            home_service: row.home_service,
            max_cars_per_slot: row.max_cars_per_slot,
            open_hours: row.open_hours.0,
            photo_gallery: row.photo_gallery.0,
            services: row.services.0,
            queue_count: row.queue_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for booking
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    car_id: Uuid,
    carwash_id: Uuid,
    service_ids: Vec<Uuid>,
    booking_time: DateTime<Utc>,
    booking_type: String,
    user_location: Option<Json<GeoPoint>>,
    address_note: Option<String>,
    notes: Option<String>,
    status: String,
    queue_number: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            car_id: row.car_id,
            carwash_id: row.carwash_id,
            service_ids: row.service_ids,
            booking_time: row.booking_time,
            booking_type: parse_text("booking_type", &row.booking_type)?,
            user_location: row.user_location.map(|l| l.0),
            address_note: row.address_note,
            notes: row.notes,
            status: parse_text("status", &row.status)?,
            queue_number: row.queue_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    booking_id: Option<Uuid>,
    user_id: Uuid,
    car_id: Uuid,
    carwash_id: Uuid,
    service_ids: Vec<Uuid>,
    worker_id: Option<Uuid>,
    status: String,
    payment_status: String,
    total_amount: Decimal,
    queue_number: i32,
    booking_type: Option<String>,
    user_location: Option<Json<GeoPoint>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> StoreResult<Self> {
        let booking_type = match row.booking_type.as_deref() {
            Some(text) => Some(parse_text("booking_type", text)?),
            None => None,
        };
        Ok(Self {
            id: row.id,
            booking_id: row.booking_id,
            user_id: row.user_id,
            car_id: row.car_id,
            carwash_id: row.carwash_id,
            service_ids: row.service_ids,
            worker_id: row.worker_id,
            status: parse_text("status", &row.status)?,
            payment_status: parse_text("payment_status", &row.payment_status)?,
            total_amount: row.total_amount,
            queue_number: row.queue_number,
            booking_type,
            user_location: row.user_location.map(|l| l.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for a worker user
#[derive(Debug, sqlx::FromRow)]
struct WorkerRow {
    id: Uuid,
    business_id: Option<Uuid>,
    name: String,
    email: String,
    phone: Option<String>,
    job_role: Option<String>,
    account_status: String,
    work_status: String,
    active_orders: Vec<Uuid>,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkerRow> for Worker {
    type Error = StoreError;

    fn try_from(row: WorkerRow) -> StoreResult<Self> {
        let business_id = row
            .business_id
            .ok_or_else(|| StoreError::Database(format!("worker {} has no business", row.id)))?;
        Ok(Self {
            id: row.id,
            business_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            job_role: row.job_role,
            account_status: parse_text("account_status", &row.account_status)?,
            work_status: parse_text("work_status", &row.work_status)?,
            active_orders: row.active_orders,
            last_seen: row.last_seen,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for review
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    carwash_id: Uuid,
    order_id: Option<Uuid>,
    rating: i32,
    accuracy: i32,
    cleanliness: i32,
    worker_rating: Option<i32>,
    comment: Option<String>,
    photos: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            carwash_id: row.carwash_id,
            order_id: row.order_id,
            rating: row.rating,
            accuracy: row.accuracy,
            cleanliness: row.cleanliness,
            worker_rating: row.worker_rating,
            comment: row.comment,
            photos: row.photos.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for payment
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    carwash_id: Uuid,
    order_id: Uuid,
    amount: Decimal,
    method: String,
    status: String,
    transaction_ref: Option<String>,
    paid_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            carwash_id: row.carwash_id,
            order_id: row.order_id,
            amount: row.amount,
            method: parse_text("method", &row.method)?,
            status: parse_text("status", &row.status)?,
            transaction_ref: row.transaction_ref,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for car
#[derive(Debug, sqlx::FromRow)]
struct CarRow {
    id: Uuid,
    owner_id: Uuid,
    model: String,
    plate: String,
    color: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CarRow> for Car {
    fn from(row: CarRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            model: row.model,
            plate: row.plate,
            color: row.color,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for notification
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    message: String,
    kind: String,
    is_read: bool,
    email_sent: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            kind: parse_text("kind", &row.kind)?,
            is_read: row.is_read,
            email_sent: row.email_sent,
            created_at: row.created_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl PgStore {
    /// Locks the carwash row and hands its service list to `edit`.
    ///
    /// The list is written back only when `edit` returns `true`.
    async fn edit_services<F>(&self, carwash_id: Uuid, now: DateTime<Utc>, edit: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Vec<Service>) -> bool + Send,
    {
        let mut tx = self.pool.begin().await?;

        let services: Option<Json<Vec<Service>>> =
            sqlx::query_scalar("SELECT services FROM carwashes WHERE id = $1 FOR UPDATE")
                .bind(carwash_id)
                .fetch_optional(&mut *tx)
                .await?;
        let mut services = services.ok_or(StoreError::NotFound(Entity::Carwash))?.0;

        if !edit(&mut services) {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE carwashes SET services = $2, updated_at = $3 WHERE id = $1")
            .bind(carwash_id)
            .bind(Json(&services))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}

#[async_trait]
impl CarwashStore for PgStore {
    async fn insert_carwash(&self, carwash: &Carwash) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO carwashes (id, owner_id, name, description, address, latitude, longitude,
                                   has_location, service_range_minutes, is_active, home_service,
                                   max_cars_per_slot, open_hours, photo_gallery, services,
                                   queue_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(carwash.id)
        .bind(carwash.owner_id)
        .bind(&carwash.name)
        .bind(&carwash.description)
        .bind(&carwash.address)
        .bind(carwash.location.map(|l| l.latitude()))
        .bind(carwash.location.map(|l| l.longitude()))
        .bind(carwash.has_location)
        .bind(carwash.service_range_minutes)
        .bind(carwash.is_active)
        .bind(carwash.home_service)
        .bind(carwash.max_cars_per_slot)
        .bind(Json(&carwash.open_hours))
        .bind(Json(&carwash.photo_gallery))
        .bind(Json(&carwash.services))
        .bind(carwash.queue_count)
        .bind(carwash.created_at)
        .bind(carwash.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_carwash(&self, id: Uuid) -> StoreResult<Option<Carwash>> {
        let row = sqlx::query_as::<_, CarwashRow>(&format!(
            "SELECT {} FROM carwashes WHERE id = $1",
            CARWASH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_active_carwashes(&self) -> StoreResult<Vec<Carwash>> {
        let rows = sqlx::query_as::<_, CarwashRow>(&format!(
            "SELECT {} FROM carwashes WHERE is_active ORDER BY created_at DESC",
            CARWASH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_carwashes_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Carwash>> {
        let rows = sqlx::query_as::<_, CarwashRow>(&format!(
            "SELECT {} FROM carwashes WHERE owner_id = $1 ORDER BY created_at DESC",
            CARWASH_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_carwash(&self, id: Uuid, patch: &CarwashPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE carwashes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                address = COALESCE($4, address),
                home_service = COALESCE($5, home_service),
                max_cars_per_slot = COALESCE($6, max_cars_per_slot),
                open_hours = COALESCE($7, open_hours),
                photo_gallery = COALESCE($8, photo_gallery),
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.address)
        .bind(patch.home_service)
        .bind(patch.max_cars_per_slot)
        .bind(patch.open_hours.as_ref().map(Json))
        .bind(patch.photo_gallery.as_ref().map(Json))
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Carwash)
    }

    async fn set_carwash_active(&self, id: Uuid, is_active: bool, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE carwashes SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Carwash)
    }

    async fn set_carwash_location(
        &self,
        id: Uuid,
        location: GeoPoint,
        service_range_minutes: i32,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE carwashes SET
                latitude = $2,
                longitude = $3,
                has_location = TRUE,
                service_range_minutes = $4,
                address = COALESCE($5, address),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(location.latitude())
        .bind(location.longitude())
        .bind(service_range_minutes)
        .bind(address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Carwash)
    }

    async fn set_queue_count(&self, id: Uuid, count: i32, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE carwashes SET queue_count = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(count)
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Carwash)
    }

    async fn find_located_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
    ) -> StoreResult<Vec<Carwash>> {
        // Haversine in SQL so the radius filter and ordering happen in the database.
        let rows = sqlx::query_as::<_, CarwashRow>(&format!(
            r#"
            SELECT {columns} FROM (
                SELECT *,
                       {radius} * 2 * ASIN(SQRT(
                           POWER(SIN(RADIANS(latitude - $1) / 2), 2)
                           + COS(RADIANS($1)) * COS(RADIANS(latitude))
                             * POWER(SIN(RADIANS(longitude - $2) / 2), 2)
                       )) AS distance_km
                FROM carwashes
                WHERE is_active AND has_location
                  AND latitude IS NOT NULL AND longitude IS NOT NULL
            ) ranked
            WHERE $3::DOUBLE PRECISION IS NULL OR distance_km <= $3
            ORDER BY distance_km
            "#,
            columns = CARWASH_COLUMNS,
            radius = crate::geo::EARTH_RADIUS_KM,
        ))
        .bind(latitude)
        .bind(longitude)
        .bind(radius_km)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn push_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<()> {
        let service = service.clone();
        self.edit_services(carwash_id, now, move |services| {
            services.push(service);
            true
        })
        .await
        .map(|_| ())
    }

    async fn replace_service(&self, carwash_id: Uuid, service: &Service, now: DateTime<Utc>) -> StoreResult<bool> {
        let service = service.clone();
        self.edit_services(carwash_id, now, move |services| {
            match services.iter_mut().find(|s| s.id == service.id) {
                Some(existing) => {
                    *existing = service;
                    true
                }
                None => false,
            }
        })
        .await
    }

    async fn remove_service(&self, carwash_id: Uuid, service_id: Uuid, now: DateTime<Utc>) -> StoreResult<bool> {
        self.edit_services(carwash_id, now, move |services| {
            let before = services.len();
            services.retain(|s| s.id != service_id);
            services.len() != before
        })
        .await
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, car_id, carwash_id, service_ids, booking_time,
                                  booking_type, user_location, address_note, notes, status,
                                  queue_number, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.car_id)
        .bind(booking.carwash_id)
        .bind(&booking.service_ids)
        .bind(booking.booking_time)
        .bind(booking.booking_type.as_str())
        .bind(booking.user_location.map(Json))
        .bind(&booking.address_note)
        .bind(&booking.notes)
        .bind(booking.status.as_str())
        .bind(booking.queue_number)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn list_bookings_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE carwash_id = $1 ORDER BY booking_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(carwash_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn list_bookings_between(
        &self,
        carwash_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE carwash_id = $1 AND booking_time >= $2 AND booking_time < $3
            ORDER BY booking_time
            "#,
            BOOKING_COLUMNS
        ))
        .bind(carwash_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn set_booking_status(&self, id: Uuid, status: BookingStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Booking)
    }

    async fn update_booking_details(
        &self,
        id: Uuid,
        booking_time: Option<DateTime<Utc>>,
        notes: Option<&str>,
        address_note: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                booking_time = COALESCE($2, booking_time),
                notes = COALESCE($3, notes),
                address_note = COALESCE($4, address_note),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(booking_time)
        .bind(notes)
        .bind(address_note)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Booking)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, booking_id, user_id, car_id, carwash_id, service_ids, worker_id,
                                status, payment_status, total_amount, queue_number, booking_type,
                                user_location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id)
        .bind(order.booking_id)
        .bind(order.user_id)
        .bind(order.car_id)
        .bind(order.carwash_id)
        .bind(&order.service_ids)
        .bind(order.worker_id)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.total_amount)
        .bind(order.queue_number)
        .bind(order.booking_type.map(|t| t.as_str()))
        .bind(order.user_location.map(Json))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn list_orders_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE carwash_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(carwash_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Order)
    }

    async fn set_order_worker(&self, id: Uuid, worker_id: Option<Uuid>, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET worker_id = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(worker_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Order)
    }

    async fn set_order_payment_status(&self, id: Uuid, status: PaymentStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Order)
    }
}

#[async_trait]
impl WorkerStore for PgStore {
    async fn insert_worker(&self, worker: &Worker) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone, role, business_id, job_role, account_status,
                               work_status, active_orders, last_seen, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'worker', $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(worker.id)
        .bind(&worker.email)
        .bind(&worker.name)
        .bind(&worker.phone)
        .bind(worker.business_id)
        .bind(&worker.job_role)
        .bind(worker.account_status.as_str())
        .bind(worker.work_status.as_str())
        .bind(&worker.active_orders)
        .bind(worker.last_seen)
        .bind(worker.created_at)
        .bind(worker.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_worker(&self, id: Uuid) -> StoreResult<Option<Worker>> {
        let row = sqlx::query_as::<_, WorkerRow>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND role = 'worker'",
            WORKER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Worker::try_from).transpose()
    }

    async fn list_workers_by_business(&self, business_id: Uuid) -> StoreResult<Vec<Worker>> {
        let rows = sqlx::query_as::<_, WorkerRow>(&format!(
            "SELECT {} FROM users WHERE business_id = $1 AND role = 'worker' ORDER BY name",
            WORKER_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn list_available_workers(&self, business_id: Uuid) -> StoreResult<Vec<Worker>> {
        let rows = sqlx::query_as::<_, WorkerRow>(&format!(
            r#"
            SELECT {} FROM users
            WHERE business_id = $1 AND role = 'worker'
              AND account_status = 'active'
              AND work_status = 'online'
              AND cardinality(active_orders) = 0
            ORDER BY name
            "#,
            WORKER_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn update_worker_details(&self, id: Uuid, patch: &WorkerPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                job_role = COALESCE($4, job_role),
                updated_at = $5
            WHERE id = $1 AND role = 'worker'
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.phone)
        .bind(&patch.job_role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Worker)
    }

    async fn set_worker_account_status(&self, id: Uuid, status: AccountStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET account_status = $2, updated_at = $3 WHERE id = $1 AND role = 'worker'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Worker)
    }

    async fn set_worker_work_status(&self, id: Uuid, status: WorkStatus, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET work_status = $2, last_seen = $3, updated_at = $3
            WHERE id = $1 AND role = 'worker'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Worker)
    }

    async fn attach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                active_orders = CASE WHEN $2 = ANY(active_orders) THEN active_orders
                                     ELSE array_append(active_orders, $2) END,
                work_status = 'busy',
                last_seen = $3,
                updated_at = $3
            WHERE id = $1 AND role = 'worker'
            "#,
        )
        .bind(worker_id)
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Worker)
    }

    async fn detach_order(&self, worker_id: Uuid, order_id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                active_orders = array_remove(active_orders, $2),
                work_status = 'online',
                last_seen = $3,
                updated_at = $3
            WHERE id = $1 AND role = 'worker'
            "#,
        )
        .bind(worker_id)
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Worker)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn review_exists(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = $1 AND order_id = $2)",
        )
        .bind(user_id)
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, carwash_id, order_id, rating, accuracy, cleanliness,
                                 worker_rating, comment, photos, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.carwash_id)
        .bind(review.order_id)
        .bind(review.rating)
        .bind(review.accuracy)
        .bind(review.cleanliness)
        .bind(review.worker_rating)
        .bind(&review.comment)
        .bind(Json(&review.photos))
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_reviews_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE carwash_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(carwash_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_review_by_order(&self, order_id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE order_id = $1 LIMIT 1",
            REVIEW_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn average_rating(&self, carwash_id: Uuid) -> StoreResult<Option<f64>> {
        let average: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(rating)::DOUBLE PRECISION FROM reviews WHERE carwash_id = $1",
        )
        .bind(carwash_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }
}

#[async_trait]
impl PaymentStore for PgStore {
    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, carwash_id, order_id, amount, method, status,
                                  transaction_ref, paid_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.carwash_id)
        .bind(payment.order_id)
        .bind(payment.amount)
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_ref)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_payments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE user_id = $1 ORDER BY paid_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn list_payments_by_carwash(&self, carwash_id: Uuid) -> StoreResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE carwash_id = $1 ORDER BY paid_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(carwash_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn find_payment_by_order(&self, order_id: Uuid) -> StoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE order_id = $1 ORDER BY paid_at DESC LIMIT 1",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn total_paid_for_carwash(&self, carwash_id: Uuid) -> StoreResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE carwash_id = $1 AND status = 'paid'",
        )
        .bind(carwash_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[async_trait]
impl CarStore for PgStore {
    async fn insert_car(&self, car: &Car) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if car.is_default {
            sqlx::query("UPDATE cars SET is_default = FALSE WHERE owner_id = $1 AND is_default")
                .bind(car.owner_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO cars (id, owner_id, model, plate, color, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(car.id)
        .bind(car.owner_id)
        .bind(&car.model)
        .bind(&car.plate)
        .bind(&car.color)
        .bind(car.is_default)
        .bind(car.created_at)
        .bind(car.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }

    async fn find_car(&self, id: Uuid) -> StoreResult<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>(&format!("SELECT {} FROM cars WHERE id = $1", CAR_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Car::from))
    }

    async fn list_cars_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>(&format!(
            "SELECT {} FROM cars WHERE owner_id = $1 ORDER BY created_at ASC",
            CAR_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn update_car(&self, id: Uuid, patch: &CarPatch, now: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cars SET
                model = COALESCE($2, model),
                plate = COALESCE($3, plate),
                color = COALESCE($4, color),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.model)
        .bind(&patch.plate)
        .bind(&patch.color)
        .bind(now)
        .execute(&self.pool)
        .await?;

        expect_row(result.rows_affected(), Entity::Car)
    }

    async fn delete_car(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Car)
    }

    async fn set_default_car(&self, owner_id: Uuid, id: Uuid, now: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM cars WHERE id = $1 AND owner_id = $2 FOR UPDATE")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            tx.rollback().await?;
            return Err(StoreError::NotFound(Entity::Car));
        }

        // Two statements: the partial unique index is checked row by row
        sqlx::query(
            "UPDATE cars SET is_default = FALSE, updated_at = $3 WHERE owner_id = $1 AND id <> $2 AND is_default",
        )
        .bind(owner_id)
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE cars SET is_default = TRUE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, is_read, email_sent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .bind(notification.is_read)
        .bind(notification.email_sent)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid, limit: u32) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Notification)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_email_sent(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("UPDATE notifications SET email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        expect_row(result.rows_affected(), Entity::Notification)
    }

    async fn recipient_email(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(email)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
