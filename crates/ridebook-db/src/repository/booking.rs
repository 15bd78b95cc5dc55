//! # Booking Repository
//!
//! Database operations for bookings.
//!
//! ## Status Compare-and-Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UPDATE bookings SET status = :new                                     │
//! │  WHERE id = :id AND status = :expected                                 │
//! │  RETURNING ...                                                         │
//! │       │                                                                 │
//! │       ├── row returned      → updated booking                          │
//! │       └── nothing returned  → id exists?  yes → StaleStatus (Conflict) │
//! │                                           no  → NotFound               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two admins confirming and cancelling the same booking at once: exactly one
//! UPDATE matches, the other sees `Conflict`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use ridebook_core::{Booking, BookingStatus, BookingStore, NewBooking, StoreResult};

const BOOKING_COLUMNS: &str = r#"
    id,
    owner_id,
    pickup,
    drop_location,
    scheduled_at,
    vehicle_class,
    fare,
    status,
    created_at
"#;

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Inserts a booking under a fresh UUID and returns the id.
    pub async fn insert(&self, booking: &NewBooking) -> DbResult<String> {
        let id = generate_booking_id();

        debug!(
            id = %id,
            owner_id = %booking.owner_id,
            vehicle_class = %booking.vehicle_class,
            fare = booking.fare.units(),
            "Inserting booking"
        );

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, owner_id, pickup, drop_location, scheduled_at,
                vehicle_class, fare, status, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9
            )
            "#,
        )
        .bind(&id)
        .bind(&booking.owner_id)
        .bind(&booking.pickup)
        .bind(&booking.drop)
        .bind(booking.scheduled_at)
        .bind(booking.vehicle_class)
        .bind(booking.fare)
        .bind(booking.status)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = ?1", BOOKING_COLUMNS);

        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Bookings for one owner, in insertion order.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Booking>> {
        debug!(owner_id = %owner_id, "Listing bookings by owner");

        let sql = format!(
            "SELECT {} FROM bookings WHERE owner_id = ?1 ORDER BY rowid",
            BOOKING_COLUMNS
        );

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    /// All bookings, in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<Booking>> {
        let sql = format!("SELECT {} FROM bookings ORDER BY rowid", BOOKING_COLUMNS);

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = bookings.len(), "Listed all bookings");
        Ok(bookings)
    }

    /// Moves `id` from `expected` to `new` in one statement.
    pub async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        new: BookingStatus,
    ) -> DbResult<Booking> {
        debug!(id = %id, from = %expected, to = %new, "Updating booking status");

        let sql = format!(
            "UPDATE bookings SET status = ?3 WHERE id = ?1 AND status = ?2 RETURNING {}",
            BOOKING_COLUMNS
        );

        let updated = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .bind(expected)
            .bind(new)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(booking) => Ok(booking),
            None if self.exists(id).await? => Err(DbError::stale("Booking", id)),
            None => Err(DbError::not_found("Booking", id)),
        }
    }

    /// Hard-deletes a booking.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting booking");

        let result = sqlx::query("DELETE FROM bookings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    async fn exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Counts total bookings (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn insert(&self, booking: NewBooking) -> StoreResult<String> {
        Ok(BookingRepository::insert(self, &booking).await?)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Booking>> {
        Ok(BookingRepository::get_by_id(self, id).await?)
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Booking>> {
        Ok(BookingRepository::list_by_owner(self, owner_id).await?)
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        Ok(BookingRepository::list_all(self).await?)
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        new: BookingStatus,
    ) -> StoreResult<Booking> {
        Ok(BookingRepository::update_status(self, id, expected, new).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        Ok(BookingRepository::delete(self, id).await?)
    }
}

/// Generates a new booking ID.
pub fn generate_booking_id() -> String {
    Uuid::new_v4().to_string()
}
