//! # Store Ports
//!
//! Traits the lifecycle engine talks to. `ridebook-db` implements them over
//! SQLite; `ridebook-engine::memory` implements them in process.
//!
//! The store is the only arbiter of consistency: the engine takes no locks,
//! and a status change is a single compare-and-set.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Booking, BookingStatus, NewBooking, Profile, ProfileFields};

/// What a store collaborator may report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record does not exist.
    #[error("Record not found")]
    NotFound,

    /// A compare-and-set lost: the record changed since it was read.
    #[error("Booking {id} was modified concurrently")]
    Conflict { id: String },

    /// A unique key is already taken.
    #[error("Record already exists: {0}")]
    Duplicate(String),

    /// The backing store could not be reached or failed internally.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Booking persistence.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persists a new booking and returns its assigned id.
    async fn insert(&self, booking: NewBooking) -> StoreResult<String>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Booking>>;

    /// Bookings owned by `owner_id`, in insertion order.
    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Booking>>;

    /// Every booking, in insertion order.
    async fn list_all(&self) -> StoreResult<Vec<Booking>>;

    /// Sets `status = new` only if the stored status is still `expected`.
    ///
    /// ## Errors
    /// - `NotFound` if the booking is gone
    /// - `Conflict` if its status is no longer `expected`
    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        new: BookingStatus,
    ) -> StoreResult<Booking>;

    /// Removes a booking. `NotFound` if it does not exist.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Account profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Creates the profile for an identity. `Duplicate` if one exists.
    async fn create_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<Profile>;

    /// `Ok(None)` means no profile; `Err` means the lookup itself failed.
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;
}
