//! # ridebook-core: Booking Rules for RideBook
//!
//! Fare estimation, the booking lifecycle, access control and the admin
//! view, as pure functions. Persistence is reached only through the traits
//! in [`ports`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RideBook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web front end / CLI (out of tree)               │   │
//! │  │    Booking form ──► Customer dashboard ──► Admin dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ApiError / DTOs                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ridebook-engine (orchestration)                  │   │
//! │  │    BookingService, SessionResolver, LocalAuthProvider          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ ridebook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   fare    │  │ lifecycle │  │   view    │  │   ports   │  │   │
//! │  │   │ RateCard  │  │ edge()    │  │ summarize │  │ Booking-  │  │   │
//! │  │   │ estimate  │  │ authorize │  │ filter    │  │ Store     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO DATABASE • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ridebook-db (SQLite repositories)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Booking, Profile, Caller and the closed enums
//! - [`money`] - Integer rupees and basis-point multipliers
//! - [`fare`] - Rate card and `estimate`
//! - [`lifecycle`] - Transition table and authorization
//! - [`view`] - Revenue, counts, filtering and ordering
//! - [`validation`] - Trip request and credential checks
//! - [`ports`] - `BookingStore` / `ProfileStore` traits
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ridebook_core::{fare, lifecycle, BookingStatus, VehicleClass};
//!
//! assert_eq!(fare::estimate(VehicleClass::PremiumLarge).units(), 4550);
//! assert!(lifecycle::is_legal(BookingStatus::Pending, BookingStatus::Confirmed));
//! assert!(!lifecycle::is_legal(BookingStatus::Completed, BookingStatus::Pending));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fare;
pub mod lifecycle;
pub mod money;
pub mod ports;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use fare::{RateCard, VehicleRate};
pub use money::{Money, Multiplier};
pub use ports::{BookingStore, ProfileStore, StoreError, StoreResult};
pub use types::*;
pub use view::{StatusBreakdown, StatusFilter, Summary};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted pickup or drop location, in characters.
pub const MAX_LOCATION_LEN: usize = 200;

/// Longest accepted dashboard search term, in characters.
pub const MAX_SEARCH_LEN: usize = 100;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Digits in a phone sign-in code.
pub const OTP_CODE_LEN: usize = 6;

/// Service offset used when none is configured (IST, UTC+05:30).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;
