//! # Repository Module
//!
//! SQLite repositories behind the store ports.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BookingService (engine)                                               │
//! │       │                                                                 │
//! │       │  Arc<dyn BookingStore>                                         │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── inherent: DbResult<T>   (SQL + DbError)                           │
//! │  └── impl BookingStore       (DbError → StoreError)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`booking::BookingRepository`] - Booking CRUD and status compare-and-set
//! - [`profile::ProfileRepository`] - Profile lookup, creation, role changes

pub mod booking;
pub mod profile;
