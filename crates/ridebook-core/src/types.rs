//! # Domain Types
//!
//! Core domain types used throughout RideBook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Booking      │   │    Profile      │   │     Caller      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (auth id)   │   │  id             │       │
//! │  │  owner_id       │   │  role           │   │  role           │       │
//! │  │  fare (frozen)  │   │  display_name   │   └─────────────────┘       │
//! │  │  status         │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ BookingStatus   │   │  VehicleClass   │   │      Role       │       │
//! │  │  Pending        │   │  Standard       │   │  User           │       │
//! │  │  Confirmed      │   │  PremiumLarge   │   │  Admin          │       │
//! │  │  Completed      │   │  PremiumSedan   │   └─────────────────┘       │
//! │  │  Cancelled      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A booking's fare is copied from the rate card at submission time. Later
//! rate changes never reach existing bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Booking Status
// =============================================================================

/// The lifecycle status of a booking.
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Submitted by the customer, awaiting an admin.
    #[default]
    Pending,
    /// Accepted by an admin.
    Confirmed,
    /// Trip done.
    Completed,
    /// Withdrawn by the customer or refused by an admin.
    Cancelled,
}

impl BookingStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Returns the wire name (`"pending"`, ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// True for statuses with no outgoing edges.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// True for statuses that count towards revenue.
    pub const fn is_billable(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Completed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("'{}' is not one of pending, confirmed, completed, cancelled", other),
            )
            .into()),
        }
    }
}

// =============================================================================
// Vehicle Class
// =============================================================================

/// The vehicle tier requested for a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleClass {
    /// 4-seat sedan.
    Standard,
    /// 6-seat SUV.
    PremiumLarge,
    /// Premium sedan.
    PremiumSedan,
}

impl VehicleClass {
    /// All classes, cheapest first.
    pub const ALL: [VehicleClass; 3] = [
        VehicleClass::Standard,
        VehicleClass::PremiumLarge,
        VehicleClass::PremiumSedan,
    ];

    /// Returns the canonical wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "standard",
            VehicleClass::PremiumLarge => "premium-large",
            VehicleClass::PremiumSedan => "premium-sedan",
        }
    }

    /// Label shown in the booking form.
    pub const fn display_name(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "Sedan (4 Seats)",
            VehicleClass::PremiumLarge => "SUV (6 Seats)",
            VehicleClass::PremiumSedan => "Premium Sedan",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = CoreError;

    /// Accepts the canonical names plus the booking form's option ids
    /// (`sedan`, `suv`, `premium`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "standard" | "sedan" => Ok(VehicleClass::Standard),
            "premium-large" | "suv" => Ok(VehicleClass::PremiumLarge),
            "premium-sedan" | "premium" => Ok(VehicleClass::PremiumSedan),
            _ => Err(CoreError::InvalidVehicleClass(s.to_string())),
        }
    }
}

// =============================================================================
// Role & Caller
// =============================================================================

/// Account privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("'{}' is not one of user, admin", other),
            )
            .into()),
        }
    }
}

/// The authenticated party behind a request.
///
/// Passed explicitly into every engine call; nothing reads an ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Caller { id: id.into(), role }
    }

    /// Shorthand for a `user`-role caller.
    pub fn user(id: impl Into<String>) -> Self {
        Caller::new(id, Role::User)
    }

    /// Shorthand for an `admin`-role caller.
    pub fn admin(id: impl Into<String>) -> Self {
        Caller::new(id, Role::Admin)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True if this caller created the booking.
    #[inline]
    pub fn owns(&self, booking: &Booking) -> bool {
        self.id == booking.owner_id
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A requested transfer trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Store-assigned identifier (UUID v4).
    pub id: String,

    /// Account that submitted the booking. Never changes.
    pub owner_id: String,

    pub pickup: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "drop_location"))]
    pub drop: String,

    /// Pickup instant.
    #[ts(as = "String")]
    pub scheduled_at: DateTime<Utc>,

    pub vehicle_class: VehicleClass,

    /// Fare at submission time (frozen).
    pub fare: Money,

    pub status: BookingStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A booking that has not been given an id yet.
///
/// This is what the lifecycle engine hands to `BookingStore::insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub owner_id: String,
    pub pickup: String,
    pub drop: String,
    pub scheduled_at: DateTime<Utc>,
    pub vehicle_class: VehicleClass,
    pub fare: Money,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    /// Attaches the store-assigned id.
    pub fn into_booking(self, id: impl Into<String>) -> Booking {
        Booking {
            id: id.into(),
            owner_id: self.owner_id,
            pickup: self.pickup,
            drop: self.drop,
            scheduled_at: self.scheduled_at,
            vehicle_class: self.vehicle_class,
            fare: self.fare,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Raw trip request as entered in the booking form.
///
/// `date` is `YYYY-MM-DD`, `time` is `HH:MM` (seconds optional); both are in
/// the service's local offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub pickup: String,
    pub drop: String,
    pub date: String,
    pub time: String,
    pub vehicle_class: String,
}

/// A trip request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrip {
    pub pickup: String,
    pub drop: String,
    pub scheduled_at: DateTime<Utc>,
    pub vehicle_class: VehicleClass,
}

// =============================================================================
// Profile
// =============================================================================

/// Account profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identity id from the authentication collaborator.
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub display_name: Option<String>,
    pub contact_phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a profile is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub display_name: Option<String>,
    pub contact_phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert_eq!(
            "Canceled".parse::<BookingStatus>().unwrap(),
            BookingStatus::Cancelled
        );
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_terminal_and_billable() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());

        assert!(BookingStatus::Confirmed.is_billable());
        assert!(BookingStatus::Completed.is_billable());
        assert!(!BookingStatus::Pending.is_billable());
        assert!(!BookingStatus::Cancelled.is_billable());
    }

    #[test]
    fn test_vehicle_class_aliases() {
        assert_eq!("standard".parse::<VehicleClass>().unwrap(), VehicleClass::Standard);
        assert_eq!("sedan".parse::<VehicleClass>().unwrap(), VehicleClass::Standard);
        assert_eq!("SUV".parse::<VehicleClass>().unwrap(), VehicleClass::PremiumLarge);
        assert_eq!(
            "premium_sedan".parse::<VehicleClass>().unwrap(),
            VehicleClass::PremiumSedan
        );
        let err = "helicopter".parse::<VehicleClass>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidVehicleClass(ref name) if name == "helicopter"));
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&VehicleClass::PremiumLarge).unwrap(),
            "\"premium-large\""
        );
        assert_eq!(
            serde_json::to_string(&BookingStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_caller_ownership() {
        let now = Utc::now();
        let booking = NewBooking {
            owner_id: "u-1".to_string(),
            pickup: "Haridwar".to_string(),
            drop: "Dehradun Airport".to_string(),
            scheduled_at: now,
            vehicle_class: VehicleClass::Standard,
            fare: Money::from_units(2000),
            status: BookingStatus::Pending,
            created_at: now,
        }
        .into_booking("b-1");

        assert!(Caller::user("u-1").owns(&booking));
        assert!(!Caller::user("u-2").owns(&booking));
        assert!(!Caller::user("u-1").is_admin());
        assert!(Caller::admin("a-1").is_admin());
    }
}
