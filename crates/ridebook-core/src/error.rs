//! # Error Types
//!
//! Domain-specific error types for ridebook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ridebook-core (this file)                                             │
//! │  ├── CoreError        - Lifecycle / access-control refusals            │
//! │  └── ValidationError  - Trip request field failures                    │
//! │                                                                         │
//! │  ridebook-core::ports                                                  │
//! │  └── StoreError       - What a store collaborator may report           │
//! │                                                                         │
//! │  ridebook-db                                                           │
//! │  └── DbError          - SQLite failures (→ StoreError)                 │
//! │                                                                         │
//! │  ridebook-engine                                                       │
//! │  └── EngineError      - Everything above, plus an ErrorCode            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::BookingStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Booking rule violations.
///
/// Every variant is recoverable: the caller gets the kind back and can show a
/// corrective message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The operation needs a signed-in caller and there is none.
    ///
    /// ## User Workflow
    /// ```text
    /// Guest presses "Confirm Booking"
    ///      │
    ///      ▼
    /// submit(None, request)
    ///      │
    ///      ▼
    /// AuthenticationRequired ──► UI opens the login modal
    /// ```
    #[error("Please sign in to continue")]
    AuthenticationRequired,

    /// The caller lacks the role or ownership for the requested action.
    ///
    /// Raised before any state-machine check so an outsider learns nothing
    /// about the booking's status.
    #[error("Not allowed to {action}")]
    Forbidden { action: String },

    /// The referenced booking does not exist.
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// The requested status edge is not in the transition table.
    #[error("Cannot move booking from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// The vehicle class name is not one of the enumerated classes.
    #[error("Unknown vehicle class: '{0}'")]
    InvalidVehicleClass(String),

    /// A form field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Forbidden error for the given action description.
    pub fn forbidden(action: impl Into<String>) -> Self {
        CoreError::Forbidden {
            action: action.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level problems in a trip request or credentials.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Passwords below the minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Locations and search terms over their bound.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (unparseable date, malformed phone number, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A pickup time that has already passed.
    #[error("{field} must not be in the past")]
    InPast { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// A rate whose fare does not fit in a `Money`.
    #[error("{field} is out of range")]
    OutOfRange { field: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result of a booking rule check.
pub type CoreResult<T> = Result<T, CoreError>;
