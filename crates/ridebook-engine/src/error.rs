//! # Engine Error Types
//!
//! One error type for every engine operation, plus the serializable form
//! handed to UI layers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in RideBook                               │
//! │                                                                         │
//! │  CoreError ──────┐                                                     │
//! │  StoreError ─────┤                                                     │
//! │  AuthError ──────┼──► EngineError ──► code() ──► ApiError {code, msg}  │
//! │  DbError ────────┤                        │                             │
//! │  ConfigError ────┘                        └─ internals logged, not sent │
//! │                                                                         │
//! │  Front end:                                                             │
//! │    switch (e.code) {                                                    │
//! │      case 'AUTHENTICATION_REQUIRED': openLoginModal(); break;          │
//! │      case 'CONFLICT': reloadAndRetry(); break;                         │
//! │    }                                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::auth::AuthError;
use ridebook_core::{CoreError, StoreError};
use ridebook_db::DbError;

// =============================================================================
// Engine Error
// =============================================================================

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A collaborator answered with a failure the engine cannot interpret as
    /// a domain outcome (profile lookup failed, store unreachable).
    #[error("Service unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl EngineError {
    /// The machine-readable kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(err) => match err {
                CoreError::AuthenticationRequired => ErrorCode::AuthenticationRequired,
                CoreError::Forbidden { .. } => ErrorCode::Forbidden,
                CoreError::BookingNotFound(_) => ErrorCode::NotFound,
                CoreError::IllegalTransition { .. } => ErrorCode::IllegalTransition,
                CoreError::InvalidVehicleClass(_) | CoreError::Validation(_) => {
                    ErrorCode::InvalidInput
                }
            },
            EngineError::Store(err) => match err {
                StoreError::NotFound => ErrorCode::NotFound,
                StoreError::Conflict { .. } | StoreError::Duplicate(_) => ErrorCode::Conflict,
                StoreError::Unavailable(_) => ErrorCode::CollaboratorUnavailable,
            },
            EngineError::Auth(err) => err.code(),
            EngineError::Db(_) => ErrorCode::CollaboratorUnavailable,
            EngineError::Config(_) => ErrorCode::InvalidInput,
            EngineError::CollaboratorUnavailable(_) => ErrorCode::CollaboratorUnavailable,
        }
    }

    /// True for refusals the caller can act on (everything but outages).
    pub fn is_domain_refusal(&self) -> bool {
        self.code() != ErrorCode::CollaboratorUnavailable
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Config Error
// =============================================================================

/// Failures while loading or validating `EngineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// API Error
// =============================================================================

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// try {
///   await api.transition(id, 'confirmed');
/// } catch (e) {
///   switch (e.code) {
///     case 'FORBIDDEN':
///       toast.error('Admins only');
///       break;
///     case 'ILLEGAL_TRANSITION':
///       toast.error(e.message);
///       break;
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No signed-in caller, or credentials rejected (401)
    AuthenticationRequired,

    /// Role or ownership check failed (403)
    Forbidden,

    /// Booking absent (404)
    NotFound,

    /// Validation failure, unknown vehicle class, malformed credentials (400)
    InvalidInput,

    /// Status edge not in the transition table (422)
    IllegalTransition,

    /// Compare-and-set lost, or account already exists (409)
    Conflict,

    /// Store or auth provider unreachable (503)
    CollaboratorUnavailable,
}

/// Serializable error for UI layers.
///
/// ```json
/// {
///   "code": "ILLEGAL_TRANSITION",
///   "message": "Cannot move booking from completed to pending"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

/// Domain refusals pass their message through; outages are logged and
/// replaced with a generic message.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = err.code();

        let message = match &err {
            EngineError::Store(StoreError::Unavailable(detail))
            | EngineError::CollaboratorUnavailable(detail) => {
                tracing::error!(detail = %detail, "Collaborator unavailable");
                "Service temporarily unavailable, please try again".to_string()
            }
            EngineError::Db(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                "Database operation failed".to_string()
            }
            EngineError::Auth(AuthError::Unavailable(detail)) => {
                tracing::error!(detail = %detail, "Auth provider unavailable");
                "Sign-in is temporarily unavailable".to_string()
            }
            EngineError::Store(StoreError::Conflict { .. }) => {
                "This booking was just updated by someone else; reload and try again".to_string()
            }
            EngineError::Store(StoreError::Duplicate(_)) => "Record already exists".to_string(),
            other => other.to_string(),
        };

        ApiError { code, message }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use ridebook_core::{BookingStatus, ValidationError};

    #[test]
    fn test_codes() {
        let cases: Vec<(EngineError, ErrorCode)> = vec![
            (CoreError::AuthenticationRequired.into(), ErrorCode::AuthenticationRequired),
            (CoreError::forbidden("x").into(), ErrorCode::Forbidden),
            (CoreError::BookingNotFound("b".into()).into(), ErrorCode::NotFound),
            (
                CoreError::IllegalTransition {
                    from: BookingStatus::Completed,
                    to: BookingStatus::Pending,
                }
                .into(),
                ErrorCode::IllegalTransition,
            ),
            (CoreError::InvalidVehicleClass("jet".into()).into(), ErrorCode::InvalidInput),
            (
                CoreError::from(ValidationError::Required { field: "pickup".into() }).into(),
                ErrorCode::InvalidInput,
            ),
            (StoreError::Conflict { id: "b".into() }.into(), ErrorCode::Conflict),
            (StoreError::Unavailable("down".into()).into(), ErrorCode::CollaboratorUnavailable),
            (AuthError::InvalidCredentials.into(), ErrorCode::AuthenticationRequired),
            (AuthError::DuplicateAccount.into(), ErrorCode::Conflict),
            (DbError::PoolExhausted.into(), ErrorCode::CollaboratorUnavailable),
        ];

        for (err, code) in cases {
            assert_eq!(err.code(), code, "{}", err);
        }
    }

    #[test]
    fn test_api_error_serialization() {
        let api: ApiError = EngineError::from(CoreError::IllegalTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending,
        })
        .into();

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "ILLEGAL_TRANSITION");
        assert_eq!(json["message"], "Cannot move booking from completed to pending");
    }

    #[test]
    fn test_api_error_hides_internal_details() {
        let api: ApiError =
            EngineError::from(StoreError::Unavailable("disk I/O error at /var/db".into())).into();
        assert_eq!(api.code, ErrorCode::CollaboratorUnavailable);
        assert!(!api.message.contains("/var/db"));
        assert!(!EngineError::from(StoreError::Unavailable("x".into())).is_domain_refusal());
    }
}
