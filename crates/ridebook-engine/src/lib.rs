//! # ridebook-engine: Booking Service for RideBook
//!
//! Wires the core rules to storage, authentication, and the session cache.
//!
//! ## Module Organization
//! ```text
//! ridebook_engine/
//! ├── lib.rs          ◄─── You are here (RideBook::open wiring)
//! ├── booking.rs      ◄─── BookingService: submit / transition / dashboard
//! ├── session.rs      ◄─── SessionResolver: identity → caller cache
//! ├── auth.rs         ◄─── AuthProvider + LocalAuthProvider (argon2, OTP)
//! ├── memory.rs       ◄─── In-process stores
//! ├── config.rs       ◄─── EngineConfig (defaults → TOML → env)
//! ├── telemetry.rs    ◄─── tracing-subscriber setup
//! └── error.rs        ◄─── EngineError, ErrorCode, ApiError
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. EngineConfig::load(path)     defaults, ridebook.toml, RIDEBOOK_*   │
//! │  2. telemetry::init_tracing      RUST_LOG wins over [logging].filter   │
//! │  3. RideBook::open(config)                                             │
//! │       • Database::new            WAL, foreign keys, migrations         │
//! │       • BookingService           rate card + booking offset            │
//! │       • LocalAuthProvider        profiles via ProfileRepository        │
//! │       • SessionResolver::follow  tracks the auth identity stream       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let app = RideBook::open(EngineConfig::load(None)?).await?;
//! let caller = app.log_in("asha@example.com", "secret1").await?;
//! let booking = app.bookings().submit(Some(&caller), &request).await?;
//! ```

pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod memory;
pub mod session;
pub mod telemetry;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

pub use auth::{AuthProvider, Identity, LocalAuthProvider, PendingVerification};
pub use booking::{BookingService, Dashboard};
pub use config::EngineConfig;
pub use error::{ApiError, ConfigError, EngineError, EngineResult, ErrorCode};
pub use session::SessionResolver;

use ridebook_core::{Caller, CoreError, ProfileFields};
use ridebook_db::Database;

/// An opened RideBook instance.
pub struct RideBook {
    config: EngineConfig,
    db: Database,
    bookings: BookingService,
    auth: Arc<LocalAuthProvider>,
    session: Arc<SessionResolver>,
    follower: JoinHandle<()>,
}

impl RideBook {
    /// Connects the database and wires every service.
    ///
    /// Must be called inside a tokio runtime; the session follower is
    /// spawned onto it.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let offset = config.utc_offset()?;

        let db = Database::new(config.db_config()).await?;
        info!(path = ?config.database_path(), "Database ready");

        let bookings = BookingService::new(Arc::new(db.bookings()), config.rate_card()?, offset);

        let profiles = Arc::new(db.profiles());
        let auth = Arc::new(LocalAuthProvider::new(profiles.clone()));
        let session = Arc::new(SessionResolver::new(profiles));
        let follower = session.clone().follow(auth.subscribe());

        info!(utc_offset_minutes = config.booking.utc_offset_minutes, "RideBook opened");

        Ok(RideBook {
            config,
            db,
            bookings,
            auth,
            session,
            follower,
        })
    }

    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    pub fn auth(&self) -> &LocalAuthProvider {
        &self.auth
    }

    pub fn session(&self) -> &SessionResolver {
        &self.session
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_caller(&self) -> Option<Caller> {
        self.session.current_caller()
    }

    // =========================================================================
    // Sign-in helpers
    // =========================================================================
    //
    // Each one awaits role resolution before returning, so the caller handed
    // back is usable immediately and `current_caller` already holds it. The
    // follower resolves the same identity too; refreshes run one at a time,
    // so whichever finishes last publishes the same caller.

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> EngineResult<Caller> {
        let identity = self.auth.sign_up(email, password, fields).await?;
        self.resolve(&identity).await
    }

    pub async fn log_in(&self, email: &str, password: &str) -> EngineResult<Caller> {
        let identity = self.auth.log_in(email, password).await?;
        self.resolve(&identity).await
    }

    pub async fn request_code(&self, phone: &str) -> EngineResult<PendingVerification> {
        Ok(self.auth.request_code(phone).await?)
    }

    pub async fn confirm_code(&self, verification_id: &str, code: &str) -> EngineResult<Caller> {
        let identity = self.auth.confirm_code(verification_id, code).await?;
        self.resolve(&identity).await
    }

    pub async fn log_out(&self) -> EngineResult<()> {
        self.auth.log_out().await?;
        self.session.refresh(None).await?;
        Ok(())
    }

    async fn resolve(&self, identity: &Identity) -> EngineResult<Caller> {
        self.session
            .refresh(Some(identity))
            .await?
            .ok_or(EngineError::Core(CoreError::AuthenticationRequired))
    }

    /// Stops the session follower and closes the pool.
    pub async fn close(self) {
        self.follower.abort();
        self.db.close().await;
        info!("RideBook closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ridebook_core::{BookingStatus, Role, StatusFilter, TripRequest};

    fn request() -> TripRequest {
        let day = (Utc::now() + Duration::days(3))
            .with_timezone(&chrono::FixedOffset::east_opt(330 * 60).unwrap());
        TripRequest {
            pickup: "Haridwar".to_string(),
            drop: "Dehradun Airport".to_string(),
            date: day.format("%Y-%m-%d").to_string(),
            time: "07:15".to_string(),
            vehicle_class: "standard".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_and_book_end_to_end() {
        let app = RideBook::open(EngineConfig::in_memory()).await.unwrap();
        assert!(app.database().health_check().await);

        let asha = app
            .sign_up("asha@example.com", "secret1", ProfileFields::default())
            .await
            .unwrap();
        assert_eq!(asha.role, Role::User);
        assert_eq!(app.current_caller(), Some(asha.clone()));

        let booking = app.bookings().submit(Some(&asha), &request()).await.unwrap();
        assert_eq!(booking.fare.units(), 2000);

        // Promote out-of-band, then sign in again to pick up the role
        app.log_out().await.unwrap();
        assert!(app.current_caller().is_none());

        app.database()
            .profiles()
            .set_role(&asha.id, Role::Admin)
            .await
            .unwrap();
        let admin = app.log_in("asha@example.com", "secret1").await.unwrap();
        assert!(admin.is_admin());
        assert_eq!(app.current_caller(), Some(admin.clone()));

        app.bookings()
            .transition(&booking.id, BookingStatus::Confirmed, Some(&admin))
            .await
            .unwrap();
        let dash = app
            .bookings()
            .dashboard(Some(&admin), StatusFilter::All, "")
            .await
            .unwrap();
        assert_eq!(dash.summary.total_revenue.units(), 2000);

        app.close().await;
    }

    #[tokio::test]
    async fn test_open_rejects_bad_config() {
        let mut config = EngineConfig::in_memory();
        config.booking.utc_offset_minutes = 2000;

        let err = RideBook::open(config).await.err().unwrap();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let app = RideBook::open(EngineConfig::in_memory()).await.unwrap();

        let err = app.log_in("nobody@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthenticationRequired);
        assert!(app.current_caller().is_none());
    }
}
