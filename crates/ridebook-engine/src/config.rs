//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RIDEBOOK_DB_PATH=/data/ridebook.db                                 │
//! │     RIDEBOOK_UTC_OFFSET_MINUTES=330                                    │
//! │     RIDEBOOK_LOG=info,ridebook=debug                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/ridebook/ridebook.toml (Linux)                           │
//! │     ~/Library/Application Support/com.ridebook.ridebook/ (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/ridebook/ridebook.db"   # ":memory:" for a throwaway db
//! max_connections = 5
//!
//! [booking]
//! utc_offset_minutes = 330
//!
//! [rates.premium_large]
//! base = 3500
//! multiplier = 1.3
//!
//! [logging]
//! filter = "info,ridebook=debug,sqlx=warn"
//! ```

use std::path::PathBuf;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::telemetry::DEFAULT_LOG_FILTER;
use ridebook_core::{Money, Multiplier, RateCard, VehicleRate, DEFAULT_UTC_OFFSET_MINUTES};
use ridebook_db::DbConfig;

/// Largest offset any real timezone uses (±14:00).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSettings {
    /// Offset pickup dates and times are entered in.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

fn default_utc_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

impl Default for BookingSettings {
    fn default() -> Self {
        BookingSettings {
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

/// One rate card entry as written in the file (`multiplier` is a factor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub base: i64,
    pub multiplier: f64,
}

impl RateEntry {
    fn from_rate(rate: VehicleRate) -> Self {
        RateEntry {
            base: rate.base.units(),
            multiplier: rate.multiplier.factor(),
        }
    }

    fn to_rate(self, name: &str) -> Result<VehicleRate, ConfigError> {
        let multiplier = Multiplier::from_factor(self.multiplier).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "rates.{}.multiplier must be a non-negative number, got {}",
                name, self.multiplier
            ))
        })?;
        Ok(VehicleRate {
            base: Money::from_units(self.base),
            multiplier,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(default = "default_standard")]
    pub standard: RateEntry,
    #[serde(default = "default_premium_large")]
    pub premium_large: RateEntry,
    #[serde(default = "default_premium_sedan")]
    pub premium_sedan: RateEntry,
}

fn default_standard() -> RateEntry {
    RateEntry::from_rate(RateCard::STANDARD.standard)
}

fn default_premium_large() -> RateEntry {
    RateEntry::from_rate(RateCard::STANDARD.premium_large)
}

fn default_premium_sedan() -> RateEntry {
    RateEntry::from_rate(RateCard::STANDARD.premium_sedan)
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            standard: default_standard(),
            premium_large: default_premium_large(),
            premium_sedan: default_premium_sedan(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub booking: BookingSettings,

    #[serde(default)]
    pub rates: RateSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ridebook.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Settings for an isolated in-memory database.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.database.path = Some(PathBuf::from(":memory:"));
        config
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.booking.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "booking.utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.booking.utc_offset_minutes
            )));
        }

        self.rate_card()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("RIDEBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(offset) = lookup("RIDEBOOK_UTC_OFFSET_MINUTES") {
            if let Ok(minutes) = offset.trim().parse::<i32>() {
                debug!(minutes, "Overriding UTC offset from environment");
                self.booking.utc_offset_minutes = minutes;
            }
        }

        if let Some(filter) = lookup("RIDEBOOK_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ridebook", "ridebook")
            .map(|dirs| dirs.config_dir().join("ridebook.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    /// Configured path, else `<data dir>/ridebook.db`, else `./ridebook.db`.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "ridebook", "ridebook")
            .map(|dirs| dirs.data_dir().join("ridebook.db"))
            .unwrap_or_else(|| PathBuf::from("ridebook.db"))
    }

    pub fn db_config(&self) -> DbConfig {
        let path = self.database_path();
        if path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path).max_connections(self.database.max_connections)
        }
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.booking.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid UTC offset: {} minutes",
                self.booking.utc_offset_minutes
            ))
        })
    }

    /// The configured rates, checked so that every fare fits in `Money`.
    pub fn rate_card(&self) -> Result<RateCard, ConfigError> {
        let card = RateCard {
            standard: self.rates.standard.to_rate("standard")?,
            premium_large: self.rates.premium_large.to_rate("premium_large")?,
            premium_sedan: self.rates.premium_sedan.to_rate("premium_sedan")?,
        };
        card.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(card)
    }
}
