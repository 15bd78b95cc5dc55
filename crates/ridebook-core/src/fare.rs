//! # Fare Estimator
//!
//! Static fare lookup for the single Haridwar ⇄ Dehradun Airport corridor.
//!
//! ## Formula
//! ```text
//! fare = round(base_rate(class) × multiplier(class))
//!
//!   standard       2000 × 1.0 = 2000
//!   premium-large  3500 × 1.3 = 4550
//!   premium-sedan  5500 × 1.8 = 9900
//! ```
//!
//! Distance never enters the formula: the service runs one fixed route, so a
//! fare depends on the vehicle class alone.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, Multiplier};
use crate::types::VehicleClass;

/// Base rate and multiplier for one vehicle class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VehicleRate {
    pub base: Money,
    pub multiplier: Multiplier,
}

impl VehicleRate {
    pub const fn new(base_units: i64, multiplier_bps: u32) -> Self {
        VehicleRate {
            base: Money::from_units(base_units),
            multiplier: Multiplier::from_bps(multiplier_bps),
        }
    }

    /// `round(base × multiplier)`.
    #[inline]
    pub fn fare(&self) -> Money {
        self.base.scale(self.multiplier)
    }
}

/// The rate table, one entry per vehicle class.
///
/// Replacing the card only affects bookings submitted afterwards; stored
/// fares are snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RateCard {
    pub standard: VehicleRate,
    pub premium_large: VehicleRate,
    pub premium_sedan: VehicleRate,
}

impl RateCard {
    /// Rates quoted on the booking form.
    pub const STANDARD: RateCard = RateCard {
        standard: VehicleRate::new(2000, 10_000),
        premium_large: VehicleRate::new(3500, 13_000),
        premium_sedan: VehicleRate::new(5500, 18_000),
    };

    /// Returns the rate for a class.
    pub const fn rate(&self, class: VehicleClass) -> VehicleRate {
        match class {
            VehicleClass::Standard => self.standard,
            VehicleClass::PremiumLarge => self.premium_large,
            VehicleClass::PremiumSedan => self.premium_sedan,
        }
    }

    /// Fare for a class under this card.
    pub fn estimate(&self, class: VehicleClass) -> Money {
        self.rate(class).fare()
    }

    /// Rejects negative base rates and fares that overflow.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for class in VehicleClass::ALL {
            let rate = self.rate(class);
            if rate.base.is_negative() {
                return Err(ValidationError::Negative {
                    field: format!("rates.{}.base", class),
                });
            }
            if rate.base.checked_scale(rate.multiplier).is_none() {
                return Err(ValidationError::OutOfRange {
                    field: format!("rates.{}", class),
                });
            }
        }
        Ok(())
    }
}

impl Default for RateCard {
    fn default() -> Self {
        RateCard::STANDARD
    }
}

/// Fare for a class under the standard rate card.
pub fn estimate(class: VehicleClass) -> Money {
    RateCard::STANDARD.estimate(class)
}

/// Fare for a class given by name.
///
/// ## Errors
/// `CoreError::InvalidVehicleClass` when the name is not an enumerated class.
pub fn estimate_by_name(class: &str) -> CoreResult<Money> {
    Ok(estimate(class.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_standard_card_fares() {
        assert_eq!(estimate(VehicleClass::Standard).units(), 2000);
        assert_eq!(estimate(VehicleClass::PremiumLarge).units(), 4550);
        assert_eq!(estimate(VehicleClass::PremiumSedan).units(), 9900);
    }

    #[test]
    fn test_estimate_is_deterministic_and_non_negative() {
        for class in VehicleClass::ALL {
            let first = estimate(class);
            assert_eq!(first, estimate(class));
            assert!(!first.is_negative());
        }
    }

    #[test]
    fn test_estimate_by_name() {
        assert_eq!(estimate_by_name("suv").unwrap().units(), 4550);
        assert!(matches!(
            estimate_by_name("rickshaw"),
            Err(CoreError::InvalidVehicleClass(_))
        ));
        assert!(matches!(
            estimate_by_name(""),
            Err(CoreError::InvalidVehicleClass(_))
        ));
    }

    #[test]
    fn test_custom_card() {
        let card = RateCard {
            standard: VehicleRate::new(2500, 10_000),
            ..RateCard::STANDARD
        };
        assert_eq!(card.estimate(VehicleClass::Standard).units(), 2500);
        assert_eq!(card.estimate(VehicleClass::PremiumSedan).units(), 9900);
        assert!(card.validate().is_ok());

        let broken = RateCard {
            premium_large: VehicleRate::new(-1, 10_000),
            ..RateCard::STANDARD
        };
        assert!(broken.validate().is_err());

        let huge = RateCard {
            premium_sedan: VehicleRate::new(i64::MAX / 4 * 3, 18_000),
            ..RateCard::STANDARD
        };
        assert!(matches!(
            huge.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
