//! # Money Module
//!
//! Provides the `Money` type for fares and revenue, and the `Multiplier`
//! used to scale a vehicle class's base rate.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    3500 * 1.3 = 4550.000000000001   (f64)                               │
//! │                                                                         │
//! │  OUR SOLUTION: integer rupees, multipliers in basis points             │
//! │    3500 * 13_000 bps = 45_500_000 / 10_000 = 4550 exactly              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ridebook_core::money::{Money, Multiplier};
//!
//! let base = Money::from_units(3500);
//! let fare = base.scale(Multiplier::from_bps(13_000));
//! assert_eq!(fare.units(), 4550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

/// Basis points in 1.0x.
const BPS_PER_UNIT: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole currency units (rupees).
///
/// Fares are quoted and stored as whole rupees; there is no minor unit in
/// the booking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a basis-point multiplier, rounding half up.
    ///
    /// ## Rounding
    /// Matches `Math.round` on the displayed estimate for non-negative
    /// amounts: 0.5 rounds away from zero.
    ///
    /// Results beyond `i64` saturate; use [`Money::checked_scale`] to detect
    /// that.
    ///
    /// ```rust
    /// use ridebook_core::money::{Money, Multiplier};
    ///
    /// assert_eq!(Money::from_units(5500).scale(Multiplier::from_bps(18_000)).units(), 9900);
    /// assert_eq!(Money::from_units(5).scale(Multiplier::from_bps(5_000)).units(), 3);
    /// ```
    pub fn scale(&self, multiplier: Multiplier) -> Money {
        let rounded = self.scaled(multiplier);
        match i64::try_from(rounded) {
            Ok(units) => Money(units),
            Err(_) if rounded < 0 => Money(i64::MIN),
            Err(_) => Money(i64::MAX),
        }
    }

    /// Like [`Money::scale`], but `None` when the result does not fit.
    pub fn checked_scale(&self, multiplier: Multiplier) -> Option<Money> {
        i64::try_from(self.scaled(multiplier)).ok().map(Money)
    }

    fn scaled(&self, multiplier: Multiplier) -> i128 {
        let raw = self.0 as i128 * multiplier.bps() as i128;
        let half = (BPS_PER_UNIT / 2) as i128;
        if raw >= 0 {
            (raw + half) / BPS_PER_UNIT as i128
        } else {
            (raw - half) / BPS_PER_UNIT as i128
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-₹{}", self.0.unsigned_abs())
        } else {
            write!(f, "₹{}", self.0)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// =============================================================================
// Multiplier
// =============================================================================

/// A price multiplier in basis points.
///
/// 10_000 bps = 1.0x, 13_000 bps = 1.3x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Multiplier(u32);

impl Multiplier {
    /// 1.0x.
    pub const ONE: Multiplier = Multiplier(BPS_PER_UNIT as u32);

    /// Creates a multiplier from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Multiplier(bps)
    }

    /// Creates a multiplier from a decimal factor (config files use `1.3`).
    ///
    /// `None` for negative, non-finite, or out-of-range factors.
    pub fn from_factor(factor: f64) -> Option<Self> {
        let bps = (factor * BPS_PER_UNIT as f64).round();
        if bps.is_finite() && (0.0..=u32::MAX as f64).contains(&bps) {
            Some(Multiplier(bps as u32))
        } else {
            None
        }
    }

    /// Returns the multiplier in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the decimal factor (for display only).
    #[inline]
    pub fn factor(&self) -> f64 {
        self.0 as f64 / BPS_PER_UNIT as f64
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::ONE
    }
}
