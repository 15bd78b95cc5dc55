//! # Admin View
//!
//! Aggregates and filters over a snapshot of bookings. Everything here is a
//! pure function: callers fetch from a store, then hand the slice in.
//!
//! ## Dashboard Pipeline
//! ```text
//! list_all() ──► filter(status, search) ──► sort_newest_first ──► table
//!      │
//!      └──────► summarize ──► revenue / pending / volume cards
//! ```
//!
//! Aggregates are computed over the whole snapshot, not the filtered rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{Booking, BookingStatus};

// =============================================================================
// Aggregates
// =============================================================================

/// Sum of fares over confirmed and completed bookings.
pub fn total_revenue(bookings: &[Booking]) -> Money {
    bookings
        .iter()
        .filter(|b| b.status.is_billable())
        .map(|b| b.fare)
        .sum()
}

/// Number of bookings awaiting an admin.
pub fn pending_count(bookings: &[Booking]) -> usize {
    count_status(bookings, BookingStatus::Pending)
}

/// Number of bookings, any status.
#[inline]
pub fn total_volume(bookings: &[Booking]) -> usize {
    bookings.len()
}

fn count_status(bookings: &[Booking], status: BookingStatus) -> usize {
    bookings.iter().filter(|b| b.status == status).count()
}

/// Count per status, in lifecycle order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusBreakdown {
    pub fn get(&self, status: BookingStatus) -> usize {
        match status {
            BookingStatus::Pending => self.pending,
            BookingStatus::Confirmed => self.confirmed,
            BookingStatus::Completed => self.completed,
            BookingStatus::Cancelled => self.cancelled,
        }
    }
}

/// Headline figures for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_revenue: Money,
    pub pending_count: usize,
    pub total_volume: usize,
    pub by_status: StatusBreakdown,
}

/// Computes all dashboard figures in one pass.
pub fn summarize(bookings: &[Booking]) -> Summary {
    let mut summary = Summary::default();

    for booking in bookings {
        summary.total_volume += 1;
        if booking.status.is_billable() {
            summary.total_revenue += booking.fare;
        }
        match booking.status {
            BookingStatus::Pending => summary.by_status.pending += 1,
            BookingStatus::Confirmed => summary.by_status.confirmed += 1,
            BookingStatus::Completed => summary.by_status.completed += 1,
            BookingStatus::Cancelled => summary.by_status.cancelled += 1,
        }
    }
    summary.pending_count = summary.by_status.pending;

    summary
}

// =============================================================================
// Filtering
// =============================================================================

/// Status dropdown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookingStatus),
}

impl StatusFilter {
    #[inline]
    pub fn matches(&self, status: BookingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl From<BookingStatus> for StatusFilter {
    fn from(status: BookingStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

/// Case-insensitive substring match against id, pickup and drop.
///
/// `needle` must already be lowercased; an empty needle matches everything.
fn matches_search(booking: &Booking, needle: &str) -> bool {
    needle.is_empty()
        || booking.id.to_lowercase().contains(needle)
        || booking.pickup.to_lowercase().contains(needle)
        || booking.drop.to_lowercase().contains(needle)
}

/// Bookings matching both the status filter and the search term, in input
/// order.
///
/// A blank or whitespace-only `search` matches everything. Any other term is
/// matched as typed, surrounding spaces included.
pub fn filter<'a>(bookings: &'a [Booking], status: StatusFilter, search: &str) -> Vec<&'a Booking> {
    let needle = if search.trim().is_empty() {
        String::new()
    } else {
        search.to_lowercase()
    };

    bookings
        .iter()
        .filter(|b| status.matches(b.status))
        .filter(|b| matches_search(b, &needle))
        .collect()
}

/// Stable sort, newest `created_at` first. Equal timestamps keep their
/// relative order.
pub fn sort_newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
