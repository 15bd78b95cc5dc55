//! # Booking Service
//!
//! The operations UI and CLI layers call. Each one takes the caller
//! explicitly, re-checks role and ownership, and talks to the store through
//! the `BookingStore` port.
//!
//! ## Transition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transition(id, target, caller)                                         │
//! │                                                                         │
//! │  caller? ──none──► AuthenticationRequired                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  store.get_by_id ──none──► NotFound                                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  authorize_transition ──► Forbidden        (before legality, so an      │
//! │     │                                       outsider learns nothing)    │
//! │     ▼                                                                   │
//! │  is_legal(from, to) ──► IllegalTransition                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  store.update_status(id, from, to) ──lost race──► Conflict             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service holds no locks. Concurrent transitions on one booking are
//! settled by the store's compare-and-set.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::error::{EngineError, EngineResult};
use ridebook_core::lifecycle::{self, authorize_delete, authorize_list_all, can_view};
use ridebook_core::validation::{validate_search_query, validate_trip_request};
use ridebook_core::view::{self, StatusFilter, Summary};
use ridebook_core::{
    Booking, BookingStatus, BookingStore, Caller, CoreError, Money, RateCard, StoreError,
    TripRequest, VehicleClass, DEFAULT_UTC_OFFSET_MINUTES,
};

/// Admin dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Figures over every booking, regardless of the filter.
    pub summary: Summary,
    /// Filtered rows, newest first.
    pub bookings: Vec<Booking>,
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    rates: RateCard,
    offset: FixedOffset,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, rates: RateCard, offset: FixedOffset) -> Self {
        BookingService {
            store,
            rates,
            offset,
        }
    }

    /// Standard rate card, pickup times entered in IST.
    pub fn with_defaults(store: Arc<dyn BookingStore>) -> Self {
        let offset =
            FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix());
        Self::new(store, RateCard::STANDARD, offset)
    }

    pub fn rates(&self) -> &RateCard {
        &self.rates
    }

    /// Quotes the fare for a vehicle class name.
    pub fn estimate(&self, vehicle_class: &str) -> EngineResult<Money> {
        let class: VehicleClass = vehicle_class.parse().map_err(EngineError::Core)?;
        Ok(self.rates.estimate(class))
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Creates a `pending` booking owned by the caller.
    ///
    /// Not idempotent: submitting the same request twice creates two bookings.
    pub async fn submit(
        &self,
        caller: Option<&Caller>,
        request: &TripRequest,
    ) -> EngineResult<Booking> {
        let caller = require_caller(caller).inspect_err(|e| log_refusal("submit", e))?;
        debug!(caller_id = %caller.id, vehicle_class = %request.vehicle_class, "submit");

        let now = Utc::now();
        let trip = validate_trip_request(request, self.offset, now)
            .map_err(EngineError::Core)
            .inspect_err(|e| log_refusal("submit", e))?;

        let fare = self.rates.estimate(trip.vehicle_class);
        let new = lifecycle::new_booking(caller, trip, fare, now);

        let id = self
            .store
            .insert(new.clone())
            .await
            .inspect_err(|e| error!(caller_id = %caller.id, error = %e, "Booking insert failed"))?;

        info!(
            booking_id = %id,
            caller_id = %caller.id,
            fare = %fare,
            "Booking submitted"
        );

        Ok(new.into_booking(id))
    }

    /// Moves a booking to `target`.
    ///
    /// ## Errors
    /// Checked in this order: `AuthenticationRequired`, `NotFound`,
    /// `Forbidden`, `IllegalTransition`, then `Conflict` from the store.
    pub async fn transition(
        &self,
        id: &str,
        target: BookingStatus,
        caller: Option<&Caller>,
    ) -> EngineResult<Booking> {
        self.apply_transition(id, target, caller)
            .await
            .inspect_err(|e| log_refusal("transition", e))
    }

    /// Cancel button on the customer dashboard.
    pub async fn cancel(&self, id: &str, caller: Option<&Caller>) -> EngineResult<Booking> {
        self.transition(id, BookingStatus::Cancelled, caller).await
    }

    /// Removes a booking. Admin only.
    pub async fn delete(&self, id: &str, caller: Option<&Caller>) -> EngineResult<()> {
        self.remove(id, caller)
            .await
            .inspect_err(|e| log_refusal("delete", e))
    }

    async fn remove(&self, id: &str, caller: Option<&Caller>) -> EngineResult<()> {
        let caller = require_caller(caller)?;
        authorize_delete(caller)?;

        self.store.delete(id).await.map_err(|err| match err {
            StoreError::NotFound => EngineError::Core(CoreError::BookingNotFound(id.to_string())),
            other => other.into(),
        })?;

        info!(booking_id = %id, caller_id = %caller.id, "Booking deleted");
        Ok(())
    }

    async fn apply_transition(
        &self,
        id: &str,
        target: BookingStatus,
        caller: Option<&Caller>,
    ) -> EngineResult<Booking> {
        let caller = require_caller(caller)?;
        let booking = self.load(id).await?;

        lifecycle::check_transition(&booking, target, caller)?;

        let from = booking.status;
        let updated = self.store.update_status(id, from, target).await?;

        info!(
            booking_id = %id,
            caller_id = %caller.id,
            from = %from,
            to = %target,
            "Booking status changed"
        );

        Ok(updated)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// One booking, visible to its owner and to admins.
    pub async fn get(&self, id: &str, caller: Option<&Caller>) -> EngineResult<Booking> {
        self.load_visible(id, caller)
            .await
            .inspect_err(|e| log_refusal("get", e))
    }

    async fn load_visible(&self, id: &str, caller: Option<&Caller>) -> EngineResult<Booking> {
        let caller = require_caller(caller)?;
        let booking = self.load(id).await?;

        if !can_view(&booking, caller) {
            return Err(CoreError::forbidden(format!("view booking {}", id)).into());
        }
        Ok(booking)
    }

    /// The caller's own bookings, newest first.
    pub async fn list_mine(&self, caller: Option<&Caller>) -> EngineResult<Vec<Booking>> {
        let caller = require_caller(caller).inspect_err(|e| log_refusal("list_mine", e))?;

        let mut bookings = self.store.list_by_owner(&caller.id).await?;
        view::sort_newest_first(&mut bookings);

        debug!(caller_id = %caller.id, count = bookings.len(), "list_mine");
        Ok(bookings)
    }

    /// Every booking in store order. Admin only.
    pub async fn list_all(&self, caller: Option<&Caller>) -> EngineResult<Vec<Booking>> {
        let caller = require_caller(caller)
            .and_then(|c| authorize_list_all(c).map(|_| c).map_err(EngineError::from))
            .inspect_err(|e| log_refusal("list_all", e))?;

        let bookings = self.store.list_all().await?;
        debug!(caller_id = %caller.id, count = bookings.len(), "list_all");
        Ok(bookings)
    }

    /// Admin dashboard: summary over everything plus the filtered rows.
    pub async fn dashboard(
        &self,
        caller: Option<&Caller>,
        filter: StatusFilter,
        search: &str,
    ) -> EngineResult<Dashboard> {
        let search = validate_search_query(search)
            .map_err(CoreError::from)
            .map_err(EngineError::from)
            .inspect_err(|e| log_refusal("dashboard", e))?;

        let mut all = self.list_all(caller).await?;
        let summary = view::summarize(&all);

        view::sort_newest_first(&mut all);
        let bookings: Vec<Booking> = view::filter(&all, filter, &search)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            filter = %filter,
            search = %search,
            shown = bookings.len(),
            total = summary.total_volume,
            "dashboard"
        );

        Ok(Dashboard { summary, bookings })
    }

    async fn load(&self, id: &str) -> EngineResult<Booking> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::BookingNotFound(id.to_string()).into())
    }
}

fn require_caller(caller: Option<&Caller>) -> EngineResult<&Caller> {
    caller.ok_or(EngineError::Core(CoreError::AuthenticationRequired))
}

fn log_refusal(operation: &'static str, err: &EngineError) {
    if err.is_domain_refusal() {
        warn!(operation, code = ?err.code(), error = %err, "Request refused");
    } else {
        error!(operation, error = %err, "Request failed");
    }
}
