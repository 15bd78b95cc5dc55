//! # Booking Lifecycle Rules
//!
//! The status state machine and who may drive it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   submit (owner)                                                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐   admin    ┌───────────┐   admin    ┌───────────┐        │
//! │   │ pending │ ─────────► │ confirmed │ ─────────► │ completed │        │
//! │   └────┬────┘            └─────┬─────┘            └───────────┘        │
//! │        │ owner or admin        │ admin                                  │
//! │        ▼                       ▼                                        │
//! │   ┌──────────────────────────────────┐                                 │
//! │   │            cancelled             │                                 │
//! │   └──────────────────────────────────┘                                 │
//! │                                                                         │
//! │   completed and cancelled are terminal                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check Order
//! 1. Authorization (`Forbidden`)
//! 2. Edge legality (`IllegalTransition`)
//!
//! Authorization goes first so a caller without rights on a booking never
//! learns which edges exist from its current status.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Booking, BookingStatus, Caller, NewBooking, ValidatedTrip};

/// Who may invoke a defined edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Admins only.
    Admin,
    /// The booking's owner, or any admin.
    OwnerOrAdmin,
}

/// Looks up an edge in the transition table.
///
/// Returns `None` for edges that do not exist. The match has no wildcard arm:
/// adding a status without deciding its edges does not compile.
pub const fn edge(from: BookingStatus, to: BookingStatus) -> Option<Permission> {
    use BookingStatus::*;

    match from {
        Pending => match to {
            Confirmed => Some(Permission::Admin),
            Cancelled => Some(Permission::OwnerOrAdmin),
            Pending | Completed => None,
        },
        Confirmed => match to {
            Completed => Some(Permission::Admin),
            Cancelled => Some(Permission::Admin),
            Pending | Confirmed => None,
        },
        Completed => match to {
            Pending | Confirmed | Completed | Cancelled => None,
        },
        Cancelled => match to {
            Pending | Confirmed | Completed | Cancelled => None,
        },
    }
}

/// True if `from → to` is in the transition table.
#[inline]
pub const fn is_legal(from: BookingStatus, to: BookingStatus) -> bool {
    edge(from, to).is_some()
}

/// Checks whether `caller` may attempt moving `booking` to `target`.
///
/// Admins may attempt anything (legality is checked separately). An owner
/// may only take edges marked `OwnerOrAdmin`. Everyone else is refused.
pub fn authorize_transition(
    booking: &Booking,
    target: BookingStatus,
    caller: &Caller,
) -> CoreResult<()> {
    if caller.is_admin() {
        return Ok(());
    }

    let owner_edge = matches!(
        edge(booking.status, target),
        Some(Permission::OwnerOrAdmin)
    );

    if caller.owns(booking) && owner_edge {
        Ok(())
    } else {
        Err(CoreError::forbidden(format!(
            "move booking {} to {}",
            booking.id, target
        )))
    }
}

/// Full transition check: authorization first, then edge legality.
pub fn check_transition(
    booking: &Booking,
    target: BookingStatus,
    caller: &Caller,
) -> CoreResult<()> {
    authorize_transition(booking, target, caller)?;

    if !is_legal(booking.status, target) {
        return Err(CoreError::IllegalTransition {
            from: booking.status,
            to: target,
        });
    }

    Ok(())
}

/// Statuses `caller` could move `booking` to right now.
///
/// Drives which action buttons a dashboard shows.
pub fn available_transitions(booking: &Booking, caller: &Caller) -> Vec<BookingStatus> {
    BookingStatus::ALL
        .into_iter()
        .filter(|target| check_transition(booking, *target, caller).is_ok())
        .collect()
}

/// Only admins may delete.
pub fn authorize_delete(caller: &Caller) -> CoreResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(CoreError::forbidden("delete bookings"))
    }
}

/// Only admins may read the whole collection.
pub fn authorize_list_all(caller: &Caller) -> CoreResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(CoreError::forbidden("view all bookings"))
    }
}

/// A booking is visible to its owner and to admins.
pub fn can_view(booking: &Booking, caller: &Caller) -> bool {
    caller.is_admin() || caller.owns(booking)
}

/// Builds the record `submit` persists: owned by `caller`, `pending`, fare
/// frozen at `fare`.
pub fn new_booking(
    caller: &Caller,
    trip: ValidatedTrip,
    fare: Money,
    now: DateTime<Utc>,
) -> NewBooking {
    NewBooking {
        owner_id: caller.id.clone(),
        pickup: trip.pickup,
        drop: trip.drop,
        scheduled_at: trip.scheduled_at,
        vehicle_class: trip.vehicle_class,
        fare,
        status: BookingStatus::Pending,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleClass;

    const DEFINED: [(BookingStatus, BookingStatus); 4] = [
        (BookingStatus::Pending, BookingStatus::Confirmed),
        (BookingStatus::Confirmed, BookingStatus::Completed),
        (BookingStatus::Pending, BookingStatus::Cancelled),
        (BookingStatus::Confirmed, BookingStatus::Cancelled),
    ];

    fn booking(owner: &str, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: "b-1".to_string(),
            owner_id: owner.to_string(),
            pickup: "Haridwar".to_string(),
            drop: "Dehradun Airport".to_string(),
            scheduled_at: now,
            vehicle_class: VehicleClass::Standard,
            fare: Money::from_units(2000),
            status,
            created_at: now,
        }
    }

    #[test]
    fn test_only_table_edges_are_legal() {
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                assert_eq!(
                    is_legal(from, to),
                    DEFINED.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_admin_gets_illegal_transition_for_undefined_edges() {
        let admin = Caller::admin("a-1");
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let result = check_transition(&booking("u-1", from), to, &admin);
                if DEFINED.contains(&(from, to)) {
                    assert!(result.is_ok(), "{} -> {}", from, to);
                } else {
                    assert!(
                        matches!(result, Err(CoreError::IllegalTransition { .. })),
                        "{} -> {}",
                        from,
                        to
                    );
                }
            }
        }
    }

    #[test]
    fn test_stranger_is_always_forbidden() {
        let stranger = Caller::user("u-2");
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let result = check_transition(&booking("u-1", from), to, &stranger);
                assert!(
                    matches!(result, Err(CoreError::Forbidden { .. })),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_owner_may_only_cancel_pending() {
        let owner = Caller::user("u-1");
        assert!(check_transition(
            &booking("u-1", BookingStatus::Pending),
            BookingStatus::Cancelled,
            &owner
        )
        .is_ok());

        // Legal for admins, not for owners
        assert!(matches!(
            check_transition(
                &booking("u-1", BookingStatus::Pending),
                BookingStatus::Confirmed,
                &owner
            ),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(matches!(
            check_transition(
                &booking("u-1", BookingStatus::Confirmed),
                BookingStatus::Cancelled,
                &owner
            ),
            Err(CoreError::Forbidden { .. })
        ));

        // Illegal edge still reports Forbidden to the owner
        assert!(matches!(
            check_transition(
                &booking("u-1", BookingStatus::Pending),
                BookingStatus::Completed,
                &owner
            ),
            Err(CoreError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_available_transitions() {
        let admin = Caller::admin("a-1");
        let owner = Caller::user("u-1");

        assert_eq!(
            available_transitions(&booking("u-1", BookingStatus::Pending), &admin),
            vec![BookingStatus::Confirmed, BookingStatus::Cancelled]
        );
        assert_eq!(
            available_transitions(&booking("u-1", BookingStatus::Confirmed), &admin),
            vec![BookingStatus::Completed, BookingStatus::Cancelled]
        );
        assert!(available_transitions(&booking("u-1", BookingStatus::Completed), &admin).is_empty());
        assert_eq!(
            available_transitions(&booking("u-1", BookingStatus::Pending), &owner),
            vec![BookingStatus::Cancelled]
        );
        assert!(available_transitions(&booking("u-1", BookingStatus::Pending), &Caller::user("x"))
            .is_empty());
    }

    #[test]
    fn test_admin_only_operations() {
        assert!(authorize_delete(&Caller::admin("a-1")).is_ok());
        assert!(matches!(
            authorize_delete(&Caller::user("u-1")),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(authorize_list_all(&Caller::admin("a-1")).is_ok());
        assert!(authorize_list_all(&Caller::user("u-1")).is_err());
    }

    #[test]
    fn test_visibility() {
        let b = booking("u-1", BookingStatus::Pending);
        assert!(can_view(&b, &Caller::user("u-1")));
        assert!(can_view(&b, &Caller::admin("a-1")));
        assert!(!can_view(&b, &Caller::user("u-2")));
    }

    #[test]
    fn test_new_booking_is_pending_and_owned() {
        let now = Utc::now();
        let trip = ValidatedTrip {
            pickup: "Haridwar".to_string(),
            drop: "Dehradun Airport".to_string(),
            scheduled_at: now,
            vehicle_class: VehicleClass::PremiumLarge,
        };
        let new = new_booking(&Caller::user("u-9"), trip, Money::from_units(4550), now);
        assert_eq!(new.owner_id, "u-9");
        assert_eq!(new.status, BookingStatus::Pending);
        assert_eq!(new.fare.units(), 4550);
        assert_eq!(new.created_at, now);
    }
}
