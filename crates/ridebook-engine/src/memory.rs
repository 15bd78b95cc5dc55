//! # In-Memory Stores
//!
//! `BookingStore` and `ProfileStore` over mutex-guarded collections. Used by
//! tests and by embedders that don't want SQLite.
//!
//! Status updates check-and-write under one lock acquisition, which gives
//! the same compare-and-set behaviour as the SQLite `WHERE status = ?`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use ridebook_core::{
    Booking, BookingStatus, BookingStore, NewBooking, Profile, ProfileFields, ProfileStore, Role,
    StoreError, StoreResult,
};

/// Bookings kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bookings.lock().await.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: NewBooking) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.bookings.lock().await.push(booking.into_booking(id.clone()));
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Booking>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        Ok(self.bookings.lock().await.clone())
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        new: BookingStatus,
    ) -> StoreResult<Booking> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;

        if booking.status != expected {
            return Err(StoreError::Conflict { id: id.to_string() });
        }

        booking.status = new;
        Ok(booking.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let index = bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;
        bookings.remove(index);
        Ok(())
    }
}

/// Profiles keyed by identity id.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Out-of-band role change, mirroring `ProfileRepository::set_role`.
    pub async fn set_role(&self, id: &str, role: Role) -> StoreResult<()> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles.get_mut(id).ok_or(StoreError::NotFound)?;
        profile.role = role;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn create_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<Profile> {
        let mut profiles = self.profiles.lock().await;

        if profiles.contains_key(id) {
            return Err(StoreError::Duplicate("profiles.id".to_string()));
        }
        if fields.email.is_some() && profiles.values().any(|p| p.email == fields.email) {
            return Err(StoreError::Duplicate("profiles.email".to_string()));
        }

        let profile = Profile {
            id: id.to_string(),
            email: fields.email,
            role: fields.role,
            display_name: fields.display_name,
            contact_phone: fields.contact_phone,
            created_at: Utc::now(),
        };
        profiles.insert(id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.lock().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridebook_core::{Money, VehicleClass};

    fn new_booking(owner: &str) -> NewBooking {
        let now = Utc::now();
        NewBooking {
            owner_id: owner.to_string(),
            pickup: "Haridwar".to_string(),
            drop: "Dehradun Airport".to_string(),
            scheduled_at: now,
            vehicle_class: VehicleClass::Standard,
            fare: Money::from_units(2000),
            status: BookingStatus::Pending,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_booking_store_behaviour() {
        let store = InMemoryBookingStore::new();
        let a = store.insert(new_booking("u-1")).await.unwrap();
        let b = store.insert(new_booking("u-2")).await.unwrap();

        let all: Vec<String> = store.list_all().await.unwrap().into_iter().map(|x| x.id).collect();
        assert_eq!(all, vec![a.clone(), b.clone()]);
        assert_eq!(store.list_by_owner("u-2").await.unwrap().len(), 1);

        store
            .update_status(&a, BookingStatus::Pending, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert!(matches!(
            store
                .update_status(&a, BookingStatus::Pending, BookingStatus::Cancelled)
                .await,
            Err(StoreError::Conflict { .. })
        ));
        assert!(matches!(
            store
                .update_status("nope", BookingStatus::Pending, BookingStatus::Cancelled)
                .await,
            Err(StoreError::NotFound)
        ));

        store.delete(&b).await.unwrap();
        assert!(matches!(store.delete(&b).await, Err(StoreError::NotFound)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_profile_store_behaviour() {
        let store = InMemoryProfileStore::new();
        let fields = ProfileFields {
            email: Some("a@example.com".to_string()),
            ..ProfileFields::default()
        };
        store.create_profile("id-1", fields.clone()).await.unwrap();

        assert!(matches!(
            store.create_profile("id-2", fields).await,
            Err(StoreError::Duplicate(_))
        ));

        store.set_role("id-1", Role::Admin).await.unwrap();
        let profile = store.get_profile("id-1").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(store.get_profile("id-9").await.unwrap().is_none());
    }
}
