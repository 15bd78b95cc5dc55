//! # Session / Role Resolver
//!
//! Caches the current caller `{id, role}` for the process.
//!
//! ## Resolution
//! ```text
//! identity ──► refresh ──► ProfileStore::get_profile(id)
//!                               │
//!                               ├── Ok(Some(p))  → Caller { id, p.role }
//!                               ├── Ok(None)     → Caller { id, user }
//!                               └── Err(_)       → cache cleared,
//!                                                  CollaboratorUnavailable
//! ```
//!
//! Refreshes run one at a time, so the last one to start is the last to
//! publish. A sign-out does not wait: it bumps the epoch, and a lookup still
//! in flight then finds its ticket stale and leaves the cache empty.
//!
//! The resolver only reads. Engine calls take the caller as an argument;
//! nothing in `BookingService` consults this cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::error::{EngineError, EngineResult};
use ridebook_core::{Caller, ProfileStore, Role};

pub struct SessionResolver {
    profiles: Arc<dyn ProfileStore>,
    current: watch::Sender<Option<Caller>>,
    epoch: AtomicU64,
    refreshing: Mutex<()>,
}

impl SessionResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        let (current, _) = watch::channel(None);
        SessionResolver {
            profiles,
            current,
            epoch: AtomicU64::new(0),
            refreshing: Mutex::new(()),
        }
    }

    /// Resolves `identity` to a caller and caches it.
    ///
    /// `None` signs the session out. A failed profile read clears the cache
    /// and returns the error; it is never treated as "no profile".
    pub async fn refresh(&self, identity: Option<&Identity>) -> EngineResult<Option<Caller>> {
        let Some(identity) = identity else {
            self.clear();
            return Ok(None);
        };

        let _turn = self.refreshing.lock().await;
        self.resolve(identity).await
    }

    /// Must be called with `refreshing` held.
    async fn resolve(&self, identity: &Identity) -> EngineResult<Option<Caller>> {
        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        match self.profiles.get_profile(&identity.id).await {
            Ok(profile) => {
                let role = profile.map(|p| p.role).unwrap_or(Role::User);
                let caller = Caller::new(identity.id.clone(), role);

                if self.publish(ticket, Some(caller.clone())) {
                    info!(caller_id = %caller.id, role = %caller.role, "Session resolved");
                } else {
                    debug!(caller_id = %caller.id, "Session cleared during refresh; result dropped");
                }
                Ok(Some(caller))
            }
            Err(err) => {
                warn!(identity_id = %identity.id, error = %err, "Profile lookup failed; session cleared");
                self.publish(ticket, None);
                Err(EngineError::CollaboratorUnavailable(format!(
                    "profile lookup failed: {}",
                    err
                )))
            }
        }
    }

    /// The cached caller, if any.
    pub fn current_caller(&self) -> Option<Caller> {
        self.current.borrow().clone()
    }

    /// Caller changes, current value first.
    pub fn subscribe(&self) -> watch::Receiver<Option<Caller>> {
        self.current.subscribe()
    }

    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.current.send_replace(None);
    }

    /// Writes `value` only if no clear happened after `ticket` was taken.
    fn publish(&self, ticket: u64, value: Option<Caller>) -> bool {
        self.current.send_if_modified(|current| {
            if self.epoch.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Keeps the cache in step with an identity stream until the sender
    /// side is dropped.
    pub fn follow(self: Arc<Self>, mut identities: watch::Receiver<Option<Identity>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                // Read the identity only once it is our turn, so a sign-in
                // resolved meanwhile is never overwritten by an older one
                let turn = self.refreshing.lock().await;
                let identity = identities.borrow_and_update().clone();
                match identity {
                    // Failures are logged inside resolve and leave the cache empty
                    Some(identity) => {
                        let _ = self.resolve(&identity).await;
                    }
                    None => self.clear(),
                }
                drop(turn);

                if identities.changed().await.is_err() {
                    debug!("Identity stream closed; session follower stopping");
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProfileStore;
    use async_trait::async_trait;
    use ridebook_core::{Profile, ProfileFields, StoreError, StoreResult};
    use std::time::Duration;

    struct FailingProfiles;

    #[async_trait]
    impl ProfileStore for FailingProfiles {
        async fn create_profile(&self, _id: &str, _fields: ProfileFields) -> StoreResult<Profile> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn get_profile(&self, _id: &str) -> StoreResult<Option<Profile>> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    /// Delegates to an in-memory store after a delay.
    struct SlowProfiles(InMemoryProfileStore);

    #[async_trait]
    impl ProfileStore for SlowProfiles {
        async fn create_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<Profile> {
            self.0.create_profile(id, fields).await
        }

        async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.get_profile(id).await
        }
    }

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_missing_profile_resolves_to_user() {
        let resolver = SessionResolver::new(Arc::new(InMemoryProfileStore::new()));

        let caller = resolver.refresh(Some(&identity("p-1"))).await.unwrap().unwrap();
        assert_eq!(caller, Caller::user("p-1"));
        assert_eq!(resolver.current_caller(), Some(caller));
    }

    #[tokio::test]
    async fn test_profile_role_is_used() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        profiles
            .create_profile("a-1", ProfileFields::default())
            .await
            .unwrap();
        profiles.set_role("a-1", Role::Admin).await.unwrap();

        let resolver = SessionResolver::new(profiles);
        let caller = resolver.refresh(Some(&identity("a-1"))).await.unwrap().unwrap();
        assert!(caller.is_admin());
    }

    #[tokio::test]
    async fn test_failed_lookup_clears_and_errors() {
        let resolver = SessionResolver::new(Arc::new(FailingProfiles));
        resolver.current.send_replace(Some(Caller::admin("stale")));

        let err = resolver.refresh(Some(&identity("p-1"))).await.unwrap_err();
        assert!(matches!(err, EngineError::CollaboratorUnavailable(_)));
        assert!(resolver.current_caller().is_none());
    }

    #[tokio::test]
    async fn test_stale_refresh_does_not_overwrite() {
        let resolver = SessionResolver::new(Arc::new(InMemoryProfileStore::new()));

        let ticket = resolver.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        resolver.clear();

        assert!(!resolver.publish(ticket, Some(Caller::user("late"))));
        assert!(resolver.current_caller().is_none());
    }

    #[tokio::test]
    async fn test_refresh_alongside_follower_leaves_caller_cached() {
        let resolver = Arc::new(SessionResolver::new(Arc::new(SlowProfiles(
            InMemoryProfileStore::new(),
        ))));
        let (tx, rx) = watch::channel(None);
        let _handle = resolver.clone().follow(rx);

        for round in 0..5 {
            let id = format!("p-{}", round);
            tx.send_replace(Some(identity(&id)));
            let caller = resolver.refresh(Some(&identity(&id))).await.unwrap();

            assert_eq!(caller, Some(Caller::user(id.as_str())));
            assert_eq!(resolver.current_caller(), caller);
        }
    }

    #[tokio::test]
    async fn test_sign_out_clears() {
        let resolver = SessionResolver::new(Arc::new(InMemoryProfileStore::new()));
        let mut rx = resolver.subscribe();

        resolver.refresh(Some(&identity("p-1"))).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        assert!(resolver.refresh(None).await.unwrap().is_none());
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_follow_tracks_identity_stream() {
        let resolver = Arc::new(SessionResolver::new(Arc::new(InMemoryProfileStore::new())));
        let (tx, rx) = watch::channel(None);
        let mut callers = resolver.subscribe();

        let handle = resolver.clone().follow(rx);

        tx.send_replace(Some(identity("p-7")));
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if callers.borrow_and_update().as_ref().map(|c| c.id.as_str()) == Some("p-7") {
                    break;
                }
                callers.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
