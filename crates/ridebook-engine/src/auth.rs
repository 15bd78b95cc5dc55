//! # Authentication
//!
//! The `AuthProvider` seam and an in-process implementation.
//!
//! ## Sign-in Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Email + password                                                      │
//! │    sign_up(email, pw, fields) ──► profile created (role = user)        │
//! │    log_in(email, pw)          ──► argon2 verify                        │
//! │                                                                         │
//! │  Phone + one-time code                                                 │
//! │    request_code(phone) ──► 6-digit code ──► CodeDelivery               │
//! │    confirm_code(id, code) ──► identity keyed by phone (no profile)     │
//! │                                                                         │
//! │  Every sign-in / sign-out publishes on the identity watch channel;     │
//! │  SessionResolver::follow turns that into a Caller.                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ErrorCode;
use ridebook_core::validation::{
    normalize_phone, validate_email, validate_otp_code, validate_password,
};
use ridebook_core::{ProfileFields, ProfileStore, Role, StoreError, ValidationError, OTP_CODE_LEN};

/// How long a phone code stays valid.
const CODE_TTL_MINUTES: i64 = 5;

/// Wrong guesses before a code is burned.
const MAX_CODE_ATTEMPTS: u32 = 5;

// =============================================================================
// Types
// =============================================================================

/// A signed-in identity as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Handle for an outstanding phone verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingVerification {
    pub verification_id: String,
    pub phone: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Incorrect or expired verification code")]
    InvalidCode,

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidCode => {
                ErrorCode::AuthenticationRequired
            }
            AuthError::DuplicateAccount => ErrorCode::Conflict,
            AuthError::Invalid(_) => ErrorCode::InvalidInput,
            AuthError::Unavailable(_) => ErrorCode::CollaboratorUnavailable,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Traits
// =============================================================================

/// The authentication collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates an account, its `user` profile, and signs it in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> AuthResult<Identity>;

    async fn log_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    async fn log_out(&self) -> AuthResult<()>;

    /// Identity changes, current value first.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Starts a phone sign-in and sends the code.
    async fn request_code(&self, phone: &str) -> AuthResult<PendingVerification>;

    /// Completes a phone sign-in.
    async fn confirm_code(&self, verification_id: &str, code: &str) -> AuthResult<Identity>;
}

/// Sends a one-time code to a phone.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, phone: &str, code: &str) -> AuthResult<()>;
}

/// Writes codes to the log. Development only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCodeDelivery;

#[async_trait]
impl CodeDelivery for LogCodeDelivery {
    async fn deliver(&self, phone: &str, code: &str) -> AuthResult<()> {
        info!(phone = %phone, code = %code, "Verification code issued");
        Ok(())
    }
}

// =============================================================================
// Local Provider
// =============================================================================

#[derive(Debug)]
struct Account {
    id: String,
    password_hash: String,
}

#[derive(Debug)]
struct Verification {
    phone: String,
    code: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    verifications: HashMap<String, Verification>,
    /// Stable identity id per phone number.
    phone_ids: HashMap<String, String>,
}

/// In-process `AuthProvider`: argon2 password hashes, phone codes from `rand`.
///
/// Account state lives in memory; profiles go through the `ProfileStore`.
pub struct LocalAuthProvider {
    profiles: Arc<dyn ProfileStore>,
    delivery: Arc<dyn CodeDelivery>,
    state: Mutex<State>,
    identity: watch::Sender<Option<Identity>>,
}

impl LocalAuthProvider {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self::with_delivery(profiles, Arc::new(LogCodeDelivery))
    }

    pub fn with_delivery(profiles: Arc<dyn ProfileStore>, delivery: Arc<dyn CodeDelivery>) -> Self {
        let (identity, _) = watch::channel(None);
        LocalAuthProvider {
            profiles,
            delivery,
            state: Mutex::new(State::default()),
            identity,
        }
    }

    /// The identity currently signed in, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn publish(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> AuthResult<Identity> {
        let email = validate_email(email)?;
        validate_password(password)?;

        let contact_phone = match fields.contact_phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => Some(normalize_phone(phone)?),
            _ => None,
        };

        let password_hash = hash_password(password)?;

        // Held across profile creation so two sign-ups for one email serialize
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&email) {
            warn!(email = %email, "Sign-up rejected: email taken");
            return Err(AuthError::DuplicateAccount);
        }

        let id = Uuid::new_v4().to_string();
        let profile_fields = ProfileFields {
            email: Some(email.clone()),
            role: Role::User,
            display_name: fields
                .display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            contact_phone,
        };

        self.profiles
            .create_profile(&id, profile_fields)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AuthError::DuplicateAccount,
                other => AuthError::Unavailable(other.to_string()),
            })?;

        state.accounts.insert(
            email.clone(),
            Account {
                id: id.clone(),
                password_hash,
            },
        );
        drop(state);

        info!(identity_id = %id, "Account created");

        let identity = Identity {
            id,
            email: Some(email),
            phone: None,
        };
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn log_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let email = validate_email(email)?;

        let (id, password_hash) = {
            let state = self.state.lock().await;
            match state.accounts.get(&email) {
                Some(account) => (account.id.clone(), account.password_hash.clone()),
                None => {
                    debug!(email = %email, "Log-in for unknown email");
                    return Err(AuthError::InvalidCredentials);
                }
            }
        };

        if !verify_password(password, &password_hash) {
            warn!(identity_id = %id, "Log-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(identity_id = %id, "Signed in with password");

        let identity = Identity {
            id,
            email: Some(email),
            phone: None,
        };
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn log_out(&self) -> AuthResult<()> {
        if let Some(identity) = self.current_identity() {
            info!(identity_id = %identity.id, "Signed out");
        }
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn request_code(&self, phone: &str) -> AuthResult<PendingVerification> {
        let phone = normalize_phone(phone)?;
        let code = generate_code();
        let verification_id = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);

        self.delivery.deliver(&phone, &code).await?;

        {
            let mut state = self.state.lock().await;
            let now = Utc::now();
            state.verifications.retain(|_, v| v.expires_at > now);
            state.verifications.insert(
                verification_id.clone(),
                Verification {
                    phone: phone.clone(),
                    code,
                    expires_at,
                    attempts: 0,
                },
            );
        }

        debug!(verification_id = %verification_id, "Verification pending");

        Ok(PendingVerification {
            verification_id,
            phone,
            expires_at,
        })
    }

    async fn confirm_code(&self, verification_id: &str, code: &str) -> AuthResult<Identity> {
        validate_otp_code(code)?;
        let code = code.trim();

        let mut state = self.state.lock().await;

        let verification = state
            .verifications
            .get_mut(verification_id)
            .ok_or(AuthError::InvalidCode)?;

        if verification.expires_at <= Utc::now() {
            state.verifications.remove(verification_id);
            return Err(AuthError::InvalidCode);
        }

        if verification.code != code {
            verification.attempts += 1;
            if verification.attempts >= MAX_CODE_ATTEMPTS {
                warn!(verification_id = %verification_id, "Verification burned after repeated failures");
                state.verifications.remove(verification_id);
            }
            return Err(AuthError::InvalidCode);
        }

        let phone = verification.phone.clone();
        state.verifications.remove(verification_id);

        let id = state
            .phone_ids
            .entry(phone.clone())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        drop(state);

        info!(identity_id = %id, "Signed in with phone code");

        let identity = Identity {
            id,
            email: None,
            phone: Some(phone),
        };
        self.publish(Some(identity.clone()));
        Ok(identity)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Unavailable(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn generate_code() -> String {
    let max = 10u32.pow(OTP_CODE_LEN as u32);
    format!("{:0width$}", rand::thread_rng().gen_range(0..max), width = OTP_CODE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProfileStore;

    /// Captures codes instead of sending them.
    #[derive(Default)]
    struct CapturingDelivery {
        sent: std::sync::Mutex<Vec<(String, String)>>,
    }

    impl CapturingDelivery {
        fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl CodeDelivery for CapturingDelivery {
        async fn deliver(&self, phone: &str, code: &str) -> AuthResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn provider() -> (LocalAuthProvider, Arc<InMemoryProfileStore>, Arc<CapturingDelivery>) {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let delivery = Arc::new(CapturingDelivery::default());
        let auth = LocalAuthProvider::with_delivery(profiles.clone(), delivery.clone());
        (auth, profiles, delivery)
    }

    fn fields() -> ProfileFields {
        ProfileFields {
            email: None,
            role: Role::Admin, // ignored: sign-up always creates users
            display_name: Some(" Asha ".to_string()),
            contact_phone: Some("9876543210".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_profile() {
        let (auth, profiles, _) = provider();
        let identity = auth
            .sign_up("Asha@Example.com", "secret1", fields())
            .await
            .unwrap();

        assert_eq!(identity.email.as_deref(), Some("asha@example.com"));
        let profile = profiles.get_profile(&identity.id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.display_name.as_deref(), Some("Asha"));
        assert_eq!(profile.contact_phone.as_deref(), Some("+919876543210"));
        assert_eq!(auth.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates_and_bad_input() {
        let (auth, _, _) = provider();
        auth.sign_up("asha@example.com", "secret1", ProfileFields::default())
            .await
            .unwrap();

        assert!(matches!(
            auth.sign_up("ASHA@example.com", "secret2", ProfileFields::default())
                .await,
            Err(AuthError::DuplicateAccount)
        ));
        assert!(matches!(
            auth.sign_up("new@example.com", "abc", ProfileFields::default()).await,
            Err(AuthError::Invalid(ValidationError::TooShort { .. }))
        ));
        assert!(matches!(
            auth.sign_up("not-an-email", "secret1", ProfileFields::default()).await,
            Err(AuthError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_log_in_and_out() {
        let (auth, _, _) = provider();
        let created = auth
            .sign_up("asha@example.com", "secret1", ProfileFields::default())
            .await
            .unwrap();
        auth.log_out().await.unwrap();
        assert!(auth.current_identity().is_none());

        assert!(matches!(
            auth.log_in("asha@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.log_in("nobody@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(auth.current_identity().is_none());

        let identity = auth.log_in("asha@example.com", "secret1").await.unwrap();
        assert_eq!(identity.id, created.id);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let (auth, _, _) = provider();
        let mut rx = auth.subscribe();
        assert!(rx.borrow().is_none());

        auth.sign_up("asha@example.com", "secret1", ProfileFields::default())
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        auth.log_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_phone_code_flow() {
        let (auth, profiles, delivery) = provider();

        let pending = auth.request_code("98765 43210").await.unwrap();
        assert_eq!(pending.phone, "+919876543210");
        let code = delivery.last_code();
        assert_eq!(code.len(), OTP_CODE_LEN);

        let identity = auth
            .confirm_code(&pending.verification_id, &code)
            .await
            .unwrap();
        assert_eq!(identity.phone.as_deref(), Some("+919876543210"));
        // Phone sign-in creates no profile
        assert!(profiles.get_profile(&identity.id).await.unwrap().is_none());

        // Code is single-use
        assert!(matches!(
            auth.confirm_code(&pending.verification_id, &code).await,
            Err(AuthError::InvalidCode)
        ));

        // Same phone, same identity
        let again = auth.request_code("+919876543210").await.unwrap();
        let second = auth
            .confirm_code(&again.verification_id, &delivery.last_code())
            .await
            .unwrap();
        assert_eq!(second.id, identity.id);
    }

    #[tokio::test]
    async fn test_wrong_codes_burn_verification() {
        let (auth, _, delivery) = provider();
        let pending = auth.request_code("+14155550100").await.unwrap();
        let real = delivery.last_code();
        let wrong = if real == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_CODE_ATTEMPTS {
            assert!(matches!(
                auth.confirm_code(&pending.verification_id, wrong).await,
                Err(AuthError::InvalidCode)
            ));
        }
        assert!(matches!(
            auth.confirm_code(&pending.verification_id, &real).await,
            Err(AuthError::InvalidCode)
        ));
        assert!(matches!(
            auth.confirm_code(&pending.verification_id, "12ab").await,
            Err(AuthError::Invalid(_))
        ));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }
}
