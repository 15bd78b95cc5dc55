//! # Profile Repository
//!
//! Account profiles keyed by identity id.
//!
//! Roles are written here and nowhere else: sign-up creates `user` rows, and
//! `set_role` is the out-of-band promotion path (seed tooling, operators).
//! The engine never calls it.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use ridebook_core::{Profile, ProfileFields, ProfileStore, Role, StoreResult};

/// Repository for profile database operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Creates the profile row for an identity.
    pub async fn create(&self, id: &str, fields: &ProfileFields) -> DbResult<Profile> {
        debug!(id = %id, role = %fields.role, "Creating profile");

        let profile = Profile {
            id: id.to_string(),
            email: fields.email.clone(),
            role: fields.role,
            display_name: fields.display_name.clone(),
            contact_phone: fields.contact_phone.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, email, role, display_name, contact_phone, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6
            )
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(profile.role)
        .bind(&profile.display_name)
        .bind(&profile.contact_phone)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Gets a profile by identity id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, role, display_name, contact_phone, created_at
            FROM profiles
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Changes an account's role.
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<()> {
        let result = sqlx::query("UPDATE profiles SET role = ?2 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", id));
        }

        info!(id = %id, role = %role, "Profile role changed");
        Ok(())
    }

    /// Counts profiles (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn create_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<Profile> {
        Ok(self.create(id, &fields).await?)
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.get_by_id(id).await?)
    }
}
