//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite` are compiled into the binary and
//! applied in filename order; sqlx records each in `_sqlx_migrations`.
//!
//! | File | Adds |
//! |---|---|
//! | `001_initial_schema.sql` | `profiles`, `bookings`, owner/status indexes, immutability trigger |
//!
//! Applied files are never edited. Schema changes get the next number.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever the database has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
