//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary, so a
//! deployed server never needs the files on disk.
//!
//! ```text
//! Database::new
//!     │
//!     ▼
//! MIGRATOR.run ──► _sqlx_migrations (version, checksum, applied_on)
//!     │
//!     ├── 001_initial_schema.sql   products, customers, users, discounts,
//!     │                            transactions, suspended_sales, settings
//!     ▼
//! pending files applied in version order, each in its own transaction
//! ```
//!
//! Applied files are checksummed; editing one after release makes startup
//! fail with [`DbError::MigrationFailed`](crate::DbError::MigrationFailed).
//! Schema changes go in a new `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (embedded, before) = migration_status(pool).await?;

    // always run: the migrator also verifies checksums of applied files
    MIGRATOR.run(pool).await?;

    if before < embedded {
        info!(from = before, to = embedded, "Schema migrated");
    } else {
        debug!(embedded, "Schema up to date");
    }
    Ok(())
}

/// `(embedded, applied)`. A database that was never migrated has no
/// bookkeeping table yet and reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let table: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied: i64 = match table {
        Some(_) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(pool)
                .await?
        }
        None => 0,
    };

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
