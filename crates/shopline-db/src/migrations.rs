//! Embedded schema migrations.
//!
//! `migrations/sqlite/NNN_description.sql` files are compiled into the
//! binary and applied in sequence order on startup; `_sqlx_migrations`
//! records what has run. Applied files are checksummed, so schema changes
//! always go in a new file.
//!
//! The initial schema also installs the triggers that keep `sales`
//! append-only.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    if applied >= total {
        info!(total, "Schema up to date");
        return Ok(());
    }

    info!(pending = total - applied, "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!(total, "Migrations applied");
    Ok(())
}

/// `(embedded, applied)` migration counts, as reported by `/health`.
///
/// A database that has never been migrated has no bookkeeping table yet and
/// counts as zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;
    if !has_table {
        return Ok((total, 0));
    }

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((total, applied as usize))
}
