//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  pos-api startup (ApiConfig::load)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Concurrent HTTP requests                                       │
//! │       ▼                                                                 │
//! │  Request 1 ──► uses Conn1 (read)                                       │
//! │  Request 2 ──► uses Conn2 (sale commit transaction)                    │
//! │  Request 3 ──► uses Conn3 (sale commit transaction)                    │
//! │  (SQLite admits one writer at a time; the losing commit sees BUSY,     │
//! │   which surfaces as a conflict instead of a silent overwrite)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writer Contention
//! The pool runs SQLite in WAL mode so the till's reads (lookup, quote,
//! history) never wait on a sale commit. Writers still serialize: a second
//! writer waits up to `busy_timeout` and then fails with SQLITE_BUSY, which
//! [`DbError`](crate::DbError) reports as a conflict.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::shop::ShopRepository;
use crate::repository::shop_stock::ShopStockRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockRepository;
use crate::repository::user::UserRepository;
use crate::workflow::allocation::AllocationWorkflow;
use crate::workflow::checkout::CartWorkflow;
use crate::workflow::pos::PosWorkflow;

// =============================================================================
// Configuration
// =============================================================================

/// Pool and SQLite settings for one database file.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopline/shopline.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections (default 5).
    pub max_connections: u32,
    /// Connections kept open while idle (default 1).
    pub min_connections: u32,
    /// How long a request waits for a free connection (default 30s).
    pub acquire_timeout: Duration,
    /// Idle connections above `min_connections` close after this (default 10m).
    pub idle_timeout: Duration,
    /// How long a writer waits for a competing writer (default 5s).
    pub busy_timeout: Duration,
    /// Apply pending migrations inside [`Database::new`] (default true).
    pub run_migrations: bool,
}

impl DbConfig {
    /// Settings for a file database, created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private in-memory database, migrated and empty. Each pooled
    /// connection to `:memory:` would see its own database, so the pool is
    /// pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(":memory:")
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and workflow access.
///
/// ## Access Layers
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Database (cheap to clone, wraps SqlitePool)                            │
/// │                                                                         │
/// │  Repositories: plain loads and single-row writes                        │
/// │    db.stocks()  db.shops()  db.shop_stock()  db.users()  db.sales()     │
/// │                                                                         │
/// │  Workflows: multi-row writes, one transaction each                      │
/// │    db.pos()          lookup, quote, complete sale, history             │
/// │    db.allocations()  catalog ⇄ shop transfers                          │
/// │    db.carts()        self-service cart and checkout                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn lookup(State(state): State<AppState>, Json(req): Json<CustomerLookupRequest>)
///     -> Result<Json<CustomerLookupResponse>, ApiError>
/// {
///     Ok(Json(state.db.pos().lookup_customer(&req.phone).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file, builds the pool and applies
    /// pending migrations unless `run_migrations` is off.
    ///
    /// Every connection runs with foreign keys on, since the allocation and
    /// cart tables rely on cascades and restricts.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Opening database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max = config.max_connections,
            min = config.min_connections,
            "Connection pool ready"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Needed only when the handle was opened
    /// with `run_migrations(false)`.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a transaction on a pooled connection.
    pub(crate) async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Returns the catalog stock repository.
    pub fn stocks(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Returns the shop repository.
    pub fn shops(&self) -> ShopRepository {
        ShopRepository::new(self.pool.clone())
    }

    /// Returns the shop allocation ledger (read side).
    pub fn shop_stock(&self) -> ShopStockRepository {
        ShopStockRepository::new(self.pool.clone())
    }

    /// Returns the user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Returns the sale ledger repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the POS sale workflow.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let receipt = db.pos().complete_sale(caller, shop_id, request).await?;
    /// ```
    pub fn pos(&self) -> PosWorkflow {
        PosWorkflow::new(self.clone())
    }

    /// Returns the allocation transfer workflow.
    pub fn allocations(&self) -> AllocationWorkflow {
        AllocationWorkflow::new(self.clone())
    }

    /// Returns the shopping cart workflow.
    pub fn carts(&self) -> CartWorkflow {
        CartWorkflow::new(self.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    /// Later calls on any clone of this handle fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// True when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
