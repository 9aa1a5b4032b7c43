//! # shopline-db: Database Layer for Shopline POS
//!
//! SQLite persistence and the transactional workflows built on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopline Data Flow                               │
//! │                                                                         │
//! │  pos-api handler (POST /api/pos/shops/3/sales)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopline-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐    │   │
//! │  │   │   Workflows   │   │  Repositories  │   │  Migrations  │    │   │
//! │  │   │               │   │                │   │  (embedded)  │    │   │
//! │  │   │ PosWorkflow   │──►│ StockRepo      │   │              │    │   │
//! │  │   │ Allocation    │   │ ShopStockRepo  │   │ 001_initial  │    │   │
//! │  │   │ CartWorkflow  │   │ SaleRepo  ...  │   │              │    │   │
//! │  │   └───────┬───────┘   └────────────────┘   └──────────────┘    │   │
//! │  │           │ one transaction per call                           │   │
//! │  │   ┌───────▼───────┐                                            │   │
//! │  │   │   Database    │  SqlitePool (pool.rs)                      │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (SHOPLINE_DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table loads and single-row writes
//! - [`workflow`] - POS sale, allocation transfer and cart checkout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/shopline.db")).await?;
//!
//! let quote = db.pos().price_line_item(caller, shop_id, stock_id, 2).await?;
//! let receipt = db.pos().complete_sale(caller, shop_id, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::sale::SaleRepository;
pub use repository::shop::ShopRepository;
pub use repository::shop_stock::ShopStockRepository;
pub use repository::stock::{NewStock, StockRepository, StockUpdate};
pub use repository::user::{NewUser, UserRepository};

pub use workflow::allocation::AllocationWorkflow;
pub use workflow::checkout::CartWorkflow;
pub use workflow::pos::PosWorkflow;
