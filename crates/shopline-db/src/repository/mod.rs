//! # Repository Module
//!
//! Database repository implementations for Shopline POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  HTTP handler / seed tool                                              │
//! │       │  db.stocks().get_by_id(7)                                      │
//! │       ▼                                                                 │
//! │  StockRepository { pool }  ──► runs on the pool                        │
//! │                                                                         │
//! │  Workflow (inside a transaction)                                       │
//! │       │  stock::fetch_stock(&mut *tx, 7)                               │
//! │       ▼                                                                 │
//! │  pub(crate) fn<E: SqliteExecutor> ──► runs on the transaction          │
//! │                                                                         │
//! │  The same SQL serves both, so a workflow never reads through the       │
//! │  pool while it holds a transaction open.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockRepository`](stock::StockRepository) - Catalog items, levels, images
//! - [`ShopRepository`](shop::ShopRepository) - Shops
//! - [`ShopStockRepository`](shop_stock::ShopStockRepository) - Shop inventory (read side)
//! - [`UserRepository`](user::UserRepository) - Accounts, tiers, passwords
//! - [`SaleRepository`](sale::SaleRepository) - Sale ledger (read side)
//! - [`cart`] - Cart table queries used by the cart workflow

pub mod cart;
pub mod sale;
pub mod shop;
pub mod shop_stock;
pub mod stock;
pub mod user;
