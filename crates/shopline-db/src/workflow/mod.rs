//! # Workflows
//!
//! Multi-row operations that must succeed or fail as a unit. Each public
//! workflow method opens exactly one transaction, does all of its reads and
//! writes through it, and commits at the end. Returning early with `?` drops
//! the transaction, which rolls everything back.
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PosWorkflow::complete_sale     CartWorkflow::checkout                  │
//! │          │                              │                               │
//! │          └──────────────┬───────────────┘                               │
//! │                         ▼                                               │
//! │               commit::commit_sale  (shared primitive)                   │
//! │               ├── re-read ShopStock row per line                        │
//! │               ├── guarded decrement (version + quantity)               │
//! │               └── append Sale row                                       │
//! │                                                                         │
//! │  AllocationWorkflow::{allocate, reallocate, deallocate}                 │
//! │               ├── Stock.quantity      -= / += diff                      │
//! │               └── ShopStock.quantity  += / -= diff                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers are passed in explicitly as [`Caller`]; nothing here reads
//! request context.

pub mod allocation;
pub mod checkout;
pub mod commit;
pub mod pos;

use shopline_core::{Caller, CoreError, Shop};
use tracing::warn;

use crate::error::DbResult;

/// Admins act on every shop, proprietors only on their own.
pub(crate) fn authorize_shop(caller: &Caller, shop: &Shop) -> DbResult<()> {
    if caller.can_manage_shop(shop) {
        return Ok(());
    }
    warn!(
        user_id = caller.user_id,
        role = %caller.role,
        shop_id = shop.shop_id,
        "Caller may not act on shop"
    );
    Err(CoreError::Forbidden(format!(
        "user {} may not act on shop {}",
        caller.user_id, shop.shop_id
    ))
    .into())
}
