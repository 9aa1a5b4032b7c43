//! # Allocation Transfers
//!
//! Moves units between the catalog store and a shop. Each transfer touches
//! exactly two rows and keeps their sum constant:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   stocks.quantity (unallocated)        shop_stock.quantity              │
//! │   ┌───────────────┐   allocate(n)     ┌───────────────┐                 │
//! │   │      50       │ ────────────────► │       0 + n   │                 │
//! │   │      50 - n   │                   │               │                 │
//! │   └───────────────┘ ◄──────────────── └───────────────┘                 │
//! │                       deallocate / reallocate(diff < 0)                 │
//! │                                                                         │
//! │   invariant: stocks.quantity + Σ shop_stock.quantity is unchanged       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both rows are updated under their own version guard inside one
//! transaction, so a concurrent transfer or sale on either row aborts the
//! second writer instead of losing an update.

use shopline_core::dto::AllocationResponse;
use shopline_core::validation::{
    checked_stock_quantity, validate_target_quantity, validate_transfer_quantity,
};
use shopline_core::{Caller, CoreError, ShopStock, Stock};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::shop::require_shop;
use crate::repository::shop_stock;
use crate::repository::stock::{adjust_quantity, fetch_levels, require_stock};
use crate::workflow::authorize_shop;

/// Catalog ⇄ shop transfers.
#[derive(Debug, Clone)]
pub struct AllocationWorkflow {
    db: Database,
}

impl AllocationWorkflow {
    pub fn new(db: Database) -> Self {
        AllocationWorkflow { db }
    }

    /// Places `quantity` unallocated units of `stock_id` at `shop_id`.
    ///
    /// An existing row for the pair grows and takes the catalog's current
    /// prices and source; otherwise a new row is created with them.
    pub async fn allocate(
        &self,
        caller: Caller,
        stock_id: i64,
        shop_id: i64,
        quantity: i64,
    ) -> DbResult<AllocationResponse> {
        validate_transfer_quantity(quantity)?;

        let mut tx = self.db.begin().await?;

        let shop = require_shop(&mut *tx, shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let stock = require_stock(&mut *tx, stock_id).await?;
        if stock.quantity < quantity {
            warn!(
                stock_id,
                available = stock.quantity,
                requested = quantity,
                "Allocation exceeds unallocated stock"
            );
            return Err(CoreError::InsufficientOwnerStock {
                stock_id,
                available: stock.quantity,
                requested: quantity,
            }
            .into());
        }

        adjust_quantity(&mut *tx, &stock, -quantity).await?;

        let shop_stock_id = match shop_stock::fetch_for_item(&mut *tx, shop_id, stock_id).await? {
            Some(row) => {
                grow_row(&mut tx, &row, &stock, quantity).await?;
                row.shop_stock_id
            }
            None => insert_row(&mut tx, shop_id, &stock, quantity).await?,
        };

        let row = shop_stock::fetch_by_id(&mut *tx, shop_stock_id).await?;
        let levels = fetch_levels(&mut *tx, stock_id).await?;

        tx.commit().await?;

        info!(
            stock_id,
            shop_id,
            quantity,
            unallocated = levels.unallocated,
            "Stock allocated to shop"
        );
        Ok(AllocationResponse {
            shop_stock: row,
            stock_levels: levels,
        })
    }

    /// Sets a shop row to `new_quantity`, moving the difference to or from
    /// the catalog.
    ///
    /// `expected_version`, when given, must match the persisted row. A target
    /// of zero keeps the (empty) row; use [`deallocate`](Self::deallocate) to
    /// remove it.
    pub async fn reallocate(
        &self,
        caller: Caller,
        shop_stock_id: i64,
        new_quantity: i64,
        expected_version: Option<i64>,
    ) -> DbResult<AllocationResponse> {
        validate_target_quantity(new_quantity)?;

        let mut tx = self.db.begin().await?;

        let row = require_shop_stock(&mut tx, shop_stock_id).await?;
        if let Some(expected) = expected_version {
            if expected != row.version {
                warn!(shop_stock_id, expected, actual = row.version, "Stale allocation version");
                return Err(CoreError::conflict("ShopStock", shop_stock_id).into());
            }
        }

        let shop = require_shop(&mut *tx, row.shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let stock = require_stock(&mut *tx, row.stock_id).await?;
        let diff = new_quantity - row.quantity;
        if diff > 0 && stock.quantity < diff {
            return Err(CoreError::InsufficientOwnerStock {
                stock_id: stock.stock_id,
                available: stock.quantity,
                requested: diff,
            }
            .into());
        }

        if diff != 0 {
            adjust_quantity(&mut *tx, &stock, -diff).await?;
            set_row_quantity(&mut tx, &row, new_quantity).await?;
        }

        let updated = shop_stock::fetch_by_id(&mut *tx, shop_stock_id).await?;
        let levels = fetch_levels(&mut *tx, row.stock_id).await?;

        tx.commit().await?;

        info!(
            shop_stock_id,
            from = row.quantity,
            to = new_quantity,
            unallocated = levels.unallocated,
            "Allocation adjusted"
        );
        Ok(AllocationResponse {
            shop_stock: updated,
            stock_levels: levels,
        })
    }

    /// Returns every unit of a shop row to the catalog and removes the row.
    pub async fn deallocate(&self, caller: Caller, shop_stock_id: i64) -> DbResult<AllocationResponse> {
        let mut tx = self.db.begin().await?;

        let row = require_shop_stock(&mut tx, shop_stock_id).await?;
        let shop = require_shop(&mut *tx, row.shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let stock = require_stock(&mut *tx, row.stock_id).await?;
        if row.quantity > 0 {
            adjust_quantity(&mut *tx, &stock, row.quantity).await?;
        }

        let result = sqlx::query("DELETE FROM shop_stock WHERE shop_stock_id = ? AND version = ?")
            .bind(row.shop_stock_id)
            .bind(row.version)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::conflict("ShopStock", shop_stock_id).into());
        }

        let levels = fetch_levels(&mut *tx, row.stock_id).await?;

        tx.commit().await?;

        info!(
            shop_stock_id,
            returned = row.quantity,
            unallocated = levels.unallocated,
            "Allocation removed"
        );
        Ok(AllocationResponse {
            shop_stock: None,
            stock_levels: levels,
        })
    }
}

// =============================================================================
// Row writes (transaction only)
// =============================================================================

async fn require_shop_stock(conn: &mut SqliteConnection, shop_stock_id: i64) -> DbResult<ShopStock> {
    shop_stock::fetch_by_id(conn, shop_stock_id)
        .await?
        .ok_or_else(|| DbError::not_found("ShopStock", shop_stock_id))
}

async fn insert_row(
    conn: &mut SqliteConnection,
    shop_id: i64,
    stock: &Stock,
    quantity: i64,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO shop_stock (shop_id, stock_id, quantity, buy_price_cents, sell_price_cents, source)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(shop_id)
    .bind(stock.stock_id)
    .bind(quantity)
    .bind(stock.buy_price_cents)
    .bind(stock.sell_price_cents)
    .bind(&stock.source)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Adds units and refreshes the price snapshot from the catalog.
async fn grow_row(
    conn: &mut SqliteConnection,
    row: &ShopStock,
    stock: &Stock,
    quantity: i64,
) -> DbResult<()> {
    checked_stock_quantity(row.quantity, quantity)?;

    let result = sqlx::query(
        r#"
        UPDATE shop_stock
        SET quantity = quantity + ?, buy_price_cents = ?, sell_price_cents = ?, source = ?,
            version = version + 1
        WHERE shop_stock_id = ? AND version = ?
        "#,
    )
    .bind(quantity)
    .bind(stock.buy_price_cents)
    .bind(stock.sell_price_cents)
    .bind(&stock.source)
    .bind(row.shop_stock_id)
    .bind(row.version)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::conflict("ShopStock", row.shop_stock_id).into());
    }
    Ok(())
}

async fn set_row_quantity(conn: &mut SqliteConnection, row: &ShopStock, quantity: i64) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE shop_stock SET quantity = ?, version = version + 1 WHERE shop_stock_id = ? AND version = ?",
    )
    .bind(quantity)
    .bind(row.shop_stock_id)
    .bind(row.version)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::conflict("ShopStock", row.shop_stock_id).into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
