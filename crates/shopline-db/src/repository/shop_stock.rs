//! # Shop Stock Repository
//!
//! Read side of the shop allocation ledger, plus the guarded decrement used
//! by the sale commit.
//!
//! Every row is loaded joined with its catalog item so callers get the
//! display name without a second query.

use shopline_core::{CoreError, ShopStock};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

macro_rules! shop_stock_select {
    () => {
        r#"
        SELECT ss.shop_stock_id, ss.shop_id, ss.stock_id, s.name AS item_name,
               ss.quantity, ss.buy_price_cents, ss.sell_price_cents, ss.source, ss.version
        FROM shop_stock ss
        INNER JOIN stocks s ON s.stock_id = ss.stock_id
        "#
    };
}

// =============================================================================
// Executor-generic queries (shared with workflows)
// =============================================================================

pub(crate) async fn fetch_by_id<'e, E: SqliteExecutor<'e>>(
    exec: E,
    shop_stock_id: i64,
) -> DbResult<Option<ShopStock>> {
    let row = sqlx::query_as::<_, ShopStock>(concat!(
        shop_stock_select!(),
        "WHERE ss.shop_stock_id = ?"
    ))
    .bind(shop_stock_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

pub(crate) async fn fetch_for_item<'e, E: SqliteExecutor<'e>>(
    exec: E,
    shop_id: i64,
    stock_id: i64,
) -> DbResult<Option<ShopStock>> {
    let row = sqlx::query_as::<_, ShopStock>(concat!(
        shop_stock_select!(),
        "WHERE ss.shop_id = ? AND ss.stock_id = ?"
    ))
    .bind(shop_id)
    .bind(stock_id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

/// Takes `quantity` units off a shop row.
///
/// The update only applies when the row still carries the version the caller
/// read AND still holds enough units, so two commits racing for the same row
/// can never both succeed past zero.
pub(crate) async fn decrement<'e, E: SqliteExecutor<'e>>(
    exec: E,
    row: &ShopStock,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE shop_stock
        SET quantity = quantity - ?1, version = version + 1
        WHERE shop_stock_id = ?2 AND version = ?3 AND quantity >= ?1
        "#,
    )
    .bind(quantity)
    .bind(row.shop_stock_id)
    .bind(row.version)
    .execute(exec)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::conflict("ShopStock", row.shop_stock_id).into());
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only view of shop inventory.
///
/// Writes go through [`crate::workflow::allocation::AllocationWorkflow`]
/// (transfers) and the sale commit (decrements).
#[derive(Debug, Clone)]
pub struct ShopStockRepository {
    pool: SqlitePool,
}

impl ShopStockRepository {
    /// Creates a new ShopStockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopStockRepository { pool }
    }

    /// Gets an allocation row by ID.
    pub async fn get_by_id(&self, shop_stock_id: i64) -> DbResult<ShopStock> {
        fetch_by_id(&self.pool, shop_stock_id)
            .await?
            .ok_or_else(|| DbError::not_found("ShopStock", shop_stock_id))
    }

    /// Finds the row for a (shop, stock) pair, if the item is allocated there.
    pub async fn find(&self, shop_id: i64, stock_id: i64) -> DbResult<Option<ShopStock>> {
        fetch_for_item(&self.pool, shop_id, stock_id).await
    }

    /// Lists the inventory of one shop by item name.
    pub async fn list_for_shop(&self, shop_id: i64) -> DbResult<Vec<ShopStock>> {
        let rows = sqlx::query_as::<_, ShopStock>(concat!(
            shop_stock_select!(),
            "WHERE ss.shop_id = ? ORDER BY s.name, ss.shop_stock_id"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        debug!(shop_id, count = rows.len(), "Listed shop stock");
        Ok(rows)
    }

    /// Lists every shop row of one catalog item.
    pub async fn list_for_stock(&self, stock_id: i64) -> DbResult<Vec<ShopStock>> {
        let rows = sqlx::query_as::<_, ShopStock>(concat!(
            shop_stock_select!(),
            "WHERE ss.stock_id = ? ORDER BY ss.shop_id"
        ))
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
