//! # Sale Repository
//!
//! The sale ledger. Rows are inserted only by the commit primitive in
//! [`crate::workflow::commit`] and are never updated or deleted (the schema
//! enforces this with triggers).
//!
//! ## Row Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  one row per line item                                                  │
//! │                                                                         │
//! │  transaction_ref  3f2c...  ─┬─ sale 41  stock 7  2 × 999  -200  = 1798 │
//! │                             └─ sale 42  stock 9  1 × 450   -45  =  405 │
//! │                                                                         │
//! │  total_price_cents = unit_price_cents * quantity - discount_cents      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopline_core::{Sale, SaleType};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "sale_id, shop_id, stock_id, user_id, customer_phone, quantity, \
     unit_price_cents, discount_cents, total_price_cents, sale_date, sale_type, notes, \
     transaction_ref";

/// A ledger row about to be written.
#[derive(Debug, Clone)]
pub(crate) struct NewSale<'a> {
    pub shop_id: i64,
    pub stock_id: i64,
    pub user_id: Option<i64>,
    pub customer_phone: Option<&'a str>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_price_cents: i64,
    pub sale_date: DateTime<Utc>,
    pub sale_type: SaleType,
    pub notes: Option<&'a str>,
    pub transaction_ref: &'a str,
}

pub(crate) async fn insert_sale<'e, E: SqliteExecutor<'e>>(
    exec: E,
    sale: &NewSale<'_>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales (shop_id, stock_id, user_id, customer_phone, quantity,
                           unit_price_cents, discount_cents, total_price_cents,
                           sale_date, sale_type, notes, transaction_ref)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sale.shop_id)
    .bind(sale.stock_id)
    .bind(sale.user_id)
    .bind(sale.customer_phone)
    .bind(sale.quantity)
    .bind(sale.unit_price_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_price_cents)
    .bind(sale.sale_date)
    .bind(sale.sale_type)
    .bind(sale.notes)
    .bind(sale.transaction_ref)
    .execute(exec)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Repository for the sale ledger (read side).
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale row by ID.
    pub async fn get_by_id(&self, sale_id: i64) -> DbResult<Sale> {
        let sql = format!("SELECT {} FROM sales WHERE sale_id = ?", SALE_COLUMNS);
        sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }

    /// Sales of one shop, newest first, within optional inclusive bounds.
    pub async fn list_for_shop(
        &self,
        shop_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {} FROM sales
            WHERE shop_id = ?1
              AND (?2 IS NULL OR sale_date >= ?2)
              AND (?3 IS NULL OR sale_date <= ?3)
            ORDER BY sale_date DESC, sale_id DESC
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(shop_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        debug!(shop_id, count = sales.len(), "Loaded sales history");
        Ok(sales)
    }

    /// All rows committed together under one transaction reference.
    pub async fn list_for_transaction(&self, transaction_ref: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE transaction_ref = ? ORDER BY sale_id",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(transaction_ref)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Purchases attributed to one account, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE user_id = ? ORDER BY sale_date DESC, sale_id DESC",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Number of ledger rows for a shop.
    pub async fn count_for_shop(&self, shop_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE shop_id = ?")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
