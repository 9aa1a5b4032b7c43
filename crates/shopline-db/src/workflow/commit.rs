//! # Sale Commit
//!
//! The one place that turns priced lines into stock decrements and ledger
//! rows. Both the till and the online checkout go through here.
//!
//! ## Per Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line n: (stock_id, quantity)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT shop_stock (inside the caller's transaction)                   │
//! │       │                                                                 │
//! │       ├── no row?            ──► NotFound (line n)         ─┐          │
//! │       ├── quantity < asked?  ──► InsufficientStock (line n) │          │
//! │       ▼                                                    │          │
//! │  price_line(unit_price from row, quantity, rate)            ├► abort   │
//! │       ├── overflow?          ──► Validation (Overflow)     │          │
//! │       ▼                                                    │          │
//! │  UPDATE ... WHERE version = ? AND quantity >= ?             │          │
//! │       ├── 0 rows?            ──► ConcurrencyConflict      ─┘          │
//! │       ▼                                                                 │
//! │  INSERT sales (transaction_ref shared by all lines)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing line aborts the whole commit; the caller drops the
//! transaction and nothing persists. Repeated stock ids are fine: the second
//! read sees the first decrement.

use chrono::Utc;
use shopline_core::dto::{ReceiptLine, SaleReceipt};
use shopline_core::{price_line, CoreError, DiscountRate, SaleTotals, SaleType};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::sale::{insert_sale, NewSale};
use crate::repository::shop_stock;

/// One requested line: what and how many. Prices are never taken from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommitLine {
    pub stock_id: i64,
    pub quantity: i64,
}

/// Everything a commit needs besides the lines themselves.
#[derive(Debug, Clone)]
pub(crate) struct CommitContext<'a> {
    pub shop_id: i64,
    pub user_id: Option<i64>,
    pub customer_phone: Option<&'a str>,
    pub rate: DiscountRate,
    pub sale_type: SaleType,
    pub notes: Option<&'a str>,
}

/// Decrements shop stock and appends one sale row per line.
///
/// Must run inside a transaction owned by the caller, who commits it.
pub(crate) async fn commit_sale(
    conn: &mut SqliteConnection,
    ctx: &CommitContext<'_>,
    lines: &[CommitLine],
) -> DbResult<SaleReceipt> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let transaction_ref = Uuid::new_v4().to_string();
    let sale_date = Utc::now();
    let mut totals = SaleTotals::default();
    let mut receipt_lines = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let line_no = index + 1;

        let row = shop_stock::fetch_for_item(&mut *conn, ctx.shop_id, line.stock_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "ShopStock",
                id: format!(
                    "shop {} stock {} (cart line {})",
                    ctx.shop_id, line.stock_id, line_no
                ),
            })?;

        if row.quantity < line.quantity {
            return Err(CoreError::InsufficientStock {
                line: line_no,
                stock_id: line.stock_id,
                available: row.quantity,
                requested: line.quantity,
            }
            .into());
        }

        let priced = price_line(row.unit_price(), line.quantity, ctx.rate)?;
        totals.add_line(&priced)?;

        shop_stock::decrement(&mut *conn, &row, line.quantity).await?;

        let sale_id = insert_sale(
            &mut *conn,
            &NewSale {
                shop_id: ctx.shop_id,
                stock_id: line.stock_id,
                user_id: ctx.user_id,
                customer_phone: ctx.customer_phone,
                quantity: line.quantity,
                unit_price_cents: priced.unit_price.cents(),
                discount_cents: priced.discount.cents(),
                total_price_cents: priced.total.cents(),
                sale_date,
                sale_type: ctx.sale_type,
                notes: ctx.notes,
                transaction_ref: &transaction_ref,
            },
        )
        .await?;

        debug!(
            sale_id,
            line = line_no,
            stock_id = line.stock_id,
            quantity = line.quantity,
            remaining = row.quantity - line.quantity,
            "Sale line written"
        );

        receipt_lines.push(ReceiptLine::new(sale_id, line.stock_id, row.item_name, &priced));
    }

    Ok(SaleReceipt::new(
        transaction_ref,
        ctx.shop_id,
        ctx.sale_type,
        receipt_lines,
        totals,
    ))
}
