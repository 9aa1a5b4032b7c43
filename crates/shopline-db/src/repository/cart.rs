//! # Cart Queries
//!
//! SQL for the `shopping_carts` table. The cart rules (stock checks,
//! clamping, checkout) live in [`crate::workflow::checkout`].

use chrono::{DateTime, Utc};
use shopline_core::{CartEntry, CartLine};
use sqlx::SqliteExecutor;

use crate::error::DbResult;

pub(crate) async fn fetch_entry<'e, E: SqliteExecutor<'e>>(
    exec: E,
    cart_id: i64,
) -> DbResult<Option<CartEntry>> {
    let entry = sqlx::query_as::<_, CartEntry>(
        "SELECT cart_id, user_id, stock_id, quantity, date_added FROM shopping_carts WHERE cart_id = ?",
    )
    .bind(cart_id)
    .fetch_optional(exec)
    .await?;
    Ok(entry)
}

pub(crate) async fn fetch_entry_for_item<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: i64,
    stock_id: i64,
) -> DbResult<Option<CartEntry>> {
    let entry = sqlx::query_as::<_, CartEntry>(
        r#"
        SELECT cart_id, user_id, stock_id, quantity, date_added
        FROM shopping_carts
        WHERE user_id = ? AND stock_id = ?
        "#,
    )
    .bind(user_id)
    .bind(stock_id)
    .fetch_optional(exec)
    .await?;
    Ok(entry)
}

/// Adds units to the (user, stock) entry, creating it when absent.
pub(crate) async fn upsert<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: i64,
    stock_id: i64,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO shopping_carts (user_id, stock_id, quantity, date_added)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, stock_id)
        DO UPDATE SET quantity = quantity + excluded.quantity
        "#,
    )
    .bind(user_id)
    .bind(stock_id)
    .bind(quantity)
    .bind(now)
    .execute(exec)
    .await?;
    Ok(())
}

pub(crate) async fn set_quantity<'e, E: SqliteExecutor<'e>>(
    exec: E,
    cart_id: i64,
    quantity: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE shopping_carts SET quantity = ? WHERE cart_id = ?")
        .bind(quantity)
        .bind(cart_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub(crate) async fn delete_entry<'e, E: SqliteExecutor<'e>>(exec: E, cart_id: i64) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM shopping_carts WHERE cart_id = ?")
        .bind(cart_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn clear<'e, E: SqliteExecutor<'e>>(exec: E, user_id: i64) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM shopping_carts WHERE user_id = ?")
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

/// Cart entries joined with the catalog, oldest first.
pub(crate) async fn lines_for_user<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: i64,
) -> DbResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT c.cart_id, c.stock_id, s.name AS item_name, c.quantity,
               s.sell_price_cents AS unit_price_cents, s.quantity AS available
        FROM shopping_carts c
        INNER JOIN stocks s ON s.stock_id = c.stock_id
        WHERE c.user_id = ?
        ORDER BY c.date_added, c.cart_id
        "#,
    )
    .bind(user_id)
    .fetch_all(exec)
    .await?;
    Ok(lines)
}

pub(crate) async fn count_for_user<'e, E: SqliteExecutor<'e>>(exec: E, user_id: i64) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shopping_carts WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(exec)
        .await?;
    Ok(count)
}
