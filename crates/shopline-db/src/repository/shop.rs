//! # Shop Repository
//!
//! Database operations for shops.
//!
//! ## Deleting a Shop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete(shop_id)            one transaction                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each shop_stock row: stocks.quantity += row.quantity              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DELETE shop ──► shop_stock rows cascade                               │
//! │       │                                                                 │
//! │       └── shop has sales? FOREIGN KEY (RESTRICT) ──► rollback          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Units are returned before the cascade so the owner never loses stock.

use shopline_core::validation::validate_shop;
use shopline_core::{Role, Shop, ValidationError};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::user::fetch_user;

// =============================================================================
// Executor-generic queries (shared with workflows)
// =============================================================================

pub(crate) async fn fetch_shop<'e, E: SqliteExecutor<'e>>(
    exec: E,
    shop_id: i64,
) -> DbResult<Option<Shop>> {
    let shop = sqlx::query_as::<_, Shop>(
        "SELECT shop_id, name, location, proprietor_id FROM shops WHERE shop_id = ?",
    )
    .bind(shop_id)
    .fetch_optional(exec)
    .await?;
    Ok(shop)
}

pub(crate) async fn require_shop<'e, E: SqliteExecutor<'e>>(
    exec: E,
    shop_id: i64,
) -> DbResult<Shop> {
    fetch_shop(exec, shop_id)
        .await?
        .ok_or_else(|| DbError::not_found("Shop", shop_id))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shops.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Opens a shop run by a proprietor.
    pub async fn create(&self, name: &str, location: &str, proprietor_id: i64) -> DbResult<Shop> {
        let (name, location) = validate_shop(name, location)?;

        let owner = fetch_user(&self.pool, proprietor_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", proprietor_id))?;
        if owner.role != Role::Proprietor {
            return Err(ValidationError::InvalidFormat {
                field: "proprietorId".to_string(),
                reason: format!("user {} is not a proprietor", proprietor_id),
            }
            .into());
        }

        let result =
            sqlx::query("INSERT INTO shops (name, location, proprietor_id) VALUES (?, ?, ?)")
                .bind(&name)
                .bind(&location)
                .bind(proprietor_id)
                .execute(&self.pool)
                .await?;

        let shop = Shop {
            shop_id: result.last_insert_rowid(),
            name,
            location,
            proprietor_id,
        };
        info!(shop_id = shop.shop_id, proprietor_id, "Shop created");
        Ok(shop)
    }

    /// Gets a shop by ID.
    pub async fn get_by_id(&self, shop_id: i64) -> DbResult<Shop> {
        require_shop(&self.pool, shop_id).await
    }

    /// Lists all shops by name.
    pub async fn list(&self) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            "SELECT shop_id, name, location, proprietor_id FROM shops ORDER BY name, shop_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(shops)
    }

    /// Lists the shops a proprietor owns.
    pub async fn list_for_proprietor(&self, proprietor_id: i64) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            "SELECT shop_id, name, location, proprietor_id FROM shops WHERE proprietor_id = ? ORDER BY name, shop_id",
        )
        .bind(proprietor_id)
        .fetch_all(&self.pool)
        .await?;
        debug!(proprietor_id, count = shops.len(), "Listed proprietor shops");
        Ok(shops)
    }

    /// Closes a shop, returning its allocated units to the catalog first.
    pub async fn delete(&self, shop_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        require_shop(&mut *tx, shop_id).await?;

        let returned = sqlx::query(
            r#"
            UPDATE stocks
            SET quantity = quantity + (
                    SELECT ss.quantity FROM shop_stock ss
                    WHERE ss.shop_id = ?1 AND ss.stock_id = stocks.stock_id
                ),
                version = version + 1
            WHERE stock_id IN (SELECT stock_id FROM shop_stock WHERE shop_id = ?1)
            "#,
        )
        .bind(shop_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM shops WHERE shop_id = ?")
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(shop_id, items_returned = returned, "Shop deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
