//! # Stock Repository
//!
//! Database operations for the catalog store.
//!
//! ## Key Operations
//! - CRUD on catalog items with optimistic version checks
//! - Quantity breakdown (unallocated / allocated / total)
//! - Image references
//!
//! Quantity moves between the catalog and shops happen in
//! [`crate::workflow::allocation`], never here.

use chrono::Utc;
use shopline_core::validation::{
    checked_stock_quantity, optional_text, validate_prices, validate_stock_name, validate_stock_quantity, validate_text,
    validate_transfer_quantity,
};
use shopline_core::{Category, CoreError, Stock, StockImage, StockLevels, MAX_STOCK_QUANTITY};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const STOCK_COLUMNS: &str = "stock_id, name, category, buy_price_cents, sell_price_cents, \
     quantity, source, description, created_date, version";

/// Fields of a new catalog item.
#[derive(Debug, Clone)]
pub struct NewStock {
    pub name: String,
    pub category: Category,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    pub quantity: i64,
    pub source: String,
    pub description: Option<String>,
}

/// Editable fields of a catalog item. `quantity` is absent on purpose:
/// units only move through allocation transfers and restocks.
#[derive(Debug, Clone)]
pub struct StockUpdate {
    pub name: String,
    pub category: Category,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    pub source: String,
    pub description: Option<String>,
}

// =============================================================================
// Executor-generic queries (shared with workflows)
// =============================================================================

pub(crate) async fn fetch_stock<'e, E: SqliteExecutor<'e>>(
    exec: E,
    stock_id: i64,
) -> DbResult<Option<Stock>> {
    let sql = format!("SELECT {} FROM stocks WHERE stock_id = ?", STOCK_COLUMNS);
    let stock = sqlx::query_as::<_, Stock>(&sql)
        .bind(stock_id)
        .fetch_optional(exec)
        .await?;
    Ok(stock)
}

pub(crate) async fn require_stock<'e, E: SqliteExecutor<'e>>(
    exec: E,
    stock_id: i64,
) -> DbResult<Stock> {
    fetch_stock(exec, stock_id)
        .await?
        .ok_or_else(|| DbError::not_found("Stock", stock_id))
}

/// Moves `delta` units into (positive) or out of (negative) the unallocated
/// pool, guarded by the version the caller read.
///
/// Fails validation when the result would leave `0..=MAX_STOCK_QUANTITY`,
/// and returns `ConcurrencyConflict` when the row changed since it was read.
pub(crate) async fn adjust_quantity<'e, E: SqliteExecutor<'e>>(
    exec: E,
    stock: &Stock,
    delta: i64,
) -> DbResult<()> {
    checked_stock_quantity(stock.quantity, delta)?;

    let result = sqlx::query(
        r#"
        UPDATE stocks
        SET quantity = quantity + ?1, version = version + 1
        WHERE stock_id = ?2 AND version = ?3 AND quantity + ?1 BETWEEN 0 AND ?4
        "#,
    )
    .bind(delta)
    .bind(stock.stock_id)
    .bind(stock.version)
    .bind(MAX_STOCK_QUANTITY)
    .execute(exec)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::conflict("Stock", stock.stock_id).into());
    }
    Ok(())
}

pub(crate) async fn fetch_levels<'e, E: SqliteExecutor<'e>>(
    exec: E,
    stock_id: i64,
) -> DbResult<StockLevels> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT s.quantity,
               COALESCE((SELECT SUM(ss.quantity) FROM shop_stock ss WHERE ss.stock_id = s.stock_id), 0)
        FROM stocks s
        WHERE s.stock_id = ?
        "#,
    )
    .bind(stock_id)
    .fetch_optional(exec)
    .await?;

    let (unallocated, allocated) = row.ok_or_else(|| DbError::not_found("Stock", stock_id))?;
    Ok(StockLevels {
        stock_id,
        unallocated,
        allocated,
        total: unallocated + allocated,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog stock.
///
/// ## Usage
/// ```rust,ignore
/// let stock = db.stocks().create(new_stock).await?;
/// let levels = db.stocks().levels(stock.stock_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Inserts a catalog item after validating name, prices and quantity.
    pub async fn create(&self, new: NewStock) -> DbResult<Stock> {
        let name = validate_stock_name(&new.name)?;
        validate_prices(new.buy_price_cents, new.sell_price_cents)?;
        validate_stock_quantity(new.quantity)?;
        let description = optional_text("description", new.description.as_deref(), 2000)?;

        let result = sqlx::query(
            r#"
            INSERT INTO stocks (name, category, buy_price_cents, sell_price_cents,
                                quantity, source, description, created_date, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&name)
        .bind(new.category)
        .bind(new.buy_price_cents)
        .bind(new.sell_price_cents)
        .bind(new.quantity)
        .bind(new.source.trim())
        .bind(&description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let stock_id = result.last_insert_rowid();
        info!(stock_id, name = %name, quantity = new.quantity, "Stock created");
        self.get_by_id(stock_id).await
    }

    /// Gets a catalog item by ID.
    pub async fn get_by_id(&self, stock_id: i64) -> DbResult<Stock> {
        debug!(stock_id, "Getting stock");
        fetch_stock(&self.pool, stock_id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock", stock_id))
    }

    /// Lists catalog items, optionally filtered by category, by name.
    pub async fn list(&self, category: Option<Category>) -> DbResult<Vec<Stock>> {
        let stocks = match category {
            Some(category) => {
                let sql = format!(
                    "SELECT {} FROM stocks WHERE category = ? ORDER BY name, stock_id",
                    STOCK_COLUMNS
                );
                sqlx::query_as::<_, Stock>(&sql)
                    .bind(category)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM stocks ORDER BY name, stock_id", STOCK_COLUMNS);
                sqlx::query_as::<_, Stock>(&sql).fetch_all(&self.pool).await?
            }
        };
        debug!(count = stocks.len(), "Listed stocks");
        Ok(stocks)
    }

    /// Updates descriptive fields and prices.
    ///
    /// `expected_version` must match the persisted row, otherwise the update
    /// is rejected with `ConcurrencyConflict`. Shop price snapshots are not
    /// touched.
    pub async fn update(
        &self,
        stock_id: i64,
        expected_version: i64,
        update: StockUpdate,
    ) -> DbResult<Stock> {
        let name = validate_stock_name(&update.name)?;
        validate_prices(update.buy_price_cents, update.sell_price_cents)?;
        let description = optional_text("description", update.description.as_deref(), 2000)?;

        let result = sqlx::query(
            r#"
            UPDATE stocks SET
                name = ?, category = ?, buy_price_cents = ?, sell_price_cents = ?,
                source = ?, description = ?, version = version + 1
            WHERE stock_id = ? AND version = ?
            "#,
        )
        .bind(&name)
        .bind(update.category)
        .bind(update.buy_price_cents)
        .bind(update.sell_price_cents)
        .bind(update.source.trim())
        .bind(&description)
        .bind(stock_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // distinguish a missing row from a stale version
            self.get_by_id(stock_id).await?;
            return Err(CoreError::conflict("Stock", stock_id).into());
        }

        info!(stock_id, "Stock updated");
        self.get_by_id(stock_id).await
    }

    /// Adds newly received units to the unallocated pool.
    pub async fn restock(&self, stock_id: i64, quantity: i64) -> DbResult<Stock> {
        validate_transfer_quantity(quantity)?;
        let stock = self.get_by_id(stock_id).await?;
        adjust_quantity(&self.pool, &stock, quantity).await?;
        info!(stock_id, quantity, "Stock restocked");
        self.get_by_id(stock_id).await
    }

    /// Deletes a catalog item with its images, shop rows and cart entries.
    ///
    /// Fails with a foreign key violation once the item has been sold.
    pub async fn delete(&self, stock_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stocks WHERE stock_id = ?")
            .bind(stock_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", stock_id));
        }
        info!(stock_id, "Stock deleted");
        Ok(())
    }

    /// Unallocated, allocated and total units of one item.
    pub async fn levels(&self, stock_id: i64) -> DbResult<StockLevels> {
        fetch_levels(&self.pool, stock_id).await
    }

    /// Attaches an image reference to a catalog item.
    pub async fn add_image(
        &self,
        stock_id: i64,
        image_url: &str,
        description: Option<&str>,
    ) -> DbResult<StockImage> {
        let image_url = validate_text("imageUrl", image_url, 2048)?;
        let description = optional_text("description", description, 500)?;
        self.get_by_id(stock_id).await?;

        let result = sqlx::query(
            "INSERT INTO stock_images (stock_id, image_url, description) VALUES (?, ?, ?)",
        )
        .bind(stock_id)
        .bind(&image_url)
        .bind(&description)
        .execute(&self.pool)
        .await?;

        Ok(StockImage {
            image_id: result.last_insert_rowid(),
            stock_id,
            image_url,
            description,
        })
    }

    /// Lists image references of a catalog item.
    pub async fn images(&self, stock_id: i64) -> DbResult<Vec<StockImage>> {
        let images = sqlx::query_as::<_, StockImage>(
            "SELECT image_id, stock_id, image_url, description FROM stock_images WHERE stock_id = ? ORDER BY image_id",
        )
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shopline_core::ValidationError;

    fn sample(name: &str, quantity: i64) -> NewStock {
        NewStock {
            name: name.to_string(),
            category: Category::Book,
            buy_price_cents: 500,
            sell_price_cents: 999,
            quantity,
            source: "Wholesale".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.stocks().create(sample("Dune", 50)).await.unwrap();

        let stock = db.stocks().get_by_id(created.stock_id).await.unwrap();
        assert_eq!(stock.name, "Dune");
        assert_eq!(stock.category, Category::Book);
        assert_eq!(stock.quantity, 50);
        assert_eq!(stock.version, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_buy_above_sell() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut new = sample("Dune", 5);
        new.buy_price_cents = 1200;

        let err = db.stocks().create(new).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::BuyAboveSell { .. }))
        ));
        assert!(db.stocks().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stocks().create(sample("Catan", 3)).await.unwrap();
        let update = StockUpdate {
            name: "Catan (5th ed.)".to_string(),
            category: Category::Game,
            buy_price_cents: 2000,
            sell_price_cents: 4500,
            source: "Kosmos".to_string(),
            description: Some("Trading and building".to_string()),
        };

        let updated = db
            .stocks()
            .update(stock.stock_id, stock.version, update.clone())
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.category, Category::Game);

        let err = db
            .stocks()
            .update(stock.stock_id, stock.version, update)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_levels_and_restock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stocks().create(sample("Dune", 10)).await.unwrap();

        db.stocks().restock(stock.stock_id, 5).await.unwrap();
        let levels = db.stocks().levels(stock.stock_id).await.unwrap();
        assert_eq!(levels.unallocated, 15);
        assert_eq!(levels.allocated, 0);
        assert_eq!(levels.total, 15);
    }

    #[tokio::test]
    async fn test_restock_beyond_max_leaves_row_readable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stocks().create(sample("Dune", 50)).await.unwrap();

        for quantity in [i64::MAX, MAX_STOCK_QUANTITY] {
            let err = db.stocks().restock(stock.stock_id, quantity).await.unwrap_err();
            assert!(matches!(
                err,
                DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
            ));
        }

        let reread = db.stocks().get_by_id(stock.stock_id).await.unwrap();
        assert_eq!(reread.quantity, 50);
        assert_eq!(reread.version, stock.version);

        let topped = db
            .stocks()
            .restock(stock.stock_id, MAX_STOCK_QUANTITY - 50)
            .await
            .unwrap();
        assert_eq!(topped.quantity, MAX_STOCK_QUANTITY);
    }

    #[tokio::test]
    async fn test_schema_rejects_non_integer_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stocks().create(sample("Dune", 50)).await.unwrap();

        // Integer overflow in SQLite yields a REAL.
        let result = sqlx::query("UPDATE stocks SET quantity = quantity + ? WHERE stock_id = ?")
            .bind(i64::MAX)
            .bind(stock.stock_id)
            .execute(db.pool())
            .await;
        assert!(result.is_err());

        assert_eq!(db.stocks().get_by_id(stock.stock_id).await.unwrap().quantity, 50);
    }

    #[tokio::test]
    async fn test_images_cascade_on_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db.stocks().create(sample("Lego Set", 2)).await.unwrap();

        db.stocks()
            .add_image(stock.stock_id, "https://cdn.example.com/lego.jpg", Some("front"))
            .await
            .unwrap();
        assert_eq!(db.stocks().images(stock.stock_id).await.unwrap().len(), 1);

        db.stocks().delete(stock.stock_id).await.unwrap();
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_images")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
        assert!(matches!(
            db.stocks().get_by_id(stock.stock_id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
