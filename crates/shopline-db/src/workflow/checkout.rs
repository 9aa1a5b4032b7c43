//! # Shopping Cart and Online Checkout
//!
//! Customer self-service. Cart rows only reserve intent: nothing is taken
//! from inventory until [`CartWorkflow::checkout`], which runs the same
//! commit primitive as the till.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_to_cart / update_quantity   checks catalog (unallocated) stock    │
//! │  checkout(shop)                  decrements the shop's stock           │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  commit_sale(lines, tier discount, Online) ─► clear cart ─► commit      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation acts on the caller's own rows. An entry that belongs to
//! someone else is reported as not found.

use chrono::Utc;
use shopline_core::dto::{CartView, SaleReceipt};
use shopline_core::validation::validate_cart_size;
use shopline_core::{
    Caller, CartEntry, CoreError, SaleType, User, ValidationError, MAX_ITEM_QUANTITY,
};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::cart;
use crate::repository::shop::require_shop;
use crate::repository::stock::require_stock;
use crate::repository::user::fetch_user;
use crate::workflow::commit::{commit_sale, CommitContext, CommitLine};

/// Cart maintenance and checkout for one caller at a time.
#[derive(Debug, Clone)]
pub struct CartWorkflow {
    db: Database,
}

impl CartWorkflow {
    pub fn new(db: Database) -> Self {
        CartWorkflow { db }
    }

    /// The caller's cart priced at current catalog prices.
    pub async fn view_cart(&self, caller: Caller) -> DbResult<CartView> {
        let lines = cart::lines_for_user(self.db.pool(), caller.user_id).await?;
        debug!(user_id = caller.user_id, lines = lines.len(), "Loaded cart");
        Ok(CartView::new(lines)?)
    }

    /// Adds units of a catalog item, merging with an existing entry.
    pub async fn add_to_cart(&self, caller: Caller, stock_id: i64, quantity: i64) -> DbResult<CartView> {
        check_quantity(quantity, 1)?;

        let mut tx = self.db.begin().await?;
        require_user(&mut tx, caller.user_id).await?;

        let stock = require_stock(&mut *tx, stock_id).await?;
        if stock.quantity < quantity {
            return Err(CoreError::InsufficientOwnerStock {
                stock_id,
                available: stock.quantity,
                requested: quantity,
            }
            .into());
        }

        match cart::fetch_entry_for_item(&mut *tx, caller.user_id, stock_id).await? {
            Some(existing) => check_quantity(existing.quantity + quantity, 1)?,
            None => {
                let lines = cart::count_for_user(&mut *tx, caller.user_id).await?;
                let lines = usize::try_from(lines).map_err(|_| ValidationError::Overflow {
                    field: "cart".to_string(),
                })?;
                validate_cart_size(lines + 1)?;
            }
        }

        cart::upsert(&mut *tx, caller.user_id, stock_id, quantity, Utc::now()).await?;
        tx.commit().await?;

        debug!(user_id = caller.user_id, stock_id, quantity, "Added to cart");
        self.view_cart(caller).await
    }

    /// Sets an entry's quantity, clamped to the catalog's unallocated units.
    ///
    /// When the clamped quantity is zero the entry is removed.
    pub async fn update_quantity(&self, caller: Caller, cart_id: i64, quantity: i64) -> DbResult<CartView> {
        check_quantity(quantity, 0)?;

        let mut tx = self.db.begin().await?;
        let entry = require_own_entry(&mut tx, caller, cart_id).await?;
        let stock = require_stock(&mut *tx, entry.stock_id).await?;

        let clamped = quantity.min(stock.quantity);
        if clamped == 0 {
            cart::delete_entry(&mut *tx, cart_id).await?;
        } else {
            cart::set_quantity(&mut *tx, cart_id, clamped).await?;
        }
        tx.commit().await?;

        if clamped < quantity {
            debug!(cart_id, requested = quantity, clamped, "Cart quantity clamped to stock");
        }
        self.view_cart(caller).await
    }

    pub async fn remove_from_cart(&self, caller: Caller, cart_id: i64) -> DbResult<CartView> {
        let mut tx = self.db.begin().await?;
        require_own_entry(&mut tx, caller, cart_id).await?;
        cart::delete_entry(&mut *tx, cart_id).await?;
        tx.commit().await?;

        self.view_cart(caller).await
    }

    /// Buys the whole cart from `shop_id`'s inventory.
    ///
    /// Prices come from the shop rows, the discount from the caller's tier.
    /// The sale rows and the emptied cart commit together or not at all.
    pub async fn checkout(&self, caller: Caller, shop_id: i64) -> DbResult<SaleReceipt> {
        let mut tx = self.db.begin().await?;

        let user = require_user(&mut tx, caller.user_id).await?;
        let entries = cart::lines_for_user(&mut *tx, caller.user_id).await?;
        if entries.is_empty() {
            warn!(user_id = caller.user_id, "Checkout with empty cart");
            return Err(CoreError::EmptyCart.into());
        }

        require_shop(&mut *tx, shop_id).await?;

        let tier = user.effective_tier();
        let lines: Vec<CommitLine> = entries
            .iter()
            .map(|e| CommitLine {
                stock_id: e.stock_id,
                quantity: e.quantity,
            })
            .collect();

        let ctx = CommitContext {
            shop_id,
            user_id: Some(user.user_id),
            customer_phone: user.phone_number.as_deref(),
            rate: tier.discount_rate(),
            sale_type: SaleType::Online,
            notes: None,
        };
        let receipt = commit_sale(&mut tx, &ctx, &lines).await?;

        cart::clear(&mut *tx, user.user_id).await?;
        tx.commit().await?;

        info!(
            user_id = user.user_id,
            shop_id,
            tier = %tier,
            transaction_ref = %receipt.transaction_ref,
            total_cents = receipt.total_cents,
            "Online checkout completed"
        );
        Ok(receipt)
    }
}

fn check_quantity(quantity: i64, min: i64) -> Result<(), ValidationError> {
    if quantity < min || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

async fn require_user(conn: &mut SqliteConnection, user_id: i64) -> DbResult<User> {
    fetch_user(conn, user_id)
        .await?
        .ok_or_else(|| DbError::not_found("User", user_id))
}

async fn require_own_entry(conn: &mut SqliteConnection, caller: Caller, cart_id: i64) -> DbResult<CartEntry> {
    match cart::fetch_entry(conn, cart_id).await? {
        Some(entry) if entry.user_id == caller.user_id => Ok(entry),
        _ => Err(DbError::not_found("CartEntry", cart_id)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::DbConfig;
    use shopline_core::{Role, Tier, MAX_CART_ITEMS};

    fn as_customer(user: &User) -> Caller {
        Caller::new(user.user_id, Role::Customer)
    }

    #[tokio::test]
    async fn test_add_merges_and_views_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let stock = testing::stock(&db, "Dune", 10, 999).await;
        let caller = as_customer(&shopper);

        db.carts().add_to_cart(caller, stock.stock_id, 2).await.unwrap();
        let view = db.carts().add_to_cart(caller, stock.stock_id, 3).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 5);
        assert_eq!(view.lines[0].item_name, "Dune");
        assert_eq!(view.item_count, 5);
        assert_eq!(view.total_cents, 4995);
    }

    #[tokio::test]
    async fn test_add_checks_catalog_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let stock = testing::stock(&db, "Dune", 2, 999).await;
        let caller = as_customer(&shopper);

        let err = db.carts().add_to_cart(caller, stock.stock_id, 3).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientOwnerStock { .. })));

        let err = db.carts().add_to_cart(caller, 9_999, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = db.carts().add_to_cart(caller, stock.stock_id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert!(db.carts().view_cart(caller).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_holds_at_most_max_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let caller = as_customer(&shopper);

        let mut first = None;
        for i in 0..MAX_CART_ITEMS {
            let stock = testing::stock(&db, &format!("Book {}", i), 5, 100).await;
            db.carts().add_to_cart(caller, stock.stock_id, 1).await.unwrap();
            first.get_or_insert(stock.stock_id);
        }
        let extra = testing::stock(&db, "One Too Many", 5, 100).await;

        let err = db.carts().add_to_cart(caller, extra.stock_id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Merging into an existing line does not add one.
        let view = db.carts().add_to_cart(caller, first.unwrap(), 1).await.unwrap();
        assert_eq!(view.lines.len(), MAX_CART_ITEMS);
        assert_eq!(view.item_count, MAX_CART_ITEMS as i64 + 1);
    }

    #[tokio::test]
    async fn test_update_clamps_and_removes_at_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let stock = testing::stock(&db, "Dune", 4, 999).await;
        let caller = as_customer(&shopper);

        let view = db.carts().add_to_cart(caller, stock.stock_id, 1).await.unwrap();
        let cart_id = view.lines[0].cart_id;

        let view = db.carts().update_quantity(caller, cart_id, 10).await.unwrap();
        assert_eq!(view.lines[0].quantity, 4);

        let view = db.carts().update_quantity(caller, cart_id, 0).await.unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_update_to_zero_when_stock_runs_out() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = testing::pos_fixture(&db, 50, 999).await;
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let caller = as_customer(&shopper);

        // free one catalog unit so the item can be carted
        db.allocations()
            .reallocate(fx.admin, fx.shop_stock_id, 49, None)
            .await
            .unwrap();
        let view = db.carts().add_to_cart(caller, fx.stock.stock_id, 1).await.unwrap();
        let cart_id = view.lines[0].cart_id;

        db.allocations()
            .reallocate(fx.admin, fx.shop_stock_id, 50, None)
            .await
            .unwrap();
        let view = db.carts().update_quantity(caller, cart_id, 2).await.unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_entries_of_other_users_are_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let alice = testing::customer(&db, "5550100", Tier::None).await;
        let bob = testing::customer(&db, "5550101", Tier::None).await;
        let stock = testing::stock(&db, "Dune", 10, 999).await;

        let view = db
            .carts()
            .add_to_cart(as_customer(&alice), stock.stock_id, 1)
            .await
            .unwrap();
        let cart_id = view.lines[0].cart_id;

        let err = db
            .carts()
            .remove_from_cart(as_customer(&bob), cart_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = db
            .carts()
            .update_quantity(as_customer(&bob), cart_id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let view = db
            .carts()
            .remove_from_cart(as_customer(&alice), cart_id)
            .await
            .unwrap();
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_uses_tier_and_clears_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = testing::pos_fixture(&db, 20, 999).await;
        let shopper = testing::customer(&db, "5550100", Tier::Silver).await;
        let caller = as_customer(&shopper);

        db.carts().add_to_cart(caller, fx.stock.stock_id, 2).await.unwrap();
        let receipt = db.carts().checkout(caller, fx.shop.shop_id).await.unwrap();

        assert_eq!(receipt.sale_type, SaleType::Online);
        assert_eq!(receipt.subtotal_cents, 1998);
        assert_eq!(receipt.discount_cents, 200);
        assert_eq!(receipt.total_cents, 1798);

        let row = db.shop_stock().get_by_id(fx.shop_stock_id).await.unwrap();
        assert_eq!(row.quantity, 18);
        assert!(db.carts().view_cart(caller).await.unwrap().is_empty());

        let sales = db.sales().list_for_user(shopper.user_id).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].sale_type, SaleType::Online);
        assert_eq!(sales[0].customer_phone.as_deref(), Some("5550100"));
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart_and_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = testing::pos_fixture(&db, 1, 999).await;
        let shopper = testing::customer(&db, "5550100", Tier::None).await;
        let caller = as_customer(&shopper);

        db.carts().add_to_cart(caller, fx.stock.stock_id, 3).await.unwrap();

        let err = db.carts().checkout(caller, fx.shop.shop_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { line: 1, available: 1, requested: 3, .. })
        ));

        assert_eq!(db.carts().view_cart(caller).await.unwrap().lines.len(), 1);
        assert_eq!(db.shop_stock().get_by_id(fx.shop_stock_id).await.unwrap().quantity, 1);
        assert_eq!(db.sales().count_for_shop(fx.shop.shop_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = testing::pos_fixture(&db, 5, 999).await;
        let shopper = testing::customer(&db, "5550100", Tier::Gold).await;

        let err = db
            .carts()
            .checkout(as_customer(&shopper), fx.shop.shop_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }
}
