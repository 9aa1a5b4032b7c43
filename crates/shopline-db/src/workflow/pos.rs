//! # POS Sale Workflow
//!
//! What the till does, in order:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. lookup_customer(phone)      → name, tier, discount (or not found)  │
//! │  2. price_line_item(...) × n    → display prices, nothing reserved     │
//! │  3. complete_sale(cart)         → one transaction, all-or-nothing      │
//! │  4. sales_history(shop, dates)  → read-only report                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1 and 2 are advisory. Step 3 re-reads every price and quantity from
//! the shop inventory, so whatever the till displayed is never trusted.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shopline_core::dto::{CompleteSaleRequest, CustomerLookupResponse, LineQuote, SaleReceipt};
use shopline_core::validation::{
    optional_text, validate_cart_size, validate_discount_rate, validate_phone,
    validate_sale_quantity,
};
use shopline_core::{
    line_subtotal, Caller, CoreError, Sale, SaleType, ValidationError, MAX_ITEM_QUANTITY,
};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::shop::require_shop;
use crate::repository::{shop_stock, user};
use crate::workflow::authorize_shop;
use crate::workflow::commit::{commit_sale, CommitContext, CommitLine};

/// POS operations for shop staff.
#[derive(Debug, Clone)]
pub struct PosWorkflow {
    db: Database,
}

impl PosWorkflow {
    pub fn new(db: Database) -> Self {
        PosWorkflow { db }
    }

    /// Finds the customer registered with `phone` and the discount they earn.
    ///
    /// An unknown number is a normal outcome (anonymous sale), reported with
    /// `success: false` and a 0% discount.
    pub async fn lookup_customer(&self, phone: &str) -> DbResult<CustomerLookupResponse> {
        let phone = validate_phone(phone)?;

        match user::fetch_by_phone(self.db.pool(), &phone).await? {
            Some(customer) => {
                debug!(user_id = customer.user_id, tier = %customer.tier, "Customer found");
                Ok(CustomerLookupResponse::found(&customer))
            }
            None => {
                debug!("No customer for phone");
                Ok(CustomerLookupResponse::not_found())
            }
        }
    }

    /// Quotes one line from the shop's own prices. Nothing is reserved.
    ///
    /// Only staff who may sell at the shop see its prices.
    pub async fn price_line_item(
        &self,
        caller: Caller,
        shop_id: i64,
        stock_id: i64,
        quantity: i64,
    ) -> DbResult<LineQuote> {
        validate_sale_quantity(quantity)?;

        let shop = require_shop(self.db.pool(), shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let row = shop_stock::fetch_for_item(self.db.pool(), shop_id, stock_id)
            .await?
            .ok_or_else(|| {
                DbError::not_found("ShopStock", format!("shop {} stock {}", shop_id, stock_id))
            })?;

        let unit_price = row.unit_price();
        Ok(LineQuote {
            stock_id,
            item_name: row.item_name,
            unit_price,
            quantity,
            subtotal: line_subtotal(unit_price, quantity)?,
        })
    }

    /// Commits a till cart as POS sales.
    ///
    /// ## Order of Checks
    /// 1. Empty cart → `EmptyCart`
    /// 2. Line quantities, discount rate, phone, notes → `Validation`
    /// 3. Shop exists → `NotFound`; caller may act on it → `Forbidden`
    /// 4. Per line inside the transaction → `NotFound` / `InsufficientStock`
    ///    / `ConcurrencyConflict`
    ///
    /// Steps 1-3 never write. Any failure in step 4 rolls back every line.
    pub async fn complete_sale(
        &self,
        caller: Caller,
        shop_id: i64,
        request: CompleteSaleRequest,
    ) -> DbResult<SaleReceipt> {
        if request.items.is_empty() {
            warn!(shop_id, "Rejected sale with empty cart");
            return Err(CoreError::EmptyCart.into());
        }
        validate_cart_size(request.items.len())?;

        let lines = request
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                validate_sale_quantity(item.quantity).map_err(|_| ValidationError::OutOfRange {
                    field: format!("items[{}].quantity", index + 1),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                })?;
                Ok(CommitLine {
                    stock_id: item.stock_id,
                    quantity: item.quantity,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let rate = validate_discount_rate(request.discount_rate)?;
        let phone = match request.customer_phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(p) => Some(validate_phone(p)?),
        };
        let notes = optional_text("notes", request.notes.as_deref(), 500)?;

        let mut tx = self.db.begin().await?;

        let shop = require_shop(&mut *tx, shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let user_id = match phone.as_deref() {
            Some(p) => user::fetch_by_phone(&mut *tx, p).await?.map(|u| u.user_id),
            None => None,
        };

        let ctx = CommitContext {
            shop_id,
            user_id,
            customer_phone: phone.as_deref(),
            rate,
            sale_type: SaleType::Pos,
            notes: notes.as_deref(),
        };
        let receipt = commit_sale(&mut tx, &ctx, &lines).await?;

        tx.commit().await?;

        info!(
            shop_id,
            operator = caller.user_id,
            transaction_ref = %receipt.transaction_ref,
            lines = receipt.lines.len(),
            total_cents = receipt.total_cents,
            "POS sale completed"
        );
        Ok(receipt)
    }

    /// Sales of a shop, newest first.
    ///
    /// Bounds are calendar days (UTC) and inclusive: `to` covers the whole
    /// of that day.
    pub async fn sales_history(
        &self,
        caller: Caller,
        shop_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Sale>> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ValidationError::InvalidFormat {
                    field: "from".to_string(),
                    reason: format!("{} is after {}", from, to),
                }
                .into());
            }
        }

        let shop = require_shop(self.db.pool(), shop_id).await?;
        authorize_shop(&caller, &shop)?;

        let from = from.map(start_of_day);
        let to = to.map(end_of_day).transpose()?;

        self.db.sales().list_for_shop(shop_id, from, to).await
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> DbResult<DateTime<Utc>> {
    day.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|t| t.and_utc())
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "to".to_string(),
                reason: format!("{} has no end of day", day),
            }
            .into()
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
