//! # Data Transfer Objects
//!
//! JSON request and response bodies of the Shopline HTTP surface.
//!
//! All payloads are camelCase. The POS lookup and quote responses keep the
//! shape the till frontend already consumes (decimal `unitPrice`, `subtotal`,
//! `tierDiscount`); everything else reports money in integer cents like the
//! domain records.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{LinePrice, SaleTotals};
use crate::validation::ValidationResult;
use crate::types::{CartLine, SaleType, ShopStock, StockLevels, Tier, User};

// =============================================================================
// POS: Customer Lookup
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLookupRequest {
    pub phone: String,
}

/// Result of a phone lookup. `success: false` is a normal answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLookupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default = "default_tier_name")]
    pub customer_tier: String,
    /// Percentage, e.g. `10.0` for Silver.
    pub tier_discount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_tier_name() -> String {
    Tier::None.to_string()
}

impl CustomerLookupResponse {
    pub fn found(user: &User) -> Self {
        let tier = user.effective_tier();
        CustomerLookupResponse {
            success: true,
            customer_name: Some(user.full_name()),
            customer_tier: tier.to_string(),
            tier_discount: tier.discount_rate().percentage(),
            message: None,
        }
    }

    pub fn not_found() -> Self {
        CustomerLookupResponse {
            success: false,
            customer_name: None,
            customer_tier: default_tier_name(),
            tier_discount: 0.0,
            message: Some("Customer not found".to_string()),
        }
    }
}

// =============================================================================
// POS: Line Quote
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub stock_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PricingResponse {
    pub fn priced(
        item_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        subtotal: Money,
    ) -> Self {
        PricingResponse {
            success: true,
            item_name: Some(item_name.into()),
            quantity: Some(quantity),
            unit_price: Some(unit_price.to_major_f64()),
            subtotal: Some(subtotal.to_major_f64()),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        PricingResponse {
            success: false,
            item_name: None,
            quantity: None,
            unit_price: None,
            subtotal: None,
            message: Some(message.into()),
        }
    }
}

/// Priced line as computed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineQuote {
    pub stock_id: i64,
    pub item_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

impl From<LineQuote> for PricingResponse {
    fn from(quote: LineQuote) -> Self {
        PricingResponse::priced(quote.item_name, quote.quantity, quote.unit_price, quote.subtotal)
    }
}

// =============================================================================
// POS: Complete Sale
// =============================================================================

/// One line of a submitted POS cart.
///
/// Only `stock_id` and `quantity` are used. Name and price fields echo what
/// the till displayed and are ignored in favour of the shop's stored values.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PosCartItem {
    pub stock_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
}

impl PosCartItem {
    pub fn new(stock_id: i64, quantity: i64) -> Self {
        PosCartItem {
            stock_id,
            item_name: None,
            quantity,
            unit_price: None,
            subtotal: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSaleRequest {
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Percentage 0-100, usually the `tierDiscount` from the lookup.
    #[serde(default)]
    pub discount_rate: f64,
    #[serde(default)]
    pub items: Vec<PosCartItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One committed sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub sale_id: i64,
    pub stock_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_price_cents: i64,
}

impl ReceiptLine {
    pub fn new(sale_id: i64, stock_id: i64, item_name: String, line: &LinePrice) -> Self {
        ReceiptLine {
            sale_id,
            stock_id,
            item_name,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            discount_cents: line.discount.cents(),
            total_price_cents: line.total.cents(),
        }
    }
}

/// Everything committed by one sale or checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub transaction_ref: String,
    pub shop_id: i64,
    pub sale_type: SaleType,
    pub sale_ids: Vec<i64>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub item_count: i64,
}

impl SaleReceipt {
    pub fn new(
        transaction_ref: String,
        shop_id: i64,
        sale_type: SaleType,
        lines: Vec<ReceiptLine>,
        totals: SaleTotals,
    ) -> Self {
        SaleReceipt {
            transaction_ref,
            shop_id,
            sale_type,
            sale_ids: lines.iter().map(|l| l.sale_id).collect(),
            lines,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            item_count: totals.item_count,
        }
    }
}

// =============================================================================
// Allocation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    pub stock_id: i64,
    pub shop_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReallocateRequest {
    pub new_quantity: i64,
    /// Version the caller last saw; omitted means "whatever is current".
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// State of both sides of a transfer after it committed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    /// `None` once the shop row is gone (deallocation).
    pub shop_stock: Option<ShopStock>,
    pub stock_levels: StockLevels,
}

// =============================================================================
// Shopping Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub stock_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Shop whose inventory fulfils the order.
    pub shop_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
    pub item_count: i64,
}

fn cart_overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

impl CartView {
    pub fn new(lines: Vec<CartLine>) -> ValidationResult<Self> {
        let mut total = Money::zero();
        let mut item_count: i64 = 0;
        for line in &lines {
            total = total
                .checked_add(line.line_total()?)
                .ok_or_else(|| cart_overflow("cart total"))?;
            item_count = item_count
                .checked_add(line.quantity)
                .ok_or_else(|| cart_overflow("cart item count"))?;
        }
        Ok(CartView {
            lines,
            total_cents: total.cents(),
            item_count,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use chrono::Utc;

    #[test]
    fn test_cart_item_ignores_missing_hints() {
        let item: PosCartItem =
            serde_json::from_str(r#"{"stockId": 4, "quantity": 2}"#).unwrap();
        assert_eq!(item.stock_id, 4);
        assert_eq!(item.quantity, 2);
        assert!(item.unit_price.is_none());

        let item: PosCartItem = serde_json::from_str(
            r#"{"stockId": 4, "itemName": "Catan", "quantity": 2, "unitPrice": 0.01, "subtotal": 0.02}"#,
        )
        .unwrap();
        assert_eq!(item.item_name.as_deref(), Some("Catan"));
    }

    #[test]
    fn test_lookup_found_reports_tier_discount() {
        let user = User {
            user_id: 1,
            first_name: "Sam".to_string(),
            last_name: "Reed".to_string(),
            email: "sam@example.com".to_string(),
            phone_number: Some("5550100".to_string()),
            role: Role::Customer,
            tier: Tier::Silver,
            password_hash: String::new(),
            created_date: Utc::now(),
        };
        let response = CustomerLookupResponse::found(&user);
        assert!(response.success);
        assert_eq!(response.customer_name.as_deref(), Some("Sam Reed"));
        assert_eq!(response.customer_tier, "Silver");
        assert!((response.tier_discount - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lookup_not_found_defaults_to_none_tier() {
        let json = serde_json::to_value(CustomerLookupResponse::not_found()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["customerTier"], "None");
        assert_eq!(json["tierDiscount"], 0.0);
        assert!(json.get("customerName").is_none());
    }

    #[test]
    fn test_pricing_response_uses_decimal_prices() {
        let json = serde_json::to_value(PricingResponse::priced(
            "Dune",
            2,
            Money::from_cents(999),
            Money::from_cents(1998),
        ))
        .unwrap();
        assert_eq!(json["itemName"], "Dune");
        assert_eq!(json["unitPrice"], 9.99);
        assert_eq!(json["subtotal"], 19.98);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_cart_view_totals() {
        let line = |cart_id, quantity, unit_price_cents| CartLine {
            cart_id,
            stock_id: cart_id,
            item_name: format!("item {}", cart_id),
            quantity,
            unit_price_cents,
            available: 10,
        };
        let view = CartView::new(vec![line(1, 2, 999), line(2, 1, 500)]).unwrap();
        assert_eq!(view.total_cents, 2498);
        assert_eq!(view.item_count, 3);
        assert!(!view.is_empty());

        let err = CartView::new(vec![line(1, 999, i64::MAX / 100)]).unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { .. }));
    }
}
