//! # Domain Types
//!
//! Core domain records used throughout Shopline POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Stock       │   │   ShopStock     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  stock_id       │◄──│  stock_id (FK)  │   │  sale_id        │       │
//! │  │  quantity       │   │  shop_id (FK)   │   │  shop_id (FK)   │       │
//! │  │  (unallocated)  │   │  quantity       │   │  unit_price     │       │
//! │  │  buy/sell price │   │  price snapshot │   │  discount       │       │
//! │  │  version        │   │  version        │   │  transaction_ref│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Shop       │   │   CartEntry     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  role           │◄──│  proprietor_id  │   │  user_id (FK)   │       │
//! │  │  tier           │   │  name, location │   │  stock_id (FK)  │       │
//! │  │  phone (lookup) │   └─────────────────┘   │  quantity       │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record is keyed by an integer row id assigned by the store.
//! Sale rows committed together additionally share a UUID `transaction_ref`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::line_subtotal;
use crate::validation::ValidationResult;

// =============================================================================
// Enumerations
// =============================================================================

/// Product category of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Category {
    Book,
    Game,
    Toy,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Book => "Book",
            Category::Game => "Game",
            Category::Toy => "Toy",
        }
    }
}

/// Account role.
///
/// Admins manage everything, Proprietors run the till of the shops they own,
/// Customers shop online and may carry a loyalty [`Tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Role {
    Admin,
    Proprietor,
    Customer,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Proprietor => "Proprietor",
            Role::Customer => "Customer",
        }
    }
}

/// Customer loyalty level.
///
/// The discount each tier earns lives in [`crate::pricing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Tier {
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::None => "None",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::None
    }
}

/// Channel a sale was made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum SaleType {
    /// Rung up in person at a shop till.
    #[serde(rename = "POS")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "POS"))]
    Pos,
    /// Self-service cart checkout.
    Online,
}

impl SaleType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleType::Pos => "POS",
            SaleType::Online => "Online",
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ident, $field:literal, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ValidationError::InvalidFormat {
                    field: $field.to_string(),
                    reason: format!("unknown value '{}'", s),
                })
            }
        }
    };
}

impl_text_enum!(Category, "category", [Book, Game, Toy]);
impl_text_enum!(Role, "role", [Admin, Proprietor, Customer]);
impl_text_enum!(Tier, "tier", [None, Bronze, Silver, Gold, Platinum]);
impl_text_enum!(SaleType, "saleType", [Pos, Online]);

// =============================================================================
// Stock (Catalog Store)
// =============================================================================

/// A catalog item owned centrally.
///
/// `quantity` counts the units that have NOT been allocated to any shop.
/// Allocation moves units out of it, deallocation moves them back, so
/// `quantity + Σ shop_stock.quantity` stays constant across transfers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub stock_id: i64,
    pub name: String,
    pub category: Category,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    /// Unallocated units available to the owner.
    pub quantity: i64,
    pub source: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_date: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
}

impl Stock {
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    #[inline]
    pub fn buy_price(&self) -> Money {
        Money::from_cents(self.buy_price_cents)
    }
}

/// Quantity breakdown of one catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLevels {
    pub stock_id: i64,
    pub unallocated: i64,
    pub allocated: i64,
    pub total: i64,
}

/// Reference to a product picture. The file itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockImage {
    pub image_id: i64,
    pub stock_id: i64,
    pub image_url: String,
    pub description: Option<String>,
}

// =============================================================================
// Shop & Shop Allocation Ledger
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub shop_id: i64,
    pub name: String,
    pub location: String,
    pub proprietor_id: i64,
}

/// The portion of a catalog item placed at one shop.
///
/// Prices and source are snapshotted from the [`Stock`] when the allocation
/// is made, so later catalog price changes do not touch shop prices.
/// `item_name` is read through from the catalog row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShopStock {
    pub shop_stock_id: i64,
    pub shop_id: i64,
    pub stock_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    pub source: String,
    pub version: i64,
}

impl ShopStock {
    /// Authoritative unit price at this shop.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }
}

// =============================================================================
// User (Customer Directory)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub tier: Tier,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(as = "String")]
    pub created_date: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Loyalty tier that actually applies. Only customers earn discounts.
    pub fn effective_tier(&self) -> Tier {
        if self.role == Role::Customer {
            self.tier
        } else {
            Tier::None
        }
    }
}

// =============================================================================
// Sale Ledger
// =============================================================================

/// One committed line item. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub sale_id: i64,
    pub shop_id: i64,
    pub stock_id: i64,
    pub user_id: Option<i64>,
    /// Phone typed at the till, kept even when no account matches.
    pub customer_phone: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub sale_type: SaleType,
    pub notes: Option<String>,
    /// Shared by every row committed in the same transaction.
    pub transaction_ref: String,
}

impl Sale {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Shopping Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub cart_id: i64,
    pub user_id: i64,
    pub stock_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub date_added: DateTime<Utc>,
}

/// A cart entry joined with its catalog item, as shown to the shopper.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub cart_id: i64,
    pub stock_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Units the catalog can still supply.
    pub available: i64,
}

impl CartLine {
    pub fn line_total(&self) -> ValidationResult<Money> {
        line_subtotal(Money::from_cents(self.unit_price_cents), self.quantity)
    }
}

// =============================================================================
// Caller Identity
// =============================================================================

/// Who is invoking a workflow.
///
/// Resolved by the outer layer and passed explicitly; workflows never reach
/// into request context themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

impl Caller {
    pub const fn new(user_id: i64, role: Role) -> Self {
        Caller { user_id, role }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins manage every shop, proprietors only their own.
    pub fn can_manage_shop(&self, shop: &Shop) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Proprietor => shop.proprietor_id == self.user_id,
            Role::Customer => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(proprietor_id: i64) -> Shop {
        Shop {
            shop_id: 1,
            name: "Corner Books".to_string(),
            location: "1 Main St".to_string(),
            proprietor_id,
        }
    }

    #[test]
    fn test_tier_default_is_none() {
        assert_eq!(Tier::default(), Tier::None);
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("silver".parse::<Tier>().unwrap(), Tier::Silver);
        assert_eq!("POS".parse::<SaleType>().unwrap(), SaleType::Pos);
        assert_eq!("toy".parse::<Category>().unwrap(), Category::Toy);
        assert!("Diamond".parse::<Tier>().is_err());
    }

    #[test]
    fn test_sale_type_serializes_as_pos() {
        assert_eq!(serde_json::to_string(&SaleType::Pos).unwrap(), "\"POS\"");
        assert_eq!(serde_json::to_string(&SaleType::Online).unwrap(), "\"Online\"");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            user_id: 7,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: Some("5550001".to_string()),
            role: Role::Customer,
            tier: Tier::Gold,
            password_hash: "$argon2id$secret".to_string(),
            created_date: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"firstName\":\"Ada\""));
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_tier_only_applies_to_customers() {
        let mut user = User {
            user_id: 1,
            first_name: "P".to_string(),
            last_name: "Q".to_string(),
            email: "p@example.com".to_string(),
            phone_number: None,
            role: Role::Proprietor,
            tier: Tier::Platinum,
            password_hash: String::new(),
            created_date: Utc::now(),
        };
        assert_eq!(user.effective_tier(), Tier::None);
        user.role = Role::Customer;
        assert_eq!(user.effective_tier(), Tier::Platinum);
    }

    #[test]
    fn test_caller_shop_permissions() {
        assert!(Caller::new(99, Role::Admin).can_manage_shop(&shop(5)));
        assert!(Caller::new(5, Role::Proprietor).can_manage_shop(&shop(5)));
        assert!(!Caller::new(6, Role::Proprietor).can_manage_shop(&shop(5)));
        assert!(!Caller::new(5, Role::Customer).can_manage_shop(&shop(5)));
    }
}
