//! Fixtures shared by the repository and workflow tests.

use shopline_core::dto::{CompleteSaleRequest, PosCartItem};
use shopline_core::{Caller, Category, Role, Shop, Stock, Tier, User};

use crate::repository::stock::NewStock;
use crate::repository::user::NewUser;
use crate::Database;

fn account(email: &str, phone: Option<&str>, role: Role, tier: Tier) -> NewUser {
    NewUser {
        first_name: "Test".to_string(),
        last_name: role.as_str().to_string(),
        email: email.to_string(),
        phone_number: phone.map(str::to_string),
        password: "correct horse".to_string(),
        role,
        tier,
    }
}

pub(crate) async fn admin(db: &Database) -> Caller {
    let user = db
        .users()
        .register(account("admin@example.com", None, Role::Admin, Tier::None))
        .await
        .unwrap();
    Caller::new(user.user_id, Role::Admin)
}

pub(crate) async fn proprietor(db: &Database, email: &str) -> User {
    db.users()
        .register(account(email, None, Role::Proprietor, Tier::None))
        .await
        .unwrap()
}

pub(crate) async fn customer(db: &Database, phone: &str, tier: Tier) -> User {
    db.users()
        .register(account(
            &format!("{}@example.com", phone),
            Some(phone),
            Role::Customer,
            tier,
        ))
        .await
        .unwrap()
}

pub(crate) async fn shop(db: &Database, proprietor_id: i64) -> Shop {
    db.shops()
        .create("Corner Books", "1 Main St", proprietor_id)
        .await
        .unwrap()
}

pub(crate) async fn stock(db: &Database, name: &str, quantity: i64, sell_price_cents: i64) -> Stock {
    db.stocks()
        .create(NewStock {
            name: name.to_string(),
            category: Category::Book,
            buy_price_cents: (sell_price_cents / 2).max(1),
            sell_price_cents,
            quantity,
            source: "Wholesale".to_string(),
            description: None,
        })
        .await
        .unwrap()
}

/// A shop holding `allocated` units of "Dune" out of 50 catalog units.
pub(crate) struct PosFixture {
    pub admin: Caller,
    pub owner: User,
    pub shop: Shop,
    /// Re-read after allocation: `quantity` is what remains unallocated.
    pub stock: Stock,
    pub shop_stock_id: i64,
}

pub(crate) async fn pos_fixture(db: &Database, allocated: i64, sell_price_cents: i64) -> PosFixture {
    let admin = admin(db).await;
    let owner = proprietor(db, "owner@example.com").await;
    let shop = shop(db, owner.user_id).await;
    let stock = stock(db, "Dune", 50, sell_price_cents).await;

    let response = db
        .allocations()
        .allocate(admin, stock.stock_id, shop.shop_id, allocated)
        .await
        .unwrap();
    let shop_stock_id = response.shop_stock.unwrap().shop_stock_id;
    let stock = db.stocks().get_by_id(stock.stock_id).await.unwrap();

    PosFixture {
        admin,
        owner,
        shop,
        stock,
        shop_stock_id,
    }
}

pub(crate) fn sale_request(phone: Option<&str>, items: &[(i64, i64)]) -> CompleteSaleRequest {
    CompleteSaleRequest {
        customer_phone: phone.map(str::to_string),
        discount_rate: 0.0,
        items: items
            .iter()
            .map(|&(stock_id, quantity)| PosCartItem::new(stock_id, quantity))
            .collect(),
        notes: None,
    }
}
