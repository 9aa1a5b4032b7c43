//! # Seed Data Generator
//!
//! Populates a development database with accounts, shops and stock.
//!
//! ## Usage
//! ```bash
//! # Default: 60 catalog items into ./shopline_dev.db
//! cargo run -p shopline-db --bin seed
//!
//! # More items
//! cargo run -p shopline-db --bin seed -- --stocks 300
//!
//! # Specify database path
//! cargo run -p shopline-db --bin seed -- --db ./data/shopline.db
//! ```
//!
//! ## Generated Data
//! - One admin, two proprietors each owning one shop
//! - One customer per tier, phones 5550100 to 5550104
//! - Catalog items across books, games and toys
//! - Roughly a third of every item allocated to each shop
//!
//! Every account uses the password `shopline-dev`.

use shopline_core::{Caller, Category, Role, Tier};
use shopline_db::{Database, DbConfig, NewStock, NewUser};
use std::env;

const PASSWORD: &str = "shopline-dev";

const TITLES: &[(Category, &[&str])] = &[
    (
        Category::Book,
        &[
            "Dune",
            "Neuromancer",
            "The Hobbit",
            "Emma",
            "Beloved",
            "Middlemarch",
            "Persuasion",
            "Solaris",
        ],
    ),
    (
        Category::Game,
        &[
            "Catan",
            "Carcassonne",
            "Azul",
            "Ticket to Ride",
            "Pandemic",
            "Codenames",
        ],
    ),
    (
        Category::Toy,
        &[
            "Wooden Train",
            "Kite",
            "Yo-yo",
            "Spinning Top",
            "Marble Run",
            "Rubber Duck",
        ],
    ),
];

const EDITIONS: &[&str] = &["", "Deluxe", "Travel", "Collector's"];

const CUSTOMERS: &[(&str, &str, Tier)] = &[
    ("Ada", "5550100", Tier::None),
    ("Brook", "5550101", Tier::Bronze),
    ("Cyd", "5550102", Tier::Silver),
    ("Dale", "5550103", Tier::Gold),
    ("Eli", "5550104", Tier::Platinum),
];

fn account(first: &str, email: &str, phone: Option<&str>, role: Role, tier: Tier) -> NewUser {
    NewUser {
        first_name: first.to_string(),
        last_name: "Sample".to_string(),
        email: email.to_string(),
        phone_number: phone.map(str::to_string),
        password: PASSWORD.to_string(),
        role,
        tier,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./shopline_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stocks" | "-s" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stocks <N>   Number of catalog items (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopline_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopline Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Stocks:   {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !db.users().list(None).await?.is_empty() {
        println!("⚠ Database already has accounts");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Accounts
    let admin = db
        .users()
        .register(account("Admin", "admin@shopline.test", None, Role::Admin, Tier::None))
        .await?;
    let admin = Caller::new(admin.user_id, Role::Admin);

    let mut shops = Vec::new();
    for (name, location, email) in [
        ("Northside Books & Games", "12 Harbour Rd", "north@shopline.test"),
        ("Southgate Toys", "88 Market St", "south@shopline.test"),
    ] {
        let owner = db
            .users()
            .register(account("Owner", email, None, Role::Proprietor, Tier::None))
            .await?;
        shops.push(db.shops().create(name, location, owner.user_id).await?);
    }
    println!("✓ Created admin, {} proprietors and shops", shops.len());

    for (first, phone, tier) in CUSTOMERS {
        let email = format!("{}@shopline.test", first.to_lowercase());
        db.users()
            .register(account(first, &email, Some(phone), Role::Customer, *tier))
            .await?;
    }
    println!("✓ Created {} customers (one per tier)", CUSTOMERS.len());

    // Catalog and allocations
    println!();
    println!("Generating stock...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut allocated = 0;

    'outer: for edition in EDITIONS {
        for (category, titles) in TITLES {
            for title in titles.iter() {
                if generated >= count {
                    break 'outer;
                }

                let new = generate_stock(*category, title, edition, generated);
                let quantity = new.quantity;
                let stock = match db.stocks().create(new).await {
                    Ok(stock) => stock,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", title, e);
                        continue;
                    }
                };
                generated += 1;

                for shop in &shops {
                    let units = quantity / 3;
                    if units == 0 {
                        continue;
                    }
                    db.allocations()
                        .allocate(admin, stock.stock_id, shop.shop_id, units)
                        .await?;
                    allocated += units;
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} stock items in {:?}", generated, elapsed);
    println!("  Allocated {} units across {} shops", allocated, shops.len());

    // Spot check
    println!();
    println!("Verifying lookup...");
    let lookup = db.pos().lookup_customer("5550102").await?;
    println!(
        "  5550102 → {} ({}, {}% off)",
        lookup.customer_name.unwrap_or_default(),
        lookup.customer_tier,
        lookup.tier_discount
    );

    println!();
    println!("✓ Seed complete! Password for every account: {}", PASSWORD);

    Ok(())
}

/// Builds one catalog item with deterministic pseudo-random numbers.
fn generate_stock(category: Category, title: &str, edition: &str, seed: usize) -> NewStock {
    let name = if edition.is_empty() {
        title.to_string()
    } else {
        format!("{} ({})", title, edition)
    };

    // $4.99 - $49.99
    let sell_price_cents = 499 + ((seed * 37) % 46) as i64 * 100;
    // 50-70% of sell price
    let buy_price_cents = sell_price_cents * (50 + (seed % 21) as i64) / 100;

    NewStock {
        name,
        category,
        buy_price_cents,
        sell_price_cents,
        quantity: 10 + (seed % 91) as i64,
        source: "Seed Wholesale".to_string(),
        description: None,
    }
}
