//! # Demo Market Seeder
//!
//! Populates a database with demo restaurants, their tokens and a few
//! investor positions for frontend development.
//!
//! ## Usage
//! ```bash
//! # Seed ./fodi_dev.db
//! cargo run -p fodi-market --bin seed
//!
//! # Specify database path
//! cargo run -p fodi-market --bin seed -- --db ./data/fodi.db
//! ```
//!
//! Each restaurant gets a 1000-token supply at the base price; the demo
//! investors then buy in, which moves every price through the normal engine.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fodi_core::PricingConfig;
use fodi_db::{Database, DbConfig, NewBusiness};
use fodi_market::{Market, NoopPublisher};

/// (name, category, city)
const RESTAURANTS: &[(&str, &str, &str)] = &[
    ("Pizza Palace", "Italian", "Almaty"),
    ("Sushi Master", "Japanese", "Almaty"),
    ("Burger Barn", "American", "Astana"),
    ("Plov Center", "Central Asian", "Tashkent"),
    ("Taco Fiesta", "Mexican", "Astana"),
    ("Curry House", "Indian", "Bishkek"),
];

const DEMO_SUPPLY: i64 = 1000;

/// (user, restaurant index, tokens)
const POSITIONS: &[(&str, usize, i64)] = &[
    ("demo-alice", 0, 25),
    ("demo-alice", 1, 10),
    ("demo-bob", 0, 40),
    ("demo-bob", 3, 15),
    ("demo-carol", 2, 5),
    ("demo-carol", 4, 60),
    ("demo-dave", 0, 12),
    ("demo-dave", 5, 30),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./fodi_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fodi Market Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fodi_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Fodi Market Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("failed to open {db_path}"))?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.businesses().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} businesses", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let market = Market::new(db.clone(), PricingConfig::default(), Arc::new(NoopPublisher));

    println!();
    println!("Creating restaurants...");

    let mut business_ids = Vec::with_capacity(RESTAURANTS.len());
    for (idx, (name, category, city)) in RESTAURANTS.iter().enumerate() {
        let business = db
            .businesses()
            .create(NewBusiness {
                owner_id: format!("demo-owner-{}", idx + 1),
                name: (*name).to_string(),
                description: Some(format!("{name}, a demo {category} restaurant")),
                category: Some((*category).to_string()),
                city: Some((*city).to_string()),
            })
            .await
            .with_context(|| format!("failed to create {name}"))?;

        let symbol = fodi_core::token::generate_token_symbol(name);
        let token = market
            .tokens()
            .create_token(&business.id, &symbol, 0, DEMO_SUPPLY)
            .await
            .with_context(|| format!("failed to issue token for {name}"))?;

        println!("  {:<14} {:<6} supply {:>5} @ {}", name, token.symbol, token.total_supply, token.price());
        business_ids.push(business.id);
    }

    println!();
    println!("Subscribing demo investors...");

    for (user, idx, tokens) in POSITIONS {
        let Some(business_id) = business_ids.get(*idx) else {
            continue;
        };

        match market.subscriptions().subscribe(user, business_id, *tokens).await {
            Ok(receipt) => println!(
                "  {:<11} bought {:>3} {:<5} for {:>9}, price now {}",
                user,
                tokens,
                receipt.token.symbol,
                receipt.transaction.amount().to_string(),
                receipt.token.price()
            ),
            Err(e) => eprintln!("  {user} failed to subscribe: {e}"),
        }
    }

    println!();
    println!("Final prices:");
    for token in market.tokens().list_tokens().await? {
        println!(
            "  {:<6} supply {:>5}  price {:>8}  cap {}",
            token.symbol,
            token.total_supply,
            token.price().to_string(),
            token.market_cap()
        );
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
