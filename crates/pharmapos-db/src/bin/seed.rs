//! # Seed Data Generator
//!
//! Populates the database with a demo pharmacy catalog and a few discounts.
//!
//! ## Usage
//! ```bash
//! # Generate the full catalog (default 200 products)
//! cargo run -p pharmapos-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p pharmapos-db --bin seed -- --count 50
//!
//! # Specify database path
//! cargo run -p pharmapos-db --bin seed -- --db ./data/pharmapos.db
//! ```
//!
//! ## Generated Products
//! `{brand} {strength}` for every brand below, e.g. "Biogesic 500mg":
//! - Medicine (analgesics, antibiotics, antihistamines ...)
//! - Supplement (vitamins, minerals)
//! - Equipment (thermometers, BP monitors, masks)
//!
//! Each product has:
//! - Unique SKU: `{CATEGORY}-{BRAND}-{INDEX}`
//! - Digits-only barcode
//! - Price: $0.50 - $20.49, cost 55-75% of price
//! - Stock 0 - 120, some of it near or below the reorder level
//! - Expiry between 10 days and ~2 years out, so the alerts have data

use chrono::{Duration, Utc};
use std::env;

use pharmapos_core::discount::{DiscountRuleType, DiscountType};
use pharmapos_core::ProductCategory;
use pharmapos_db::{Database, DbConfig, DiscountInput, DiscountRuleInput, ProductInput};

/// (code, category, [(brand, generic, prescription)])
const CATALOG: &[(&str, ProductCategory, &[(&str, &str, bool)])] = &[
    (
        "MED",
        ProductCategory::Medicine,
        &[
            ("Biogesic", "Paracetamol", false),
            ("Tempra", "Paracetamol", false),
            ("Alaxan", "Ibuprofen + Paracetamol", false),
            ("Advil", "Ibuprofen", false),
            ("Neozep", "Phenylephrine + Chlorphenamine", false),
            ("Bioflu", "Phenylephrine + Paracetamol", false),
            ("Solmux", "Carbocisteine", false),
            ("Loperamide", "Loperamide", false),
            ("Amoxil", "Amoxicillin", true),
            ("Augmentin", "Co-Amoxiclav", true),
            ("Zithromax", "Azithromycin", true),
            ("Cetirizine", "Cetirizine", false),
            ("Allerta", "Loratadine", false),
            ("Losartan", "Losartan Potassium", true),
            ("Metformin", "Metformin", true),
            ("Amlodipine", "Amlodipine", true),
        ],
    ),
    (
        "SUP",
        ProductCategory::Supplement,
        &[
            ("Enervon", "Multivitamins", false),
            ("Centrum", "Multivitamins + Minerals", false),
            ("Poten-Cee", "Ascorbic Acid", false),
            ("Ferrous", "Ferrous Sulfate", false),
            ("Caltrate", "Calcium + Vitamin D", false),
            ("Myra E", "Vitamin E", false),
        ],
    ),
    (
        "EQP",
        ProductCategory::Equipment,
        &[
            ("Digital Thermometer", "Thermometer", false),
            ("BP Monitor", "Blood Pressure Monitor", false),
            ("Face Mask", "Surgical Mask", false),
            ("Glucometer Strips", "Glucose Test Strips", false),
        ],
    ),
];

/// Strength / pack variants
const VARIANTS: &[(&str, i64)] = &[
    ("250mg", 0),
    ("500mg", 150),
    ("Syrup 60ml", 400),
    ("Box of 10", 900),
    ("Box of 20", 1600),
];

/// Tax rates in basis points
const TAX_RATES: &[u32] = &[0, 500, 1200];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./pharmapos_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("PharmaPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./pharmapos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("PharmaPOS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let default_tax = db.settings().get().await?.default_tax_rate_bps;
    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut first_medicine: Option<String> = None;

    'catalog: for (category_idx, (code, category, brands)) in CATALOG.iter().enumerate() {
        for (brand_idx, (brand, generic, rx)) in brands.iter().enumerate() {
            for (variant_idx, (variant, price_addon)) in VARIANTS.iter().enumerate() {
                if generated >= count {
                    break 'catalog;
                }

                let seed = category_idx * 1000 + brand_idx * 10 + variant_idx;
                let input = generate_product(code, *category, brand, generic, *rx, variant, *price_addon, seed);

                match db.products().create(&input, default_tax).await {
                    Ok(product) => {
                        if *category == ProductCategory::Medicine && first_medicine.is_none() {
                            first_medicine = Some(product.id);
                        }
                        generated += 1;
                    }
                    Err(e) => eprintln!("Failed to insert {}: {}", input.sku, e),
                }

                if generated > 0 && generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    seed_discounts(&db, first_medicine).await?;

    println!();
    println!("Alerts:");
    println!("  Low stock: {}", db.products().low_stock().await?.len());
    println!(
        "  Expiring within 30 days: {}",
        db.products().expiring(30, Utc::now().date_naive()).await?.len()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// One automatic category discount, one coupon, one buy-2-take-1 promo.
async fn seed_discounts(
    db: &Database,
    promo_product: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !db.discounts().list().await?.is_empty() {
        return Ok(());
    }

    let base = |name: &str, kind: DiscountType, value: i64| DiscountInput {
        organization_id: None,
        name: name.to_string(),
        code: None,
        discount_type: kind,
        value,
        start_date: None,
        end_date: None,
        is_active: true,
        rules: None,
        discount_rules: vec![],
    };

    let mut vitamins = base("Vitamin Week", DiscountType::Percentage, 1000);
    vitamins.discount_rules.push(DiscountRuleInput {
        rule_type: DiscountRuleType::Category,
        product_id: None,
        category: Some(ProductCategory::Supplement.as_str().to_string()),
    });
    db.discounts().create(vitamins).await?;

    let mut senior = base("Senior Citizen Coupon", DiscountType::Percentage, 2000);
    senior.code = Some("SENIOR20".to_string());
    senior.end_date = Some(Utc::now() + Duration::days(365));
    db.discounts().create(senior).await?;

    if let Some(product_id) = promo_product {
        let mut promo = base("Buy 2 Take 1", DiscountType::BuyXTakeY, 0);
        promo.rules = Some(serde_json::json!({ "buy": 2, "take": 1 }));
        promo.discount_rules.push(DiscountRuleInput {
            rule_type: DiscountRuleType::Product,
            product_id: Some(product_id),
            category: None,
        });
        db.discounts().create(promo).await?;
    }

    println!("✓ Seeded discounts (coupon code: SENIOR20)");
    Ok(())
}

/// Generates a single product with realistic data.
#[allow(clippy::too_many_arguments)]
fn generate_product(
    code: &str,
    category: ProductCategory,
    brand: &str,
    generic: &str,
    requires_prescription: bool,
    variant: &str,
    price_addon: i64,
    seed: usize,
) -> ProductInput {
    let today = Utc::now().date_naive();

    let prefix: String = brand
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", code, prefix, seed);

    // 13 digits, no checksum
    let barcode = format!("480{:010}", seed);

    // $0.50 - $4.49 + variant addon
    let price_cents = 50 + ((seed * 37) % 400) as i64 + price_addon;
    let cost_pct = 55 + (seed % 21) as i64;
    let cost_cents = price_cents * cost_pct / 100;

    let stock_quantity = ((seed * 13) % 121) as i64;
    let min_stock_level = 10;
    let expiry_date = today + Duration::days(10 + ((seed * 29) % 720) as i64);

    ProductInput {
        name: format!("{} {}", brand, variant),
        generic_name: generic.to_string(),
        sku,
        barcode,
        description: None,
        cost_price_cents: cost_cents,
        selling_price_cents: price_cents,
        tax_rate_bps: Some(TAX_RATES[seed % TAX_RATES.len()]),
        stock_quantity,
        min_stock_level,
        expiry_date,
        batch_number: format!("LOT-{}-{:03}", today.format("%y%m"), seed % 1000),
        requires_prescription,
        category,
    }
}
