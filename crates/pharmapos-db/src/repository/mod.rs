//! # Repository Module
//!
//! Database repository implementations for PharmaPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.products().search("biogesic")                        │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, term)                                               │
//! │  ├── get(&self, id)                                                    │
//! │  ├── create(&self, input, default_tax)                                 │
//! │  └── replace(&self, id, input)                                         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Rules live in pharmapos-core; repositories only load and store.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, stock alerts
//! - [`customer::CustomerRepository`] - Customer CRUD
//! - [`user::UserRepository`] - Staff accounts
//! - [`discount::DiscountRepository`] - Discounts and their rules
//! - [`transaction::TransactionRepository`] - Atomic checkout and history
//! - [`suspended::SuspendedSaleRepository`] - Parked carts
//! - [`settings::SettingsRepository`] - Single-row store settings

pub mod customer;
pub mod discount;
pub mod product;
pub mod settings;
pub mod suspended;
pub mod transaction;
pub mod user;

use pharmapos_core::{ManualDiscount, ManualDiscountKind};

/// Splits a manual discount into its two nullable columns.
pub(crate) fn manual_discount_columns(
    discount: Option<ManualDiscount>,
) -> (Option<ManualDiscountKind>, Option<i64>) {
    match discount {
        Some(d) => (Some(d.kind), Some(d.value)),
        None => (None, None),
    }
}

/// Rebuilds a manual discount from its two nullable columns.
pub(crate) fn manual_discount_from_columns(
    kind: Option<ManualDiscountKind>,
    value: Option<i64>,
) -> Option<ManualDiscount> {
    match (kind, value) {
        (Some(kind), Some(value)) => Some(ManualDiscount { kind, value }),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use pharmapos_core::ProductCategory;

    use crate::repository::product::ProductInput;
    use crate::{Database, DbConfig};

    pub(crate) async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub(crate) fn product_input(sku: &str, price: i64, cost: i64, stock: i64) -> ProductInput {
        ProductInput {
            name: format!("Product {sku}"),
            generic_name: format!("Generic {sku}"),
            sku: sku.to_string(),
            // one 3-digit group per SKU byte keeps barcodes unique per SKU
            barcode: sku.bytes().map(|b| format!("{b:03}")).collect(),
            description: None,
            cost_price_cents: cost,
            selling_price_cents: price,
            tax_rate_bps: None,
            stock_quantity: stock,
            min_stock_level: 5,
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 31).unwrap(),
            batch_number: "LOT-1".to_string(),
            requires_prescription: false,
            category: ProductCategory::Medicine,
        }
    }
}
