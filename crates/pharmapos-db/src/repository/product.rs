//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD (create / replace / delete)
//! - POS search and returns search
//! - Stock returns and shelf alerts
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier types: "para"                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  name LIKE / generic_name LIKE (any case)  OR  barcode = "para"        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Biogesic (Paracetamol)  ← generic name match                          │
//! │  Paracetamol Syrup       ← name match                                  │
//! │                                                                         │
//! │  A scanner sends the full barcode, which only matches exactly.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_search_query,
    validate_sku, validate_stock_level, validate_tax_rate_bps,
};
use pharmapos_core::{inventory, Product, ProductCategory, ValidationError};

// =============================================================================
// Input
// =============================================================================

/// Fields a client supplies when creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub generic_name: String,
    pub sku: String,
    pub barcode: String,
    #[serde(default)]
    pub description: Option<String>,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// Falls back to the store's default tax rate when absent.
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
    pub expiry_date: NaiveDate,
    pub batch_number: String,
    #[serde(default)]
    pub requires_prescription: bool,
    #[serde(default)]
    pub category: ProductCategory,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name("name", &self.name)?;
        validate_product_name("genericName", &self.generic_name)?;
        validate_sku(&self.sku)?;
        validate_barcode(&self.barcode)?;
        validate_price_cents("costPrice", self.cost_price_cents)?;
        validate_price_cents("sellingPrice", self.selling_price_cents)?;
        if let Some(bps) = self.tax_rate_bps {
            validate_tax_rate_bps(bps)?;
        }
        validate_stock_level("stockQuantity", self.stock_quantity)?;
        validate_stock_level("minStockLevel", self.min_stock_level)?;
        validate_product_name("batchNumber", &self.batch_number)?;
        Ok(())
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// POS search: name or generic name contains `term` (any case), or the
    /// barcode is exactly `term`. An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = validate_search_query(term).map_err(pharmapos_core::CoreError::from)?;

        debug!(term = %term, "Searching products");

        if term.is_empty() {
            return self.list().await;
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE instr(lower(name), lower(?1)) > 0
               OR instr(lower(generic_name), lower(?1)) > 0
               OR barcode = ?1
            ORDER BY name
            "#,
        )
        .bind(&term)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Returns dialog search: name or SKU contains `term` (any case).
    pub async fn search_for_return(&self, term: &str) -> DbResult<Vec<Product>> {
        let products = self.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| inventory::matches_return_search(p, term))
            .collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn find(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Like [`find`](Self::find) but a missing product is `NotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// * `Rule(Validation)` - bad input
    /// * `UniqueViolation` - SKU or barcode already exists
    pub async fn create(&self, input: &ProductInput, default_tax_rate_bps: u32) -> DbResult<Product> {
        input.validate().map_err(pharmapos_core::CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: input.name.trim().to_string(),
            generic_name: input.generic_name.trim().to_string(),
            sku: input.sku.trim().to_string(),
            barcode: input.barcode.trim().to_string(),
            description: input.description.clone(),
            cost_price_cents: input.cost_price_cents,
            selling_price_cents: input.selling_price_cents,
            tax_rate_bps: input.tax_rate_bps.unwrap_or(default_tax_rate_bps),
            stock_quantity: input.stock_quantity,
            min_stock_level: input.min_stock_level,
            expiry_date: input.expiry_date,
            batch_number: input.batch_number.trim().to_string(),
            requires_prescription: input.requires_prescription,
            category: input.category,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, generic_name, sku, barcode, description,
                cost_price_cents, selling_price_cents, tax_rate_bps,
                stock_quantity, min_stock_level, expiry_date, batch_number,
                requires_prescription, category, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.generic_name)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.expiry_date)
        .bind(&product.batch_number)
        .bind(product.requires_prescription)
        .bind(product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                let value = if field == "barcode" {
                    product.barcode.clone()
                } else {
                    product.sku.clone()
                };
                DbError::duplicate(field, value)
            }
            other => other,
        })?;

        info!(id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Replaces every editable field of a product.
    ///
    /// A missing tax rate keeps the stored one.
    pub async fn replace(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        input.validate().map_err(pharmapos_core::CoreError::from)?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                generic_name = ?3,
                sku = ?4,
                barcode = ?5,
                description = ?6,
                cost_price_cents = ?7,
                selling_price_cents = ?8,
                tax_rate_bps = COALESCE(?9, tax_rate_bps),
                stock_quantity = ?10,
                min_stock_level = ?11,
                expiry_date = ?12,
                batch_number = ?13,
                requires_prescription = ?14,
                category = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.generic_name.trim())
        .bind(input.sku.trim())
        .bind(input.barcode.trim())
        .bind(&input.description)
        .bind(input.cost_price_cents)
        .bind(input.selling_price_cents)
        .bind(input.tax_rate_bps)
        .bind(input.stock_quantity)
        .bind(input.min_stock_level)
        .bind(input.expiry_date)
        .bind(input.batch_number.trim())
        .bind(input.requires_prescription)
        .bind(input.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Deletes a product. Past transactions keep their line snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Puts returned units back on the shelf.
    ///
    /// Uses a delta update so a concurrent sale is never overwritten.
    pub async fn add_stock(&self, id: &str, quantity: i64) -> DbResult<Product> {
        let mut product = self.get(id).await?;
        inventory::add_stock(&mut product, quantity)?;

        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(id = %id, quantity, "Stock returned");
        self.get(id).await
    }

    /// Products at or below their alert level.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity <= min_stock_level ORDER BY stock_quantity",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Products expiring on or before `today + days`, soonest first.
    ///
    /// `days` outside `0..=MAX_EXPIRY_WINDOW_DAYS` is a validation error.
    pub async fn expiring(&self, days: i64, today: NaiveDate) -> DbResult<Vec<Product>> {
        let horizon = inventory::expiry_horizon(today, days)?;
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE expiry_date <= ?1 ORDER BY expiry_date",
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Counts products (for the dashboard and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product_input};
    use pharmapos_core::CoreError;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let created = db
            .products()
            .create(&product_input("PARA-500", 550, 300, 40), 500)
            .await
            .unwrap();

        let loaded = db.products().get(&created.id).await.unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.tax_rate_bps, 500);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let db = db().await;
        let input = product_input("AMOX-250", 1200, 800, 10);
        db.products().create(&input, 500).await.unwrap();

        let mut dup = input.clone();
        dup.barcode = "999".into();
        let err = db.products().create(&dup, 500).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let db = db().await;
        let mut input = product_input("BAD", 100, 50, 1);
        input.selling_price_cents = -1;
        assert!(matches!(
            db.products().create(&input, 500).await,
            Err(DbError::Rule(_))
        ));
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let mut bio = product_input("BIO-500", 600, 350, 10);
        bio.name = "Biogesic".into();
        bio.generic_name = "Paracetamol".into();
        bio.barcode = "4800016644511".into();
        db.products().create(&bio, 500).await.unwrap();
        db.products()
            .create(&product_input("VITC", 300, 100, 10), 500)
            .await
            .unwrap();

        let repo = db.products();
        assert_eq!(repo.search("paracet").await.unwrap().len(), 1);
        assert_eq!(repo.search("BIOGE").await.unwrap().len(), 1);
        assert_eq!(repo.search("4800016644511").await.unwrap().len(), 1);
        assert_eq!(repo.search("48000166").await.unwrap().len(), 0);
        assert_eq!(repo.search("").await.unwrap().len(), 2);
        assert_eq!(repo.search_for_return("bio-5").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_and_delete() {
        let db = db().await;
        let repo = db.products();
        let p = repo
            .create(&product_input("ORS", 250, 100, 10), 500)
            .await
            .unwrap();

        let mut edit = product_input("ORS", 275, 100, 12);
        edit.tax_rate_bps = Some(1200);
        let updated = repo.replace(&p.id, &edit).await.unwrap();
        assert_eq!(updated.selling_price_cents, 275);
        assert_eq!(updated.stock_quantity, 12);
        assert_eq!(updated.tax_rate_bps, 1200);

        repo.delete(&p.id).await.unwrap();
        assert!(matches!(
            repo.get(&p.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.delete(&p.id).await.is_err());
    }

    #[tokio::test]
    async fn test_add_stock() {
        let db = db().await;
        let repo = db.products();
        let p = repo
            .create(&product_input("CETI", 450, 200, 3), 500)
            .await
            .unwrap();

        let back = repo.add_stock(&p.id, 2).await.unwrap();
        assert_eq!(back.stock_quantity, 5);
        assert!(repo.add_stock(&p.id, 0).await.is_err());
        assert!(repo.add_stock("missing", 1).await.is_err());

        assert!(matches!(
            repo.add_stock(&p.id, i64::MAX).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));
        assert_eq!(repo.get(&p.id).await.unwrap().stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_out_of_range_numbers_are_rejected() {
        let db = db().await;
        let repo = db.products();

        let mut pricey = product_input("GOLD", 100, 50, 1);
        pricey.selling_price_cents = i64::MAX / 2;
        assert!(matches!(
            repo.create(&pricey, 500).await,
            Err(DbError::Rule(_))
        ));

        let mut hoard = product_input("HOARD", 100, 50, 1);
        hoard.stock_quantity = i64::MAX;
        assert!(repo.create(&hoard, 500).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_alerts() {
        let db = db().await;
        let repo = db.products();

        let mut low = product_input("LOW", 100, 50, 5); // min 5
        low.expiry_date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        repo.create(&low, 500).await.unwrap();
        repo.create(&product_input("FULL", 100, 50, 50), 500)
            .await
            .unwrap();

        let low_stock = repo.low_stock().await.unwrap();
        assert_eq!(low_stock.len(), 1);
        assert_eq!(low_stock[0].sku, "LOW");

        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let expiring = repo.expiring(30, today).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].sku, "LOW");

        assert!(matches!(
            repo.expiring(i64::MAX, today).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));
        assert!(repo.expiring(-1, today).await.is_err());
    }
}
