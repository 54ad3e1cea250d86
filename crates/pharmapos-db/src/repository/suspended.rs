//! # Suspended Sale Repository
//!
//! Carts parked at the register so another customer can be served.
//!
//! ```text
//! suspend ──► suspended_sales row (lines as JSON) ──► resume ──► cart
//!                                                     (row is removed)
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{manual_discount_columns, manual_discount_from_columns};
use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::validation::{validate_price_cents, validate_quantity};
use pharmapos_core::{
    CoreError, ManualDiscount, ManualDiscountKind, Money, SuspendedSale, TransactionItem,
    ValidationError, MAX_CART_ITEMS,
};

/// Body of `POST /suspended-sales`. Subtotal and total are derived.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendSaleInput {
    pub items: Vec<TransactionItem>,
    #[serde(default)]
    pub manual_discount: Option<ManualDiscount>,
    /// Manual plus coupon discount shown on the register.
    #[serde(default)]
    pub discount_amount_cents: i64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

impl SuspendSaleInput {
    fn validate(&self) -> Result<(), CoreError> {
        if self.items.is_empty() {
            return Err(CoreError::CartEmpty);
        }
        if self.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }
        for item in &self.items {
            validate_quantity(item.quantity)?;
            validate_price_cents("unitPrice", item.unit_price_cents)?;
            validate_price_cents("unitCost", item.unit_cost_cents)?;
        }
        if self.discount_amount_cents < 0 {
            return Err(ValidationError::MustBePositive {
                field: "discountAmountCents".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn subtotal(&self) -> Money {
        self.items.iter().map(TransactionItem::line_total).sum()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SuspendedRow {
    id: String,
    created_at: DateTime<Utc>,
    items: String,
    subtotal_cents: i64,
    manual_discount_type: Option<ManualDiscountKind>,
    manual_discount_value: Option<i64>,
    discount_amount_cents: i64,
    total_amount_cents: i64,
    note: Option<String>,
    customer_id: Option<String>,
    customer_name: Option<String>,
}

impl TryFrom<SuspendedRow> for SuspendedSale {
    type Error = DbError;

    fn try_from(row: SuspendedRow) -> DbResult<Self> {
        let items = serde_json::from_str(&row.items).map_err(|e| DbError::corrupt("items", e))?;
        Ok(SuspendedSale {
            id: row.id,
            created_at: row.created_at,
            items,
            subtotal_cents: row.subtotal_cents,
            manual_discount: manual_discount_from_columns(
                row.manual_discount_type,
                row.manual_discount_value,
            ),
            discount_amount_cents: row.discount_amount_cents,
            total_amount_cents: row.total_amount_cents,
            note: row.note,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
        })
    }
}

/// Repository for parked carts.
#[derive(Debug, Clone)]
pub struct SuspendedSaleRepository {
    pool: SqlitePool,
}

impl SuspendedSaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SuspendedSaleRepository { pool }
    }

    pub async fn create(&self, input: SuspendSaleInput) -> DbResult<SuspendedSale> {
        input.validate()?;

        let subtotal = input.subtotal();
        let total = (subtotal - Money::from_cents(input.discount_amount_cents)).clamp_non_negative();
        let items_json = serde_json::to_string(&input.items)
            .map_err(|e| DbError::Internal(format!("encoding suspended items: {e}")))?;

        let sale = SuspendedSale {
            id: generate_id(),
            created_at: Utc::now(),
            items: input.items,
            subtotal_cents: subtotal.cents(),
            manual_discount: input.manual_discount,
            discount_amount_cents: input.discount_amount_cents,
            total_amount_cents: total.cents(),
            note: input.note.filter(|n| !n.trim().is_empty()),
            customer_id: input.customer_id,
            customer_name: input.customer_name,
        };

        debug!(id = %sale.id, lines = sale.items.len(), "Suspending sale");

        let (kind, value) = manual_discount_columns(sale.manual_discount);
        sqlx::query(
            r#"
            INSERT INTO suspended_sales (
                id, created_at, items, subtotal_cents, manual_discount_type,
                manual_discount_value, discount_amount_cents, total_amount_cents,
                note, customer_id, customer_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.created_at)
        .bind(items_json)
        .bind(sale.subtotal_cents)
        .bind(kind)
        .bind(value)
        .bind(sale.discount_amount_cents)
        .bind(sale.total_amount_cents)
        .bind(&sale.note)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .execute(&self.pool)
        .await?;

        info!(id = %sale.id, total = sale.total_amount_cents, "Sale suspended");
        Ok(sale)
    }

    /// Parked carts, newest first.
    pub async fn list(&self) -> DbResult<Vec<SuspendedSale>> {
        sqlx::query_as::<_, SuspendedRow>(
            "SELECT * FROM suspended_sales ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(SuspendedSale::try_from)
        .collect()
    }

    /// Takes a parked cart back: returns it and removes the row.
    pub async fn resume(&self, id: &str) -> DbResult<SuspendedSale> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SuspendedRow>("SELECT * FROM suspended_sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Suspended sale", id))?;

        sqlx::query("DELETE FROM suspended_sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let sale = SuspendedSale::try_from(row)?;
        tx.commit().await?;

        info!(id = %id, "Sale resumed");
        Ok(sale)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suspended_sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Suspended sale", id));
        }
        info!(id = %id, "Suspended sale deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;
    use pharmapos_core::ProductCategory;

    fn item(id: &str, price: i64, qty: i64) -> TransactionItem {
        TransactionItem {
            product_id: id.to_string(),
            name: format!("Item {id}"),
            sku: format!("SKU-{id}"),
            category: ProductCategory::Supplement,
            unit_price_cents: price,
            unit_cost_cents: price / 2,
            quantity: qty,
        }
    }

    fn input(note: Option<&str>) -> SuspendSaleInput {
        SuspendSaleInput {
            items: vec![item("a", 1000, 2), item("b", 250, 1)],
            manual_discount: Some(ManualDiscount::percentage(1000)),
            discount_amount_cents: 225,
            note: note.map(str::to_string),
            customer_id: None,
            customer_name: Some("Ana".into()),
        }
    }

    #[tokio::test]
    async fn test_suspend_and_resume() {
        let db = db().await;
        let repo = db.suspended_sales();

        let sale = repo.create(input(Some("back in 5"))).await.unwrap();
        assert_eq!(sale.subtotal_cents, 2250);
        assert_eq!(sale.total_amount_cents, 2025);

        let resumed = repo.resume(&sale.id).await.unwrap();
        assert_eq!(resumed.items, sale.items);
        assert_eq!(resumed.manual_discount, Some(ManualDiscount::percentage(1000)));
        assert_eq!(resumed.note.as_deref(), Some("back in 5"));

        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.resume(&sale.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_delete() {
        let db = db().await;
        let repo = db.suspended_sales();
        let first = repo.create(input(None)).await.unwrap();
        let second = repo.create(input(Some("  "))).await.unwrap();
        assert_eq!(second.note, None);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        repo.delete(&first.id).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = db().await;
        let mut empty = input(None);
        empty.items.clear();
        assert!(matches!(
            db.suspended_sales().create(empty).await,
            Err(DbError::Rule(CoreError::CartEmpty))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_lines_rejected() {
        let db = db().await;
        let repo = db.suspended_sales();

        let mut pricey = input(None);
        pricey.items = vec![item("a", i64::MAX / 2, 3)];
        assert!(matches!(
            repo.create(pricey).await,
            Err(DbError::Rule(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));

        let mut bulk = input(None);
        bulk.items = vec![item("a", 1000, i64::MAX)];
        assert!(repo.create(bulk).await.is_err());

        assert!(repo.list().await.unwrap().is_empty());
    }
}
