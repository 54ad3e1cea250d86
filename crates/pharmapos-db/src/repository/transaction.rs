//! # Transaction Repository
//!
//! Completed sales. Checkout is the only multi-table write in the system.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      checkout(record)                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      UPDATE products                                                    │
//! │         SET stock_quantity = stock_quantity - qty                      │
//! │       WHERE id = ? AND stock_quantity >= qty                           │
//! │      0 rows ──► InsufficientStock / ProductNotFound ──► ROLLBACK       │
//! │    INSERT transactions                                                  │
//! │    INSERT transaction_items (line_no 0..n)                              │
//! │    INSERT payments          (line_no 0..n)                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE makes the stock check and the decrement one statement,
//! so two registers selling the last unit cannot both succeed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{manual_discount_columns, manual_discount_from_columns};
use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::cart::Cart;
use pharmapos_core::tender::TenderLedger;
use pharmapos_core::{
    CoreError, ManualDiscount, ManualDiscountKind, Payment, PaymentMethod, ProductCategory,
    Transaction, TransactionItem,
};

// =============================================================================
// Checkout Record
// =============================================================================

/// A fully priced sale, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRecord {
    pub items: Vec<TransactionItem>,
    pub payments: Vec<Payment>,
    pub subtotal_cents: i64,
    pub manual_discount: Option<ManualDiscount>,
    pub discount_amount_cents: i64,
    pub coupon_code: Option<String>,
    pub coupon_discount_cents: Option<i64>,
    pub total_amount_cents: i64,
    pub total_profit_cents: i64,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub user_id: Option<String>,
}

impl CheckoutRecord {
    /// Freezes a cart and its settled ledger into a record.
    ///
    /// ## Errors
    /// - `CartEmpty` when there are no lines
    /// - `PaymentIncomplete` when the ledger does not cover the total
    pub fn from_cart(cart: &Cart, ledger: &TenderLedger) -> Result<Self, CoreError> {
        if cart.is_empty() {
            return Err(CoreError::CartEmpty);
        }
        ledger.ensure_complete()?;

        Ok(CheckoutRecord {
            items: cart.items(),
            payments: ledger.payments.clone(),
            subtotal_cents: cart.subtotal().cents(),
            manual_discount: cart.manual_discount,
            discount_amount_cents: cart.total_discount().cents(),
            coupon_code: cart.coupon.as_ref().map(|c| c.code.clone()),
            coupon_discount_cents: cart.coupon.as_ref().map(|c| c.amount_cents),
            total_amount_cents: cart.total().cents(),
            total_profit_cents: cart.net_profit().cents(),
            customer_id: None,
            customer_name: None,
            user_id: None,
        })
    }

    pub fn with_customer(mut self, id: Option<String>, name: Option<String>) -> Self {
        self.customer_id = id;
        self.customer_name = name;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    created_at: DateTime<Utc>,
    subtotal_cents: i64,
    manual_discount_type: Option<ManualDiscountKind>,
    manual_discount_value: Option<i64>,
    discount_amount_cents: i64,
    coupon_code: Option<String>,
    coupon_discount_cents: Option<i64>,
    total_amount_cents: i64,
    total_profit_cents: i64,
    customer_id: Option<String>,
    customer_name: Option<String>,
    user_id: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self, items: Vec<TransactionItem>, payments: Vec<Payment>) -> Transaction {
        Transaction {
            id: self.id,
            created_at: self.created_at,
            items,
            payments,
            subtotal_cents: self.subtotal_cents,
            manual_discount: manual_discount_from_columns(
                self.manual_discount_type,
                self.manual_discount_value,
            ),
            discount_amount_cents: self.discount_amount_cents,
            coupon_code: self.coupon_code,
            coupon_discount_cents: self.coupon_discount_cents,
            total_amount_cents: self.total_amount_cents,
            total_profit_cents: self.total_profit_cents,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    transaction_id: String,
    product_id: String,
    name: String,
    sku: String,
    category: ProductCategory,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    quantity: i64,
}

impl From<ItemRow> for TransactionItem {
    fn from(row: ItemRow) -> Self {
        TransactionItem {
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            unit_price_cents: row.unit_price_cents,
            unit_cost_cents: row.unit_cost_cents,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    transaction_id: String,
    method: PaymentMethod,
    amount_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for completed sales.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Deducts stock for every line and stores the sale, all or nothing.
    ///
    /// Each line's `WHERE stock_quantity >= ?` guard is the SQL form of
    /// [`pharmapos_core::inventory::deduct_stock`], evaluated against the row as it is at
    /// commit time rather than as the cart saw it.
    ///
    /// ## Errors
    /// - `Rule(InsufficientStock)` naming the first line that could not be
    ///   covered; no stock is deducted for any line
    /// - `Rule(ProductNotFound)` when a line's product was deleted
    pub async fn checkout(&self, record: CheckoutRecord) -> DbResult<Transaction> {
        if record.items.is_empty() {
            return Err(CoreError::CartEmpty.into());
        }

        let id = generate_id();
        let now = Utc::now();

        debug!(id = %id, lines = record.items.len(), total = record.total_amount_cents, "Checking out");

        let mut tx = self.pool.begin().await?;

        for item in &record.items {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - ?2, updated_at = ?3
                WHERE id = ?1 AND stock_quantity >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                        .bind(&item.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback().await?;

                let err = match available {
                    Some(available) => CoreError::InsufficientStock {
                        sku: item.sku.clone(),
                        available,
                        requested: item.quantity,
                    },
                    None => CoreError::ProductNotFound(item.product_id.clone()),
                };
                warn!(id = %id, sku = %item.sku, error = %err, "Checkout rolled back");
                return Err(err.into());
            }
        }

        let (discount_kind, discount_value) = manual_discount_columns(record.manual_discount);
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, created_at, subtotal_cents, manual_discount_type, manual_discount_value,
                discount_amount_cents, coupon_code, coupon_discount_cents,
                total_amount_cents, total_profit_cents, customer_id, customer_name, user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&id)
        .bind(now)
        .bind(record.subtotal_cents)
        .bind(discount_kind)
        .bind(discount_value)
        .bind(record.discount_amount_cents)
        .bind(&record.coupon_code)
        .bind(record.coupon_discount_cents)
        .bind(record.total_amount_cents)
        .bind(record.total_profit_cents)
        .bind(&record.customer_id)
        .bind(&record.customer_name)
        .bind(&record.user_id)
        .execute(&mut *tx)
        .await?;

        for (line_no, item) in record.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id, line_no, product_id, name, sku, category,
                    unit_price_cents, unit_cost_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&id)
            .bind(line_no as i64)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(&item.sku)
            .bind(item.category)
            .bind(item.unit_price_cents)
            .bind(item.unit_cost_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        for (line_no, payment) in record.payments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO payments (transaction_id, line_no, method, amount_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&id)
            .bind(line_no as i64)
            .bind(payment.method)
            .bind(payment.amount_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %id,
            total = record.total_amount_cents,
            profit = record.total_profit_cents,
            "Transaction completed"
        );

        Ok(Transaction {
            id,
            created_at: now,
            items: record.items,
            payments: record.payments,
            subtotal_cents: record.subtotal_cents,
            manual_discount: record.manual_discount,
            discount_amount_cents: record.discount_amount_cents,
            coupon_code: record.coupon_code,
            coupon_discount_cents: record.coupon_discount_cents,
            total_amount_cents: record.total_amount_cents,
            total_profit_cents: record.total_profit_cents,
            customer_id: record.customer_id,
            customer_name: record.customer_name,
            user_id: record.user_id,
        })
    }

    /// Every transaction with its lines and payments, newest first.
    pub async fn list(&self) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<TransactionItem>> = HashMap::new();
        for row in sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM transaction_items ORDER BY transaction_id, line_no",
        )
        .fetch_all(&self.pool)
        .await?
        {
            items.entry(row.transaction_id.clone()).or_default().push(row.into());
        }

        let mut payments: HashMap<String, Vec<Payment>> = HashMap::new();
        for row in sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments ORDER BY transaction_id, line_no",
        )
        .fetch_all(&self.pool)
        .await?
        {
            payments
                .entry(row.transaction_id)
                .or_default()
                .push(Payment {
                    method: row.method,
                    amount_cents: row.amount_cents,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                let tenders = payments.remove(&row.id).unwrap_or_default();
                row.into_transaction(lines, tenders)
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY line_no",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TransactionItem::from)
        .collect();

        let payments = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE transaction_id = ?1 ORDER BY line_no",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| Payment {
            method: row.method,
            amount_cents: row.amount_cents,
        })
        .collect();

        Ok(row.into_transaction(items, payments))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================
