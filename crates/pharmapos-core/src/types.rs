//! # Domain Types
//!
//! Core domain types used throughout PharmaPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  method         │       │
//! │  │  sku / barcode  │   │  items[]        │   │  amount_cents   │       │
//! │  │  prices (cents) │   │  payments[]     │   └─────────────────┘       │
//! │  │  stock, expiry  │   │  discounts      │                              │
//! │  └─────────────────┘   │  total, profit  │   ┌─────────────────┐       │
//! │                        └─────────────────┘   │ SuspendedSale   │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   │  parked cart    │       │
//! │  │   Customer      │   │     User        │   └─────────────────┘       │
//! │  │  name, contact  │   │  role, hash     │                              │
//! │  └─────────────────┘   └─────────────────┘   ┌─────────────────┐       │
//! │                                              │  AppSettings    │       │
//! │  Discount / DiscountRule live in discount.rs │  store header   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Transaction and suspended-sale lines freeze the product's name, SKU,
//! price and cost at the moment of sale. Editing a product later never
//! rewrites history or changes reported profit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product Category
// =============================================================================

/// Shelf category of a product.
///
/// Discount rules of type `Category` match against this name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ProductCategory {
    Medicine,
    Supplement,
    Equipment,
    Other,
}

impl ProductCategory {
    /// Stable display / storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Medicine => "Medicine",
            ProductCategory::Supplement => "Supplement",
            ProductCategory::Equipment => "Equipment",
            ProductCategory::Other => "Other",
        }
    }
}

impl Default for ProductCategory {
    fn default() -> Self {
        ProductCategory::Other
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product carried by the pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Brand name (e.g., "Panadol Extra").
    pub name: String,

    /// Active ingredient (e.g., "Paracetamol").
    pub generic_name: String,

    /// Stock Keeping Unit - internal business identifier.
    pub sku: String,

    /// UPC/EAN for scanning.
    pub barcode: String,

    pub description: Option<String>,

    /// Purchase cost in cents (for profit and inventory value).
    pub cost_price_cents: i64,

    /// Shelf price in cents.
    pub selling_price_cents: i64,

    /// Tax rate in basis points (500 = 5%).
    pub tax_rate_bps: u32,

    /// Units currently on hand.
    pub stock_quantity: i64,

    /// Low-stock alert threshold.
    pub min_stock_level: i64,

    /// Earliest expiry of the batch on the shelf.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    /// Manufacturer batch, kept for recalls.
    pub batch_number: String,

    pub requires_prescription: bool,

    pub category: ProductCategory,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Checks whether `quantity` units can be taken from the shelf.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }

    /// Stock is at or below the alert threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that can be attached to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Users
// =============================================================================

/// Access level of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum UserRole {
    Admin,
    Pharmacist,
    Cashier,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Pharmacist => "Pharmacist",
            UserRole::Cashier => "Cashier",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(UserRole::Admin),
            "Pharmacist" => Ok(UserRole::Pharmacist),
            "Cashier" => Ok(UserRole::Cashier),
            _ => Err(crate::ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["Admin".into(), "Pharmacist".into(), "Cashier".into()],
            }),
        }
    }
}

/// A staff account.
///
/// `password_hash` is an argon2 PHC string and never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// Tender types accepted at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash. The only method allowed to overpay (change is given).
    Cash,
    /// Card on an external terminal.
    Card,
    /// GCash e-wallet.
    GCash,
    /// Maya e-wallet.
    Maya,
}

impl PaymentMethod {
    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::GCash => "GCash",
            PaymentMethod::Maya => "Maya",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tender towards a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

impl Payment {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        Payment {
            method,
            amount_cents: amount.cents(),
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Manual Discount
// =============================================================================

/// How a cashier-entered discount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ManualDiscountKind {
    /// `value` is basis points of the subtotal.
    Percentage,
    /// `value` is cents, capped at the subtotal.
    Fixed,
}

/// A discount typed in at the register (as opposed to a stored rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManualDiscount {
    #[serde(rename = "type")]
    pub kind: ManualDiscountKind,
    pub value: i64,
}

impl ManualDiscount {
    pub fn percentage(bps: i64) -> Self {
        ManualDiscount {
            kind: ManualDiscountKind::Percentage,
            value: bps,
        }
    }

    pub fn fixed(cents: i64) -> Self {
        ManualDiscount {
            kind: ManualDiscountKind::Fixed,
            value: cents,
        }
    }

    /// Amount taken off `subtotal`.
    ///
    /// ```text
    /// percentage: subtotal × value / 10000
    /// fixed:      min(value, subtotal)
    /// value ≤ 0:  nothing
    /// ```
    pub fn amount_for(&self, subtotal: Money) -> Money {
        if self.value <= 0 {
            return Money::zero();
        }
        match self.kind {
            ManualDiscountKind::Percentage => subtotal.percentage_of(self.value),
            ManualDiscountKind::Fixed => Money::from_cents(self.value).min(subtotal),
        }
    }
}

// =============================================================================
// Transaction Item
// =============================================================================

/// A sold (or parked) line, frozen at the time it was rung up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    pub category: ProductCategory,
    /// Unit selling price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Unit cost at time of sale (frozen, for profit).
    pub unit_cost_cents: i64,
    pub quantity: i64,
}

impl TransactionItem {
    /// Snapshots a product into a line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        TransactionItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            category: product.category,
            unit_price_cents: product.selling_price_cents,
            unit_cost_cents: product.cost_price_cents,
            quantity,
        }
    }

    /// unit price × quantity
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// (unit price − unit cost) × quantity
    #[inline]
    pub fn gross_profit(&self) -> Money {
        Money::from_cents(self.unit_price_cents - self.unit_cost_cents)
            .multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale.
///
/// ## Amount Fields
/// ```text
/// subtotal_cents          Σ line totals
/// discount_amount_cents   manual discount + coupon
/// coupon_discount_cents   coupon part only (None without coupon)
/// total_amount_cents      max(0, subtotal − discount_amount)
/// total_profit_cents      Σ line gross profit − discount_amount
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
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
    /// Staff account that rang the sale.
    pub user_id: Option<String>,
}

impl Transaction {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }

    /// Units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Suspended Sale
// =============================================================================

/// A cart set aside to be resumed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SuspendedSale {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransactionItem>,
    pub subtotal_cents: i64,
    pub manual_discount: Option<ManualDiscount>,
    /// Manual + coupon discount at the moment of suspension.
    pub discount_amount_cents: i64,
    pub total_amount_cents: i64,
    pub note: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
}

// =============================================================================
// Settings
// =============================================================================

/// Store-wide settings printed on receipts and used as product defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AppSettings {
    pub pharmacy_name: String,
    pub address: String,
    pub contact_phone: String,
    /// Applied to new products that don't specify one (500 = 5%).
    pub default_tax_rate_bps: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            pharmacy_name: "My Pharmacy".to_string(),
            address: "123 Health St, Wellness City".to_string(),
            contact_phone: "555-123-4567".to_string(),
            default_tax_rate_bps: 500,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
