//! # Cart
//!
//! The register's working cart: lines bounded by shelf stock, an optional
//! cashier discount and an optional server-validated coupon.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Scan / click product ──► add_product() ───► qty + n (≤ stock)         │
//! │                                                                         │
//! │  Edit quantity ─────────► set_quantity() ──► clamp to [1, stock]       │
//! │                                                                         │
//! │  Click remove ──────────► remove() ────────► line dropped              │
//! │                                                                         │
//! │  NOTE: every line change above drops the applied coupon. Its amount    │
//! │        was computed for the old lines and must be re-validated.        │
//! │                                                                         │
//! │  Totals                                                                 │
//! │  ──────                                                                 │
//! │  subtotal       = Σ price × qty                                         │
//! │  total_discount = manual + coupon                                       │
//! │  total          = max(0, subtotal − total_discount)                     │
//! │  net_profit     = Σ (price − cost) × qty − total_discount              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::{DiscountCalculation, DiscountLine};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ManualDiscount, ManualDiscountKind, Product, TransactionItem};
use crate::{BPS_SCALE, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Price and cost are frozen when the product is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: TransactionItem,
    /// Shelf stock when the product was added; the quantity ceiling.
    pub stock_available: i64,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            item: TransactionItem::from_product(product, quantity),
            stock_available: product.stock_quantity,
        }
    }

    #[inline]
    pub fn product_id(&self) -> &str {
        &self.item.product_id
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.item.quantity
    }
}

/// A coupon accepted by the server for the current lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_id: String,
    pub amount_cents: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart being rung up.
///
/// ## Invariants
/// - Lines are unique by product id (adding again increases quantity)
/// - 1 ≤ quantity ≤ min(stock_available, MAX_ITEM_QUANTITY)
/// - `coupon` is None after any line change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub manual_discount: Option<ManualDiscount>,
    pub coupon: Option<AppliedCoupon>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the resulting quantity exceeds shelf stock
    /// - `CartTooLarge` when a new line would exceed [`MAX_CART_ITEMS`]
    /// - `Validation` when quantity is not positive or exceeds [`MAX_ITEM_QUANTITY`]
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let current = self
            .lines
            .iter()
            .find(|l| l.product_id() == product.id)
            .map(|l| l.quantity())
            .unwrap_or(0);
        let requested = current + quantity;

        if requested > product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.stock_quantity,
                requested,
            });
        }
        if requested > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }

        match self.lines.iter_mut().find(|l| l.product_id() == product.id) {
            Some(line) => {
                line.item.quantity = requested;
                line.stock_available = product.stock_quantity;
            }
            None => {
                if self.lines.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        self.coupon = None;
        Ok(())
    }

    /// Sets a line's quantity, clamped to `[1, stock_available]`.
    ///
    /// Returns the quantity actually stored so the caller can tell the
    /// cashier when it was clamped.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<i64> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id() == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        let ceiling = line.stock_available.min(MAX_ITEM_QUANTITY).max(1);
        let effective = quantity.clamp(1, ceiling);
        line.item.quantity = effective;

        self.coupon = None;
        Ok(effective)
    }

    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id() != product_id);
        if self.lines.len() == before {
            return Err(CoreError::NotInCart(product_id.to_string()));
        }
        self.coupon = None;
        Ok(())
    }

    /// Empties the cart and forgets both discounts.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.manual_discount = None;
        self.coupon = None;
    }

    /// Sets or removes the cashier discount.
    ///
    /// A zero value is accepted and means "no discount".
    pub fn set_manual_discount(&mut self, discount: Option<ManualDiscount>) -> CoreResult<()> {
        if let Some(d) = discount {
            if d.value < 0 {
                return Err(ValidationError::MustBePositive {
                    field: "discount".to_string(),
                }
                .into());
            }
            if d.kind == ManualDiscountKind::Percentage && d.value > BPS_SCALE {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: BPS_SCALE,
                }
                .into());
            }
        }
        self.manual_discount = discount;
        Ok(())
    }

    /// Attaches a coupon the server accepted for the current lines.
    pub fn apply_coupon(&mut self, code: &str, calculation: &DiscountCalculation) {
        self.coupon = calculation.discount_id.as_ref().map(|id| AppliedCoupon {
            code: code.to_string(),
            discount_id: id.clone(),
            amount_cents: calculation.amount_cents,
        });
    }

    pub fn remove_coupon(&mut self) {
        self.coupon = None;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity()).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.item.line_total()).sum()
    }

    pub fn manual_discount_amount(&self) -> Money {
        self.manual_discount
            .map(|d| d.amount_for(self.subtotal()))
            .unwrap_or_default()
    }

    pub fn coupon_amount(&self) -> Money {
        self.coupon
            .as_ref()
            .map(|c| Money::from_cents(c.amount_cents))
            .unwrap_or_default()
    }

    /// Manual plus coupon discount.
    pub fn total_discount(&self) -> Money {
        self.manual_discount_amount() + self.coupon_amount()
    }

    /// What the customer owes.
    pub fn total(&self) -> Money {
        (self.subtotal() - self.total_discount()).clamp_non_negative()
    }

    /// Σ (price − cost) × qty, before discounts.
    pub fn gross_profit(&self) -> Money {
        self.lines.iter().map(|l| l.item.gross_profit()).sum()
    }

    /// Gross profit less every discount given. May be negative.
    pub fn net_profit(&self) -> Money {
        self.gross_profit() - self.total_discount()
    }

    /// Lines in the shape the discount engine consumes.
    pub fn discount_lines(&self) -> Vec<DiscountLine> {
        self.lines
            .iter()
            .map(|l| DiscountLine {
                product_id: l.item.product_id.clone(),
                quantity: l.item.quantity,
                price_cents: l.item.unit_price_cents,
                category: Some(l.item.category.as_str().to_string()),
            })
            .collect()
    }

    /// Frozen line snapshots for a transaction or a suspended sale.
    pub fn items(&self) -> Vec<TransactionItem> {
        self.lines.iter().map(|l| l.item.clone()).collect()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

// =============================================================================
// Totals Summary
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub manual_discount_cents: i64,
    pub coupon_discount_cents: i64,
    pub total_discount_cents: i64,
    pub total_cents: i64,
    pub net_profit_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.lines.len(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal().cents(),
            manual_discount_cents: cart.manual_discount_amount().cents(),
            coupon_discount_cents: cart.coupon_amount().cents(),
            total_discount_cents: cart.total_discount().cents(),
            total_cents: cart.total().cents(),
            net_profit_cents: cart.net_profit().cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
