//! # Discounts and Coupons
//!
//! Stored discount definitions and the rules that turn them into an amount
//! off a cart.
//!
//! ## Two Kinds of Discount
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Discount (one table)                             │
//! │                                                                         │
//! │   code = None                         code = Some("SAVE10")             │
//! │   ───────────────                     ─────────────────────             │
//! │   AUTOMATIC                           COUPON                            │
//! │   best_automatic_discount()           validate_coupon()                 │
//! │   picks the biggest amount            looked up by exact code           │
//! │   among applicable ones               fails closed (404) when unknown,  │
//! │                                       inactive, early or expired        │
//! │                                                                         │
//! │   Both use calculate_discount_amount() on the eligible lines:          │
//! │                                                                         │
//! │   discount_rules empty ──► every line is eligible                      │
//! │   discount_rules set   ──► only lines matching a Product / Category    │
//! │                            rule are eligible                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amount Semantics
//! | Type       | `value` unit | Amount                                     |
//! |------------|--------------|--------------------------------------------|
//! | Percentage | bps          | eligible × value / 10000 (half-up)         |
//! | Fixed      | cents        | min(value, eligible)                       |
//! | Bundle     | cents        | min(value, eligible)                       |
//! | BuyXTakeY  | cents        | free units from `rules.buy` / `rules.take` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Discount Type
// =============================================================================

/// How a discount's `value` is turned into an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DiscountType {
    Percentage,
    Fixed,
    BuyXTakeY,
    Bundle,
}

/// What a [`DiscountRule`] matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DiscountRuleType {
    Product,
    Category,
}

// =============================================================================
// Discount Rule
// =============================================================================

/// Restricts a discount to a product or a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountRule {
    pub id: String,
    pub discount_id: String,
    pub rule_type: DiscountRuleType,
    pub product_id: Option<String>,
    pub category: Option<String>,
}

impl DiscountRule {
    /// Checks whether a cart line falls under this rule.
    ///
    /// Category comparison ignores case ("medicine" matches "Medicine").
    pub fn matches(&self, line: &DiscountLine) -> bool {
        match self.rule_type {
            DiscountRuleType::Product => self
                .product_id
                .as_deref()
                .is_some_and(|id| id == line.product_id),
            DiscountRuleType::Category => match (&self.category, &line.category) {
                (Some(rule), Some(item)) => rule.eq_ignore_ascii_case(item),
                _ => false,
            },
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A stored discount. With a `code` it is a coupon, otherwise it is
/// applied automatically when it beats every other candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Discount {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    /// Basis points for `Percentage`, cents otherwise.
    pub value: i64,
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Free-form parameters (`{"buy": 2, "take": 1}` for BuyXTakeY).
    #[ts(type = "Record<string, unknown> | null")]
    pub rules: Option<serde_json::Value>,
    #[serde(default)]
    pub discount_rules: Vec<DiscountRule>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Coupons carry a code; automatic discounts don't.
    #[inline]
    pub fn is_coupon(&self) -> bool {
        self.code.is_some()
    }

    /// Active and inside its validity window at `now`.
    ///
    /// Open ends (no start / no end) never exclude.
    pub fn is_applicable_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.start_date.is_some_and(|start| start > now) {
            return false;
        }
        if self.end_date.is_some_and(|end| end < now) {
            return false;
        }
        true
    }

    /// `(buy, take)` parameters for BuyXTakeY, if the rules object has both.
    fn buy_take(&self) -> Option<(i64, i64)> {
        let rules = self.rules.as_ref()?;
        let buy = rules.get("buy")?.as_i64()?;
        let take = rules.get("take")?.as_i64()?;
        if buy < 0 || take <= 0 {
            return None;
        }
        Some((buy, take))
    }

    fn eligible_lines<'a>(
        &'a self,
        lines: &'a [DiscountLine],
    ) -> impl Iterator<Item = &'a DiscountLine> + 'a {
        lines.iter().filter(move |line| {
            self.discount_rules.is_empty() || self.discount_rules.iter().any(|r| r.matches(line))
        })
    }
}

// =============================================================================
// Cart Line (discount input)
// =============================================================================

/// The slice of a cart line the discount engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountLine {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub category: Option<String>,
}

impl DiscountLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

/// Outcome of an automatic or coupon calculation.
///
/// With no applicable discount, `discount_id` and `discount_name` are
/// `None` and `amount_cents` is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountCalculation {
    pub discount_id: Option<String>,
    pub discount_name: Option<String>,
    pub amount_cents: i64,
}

impl DiscountCalculation {
    pub fn none() -> Self {
        DiscountCalculation {
            discount_id: None,
            discount_name: None,
            amount_cents: 0,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Σ price × quantity over the lines the discount applies to.
pub fn eligible_subtotal(lines: &[DiscountLine], discount: &Discount) -> Money {
    discount.eligible_lines(lines).map(|l| l.line_total()).sum()
}

/// Amount `discount` takes off `lines`.
///
/// Only lines matched by `discount_rules` count towards the base; with no
/// rules the whole cart does. The amount never exceeds that eligible
/// subtotal.
///
/// | Type       | Amount                                                    |
/// |------------|-----------------------------------------------------------|
/// | Percentage | eligible × value / 10000                                  |
/// | Fixed      | min(value, eligible)                                      |
/// | Bundle     | min(value, eligible)                                      |
/// | BuyXTakeY  | free units per eligible line, priced at that line's unit  |
///
/// A BuyXTakeY discount reads `{"buy": x, "take": y}` from `rules`: every
/// full group of `x + y` units on a line gives `y` of them free. Without a
/// usable `rules` object it falls back to the Fixed amount.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use pharmapos_core::discount::{calculate_discount_amount, Discount, DiscountLine, DiscountType};
///
/// let lines = vec![DiscountLine {
///     product_id: "p1".into(),
///     quantity: 2,
///     price_cents: 1000,
///     category: None,
/// }];
/// let ten_percent = Discount {
///     id: "d1".into(),
///     organization_id: pharmapos_core::DEFAULT_ORGANIZATION_ID.into(),
///     name: "Senior".into(),
///     code: None,
///     discount_type: DiscountType::Percentage,
///     value: 1000,
///     start_date: None,
///     end_date: None,
///     is_active: true,
///     rules: None,
///     discount_rules: vec![],
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// assert_eq!(calculate_discount_amount(&lines, &ten_percent).cents(), 200);
/// ```
pub fn calculate_discount_amount(lines: &[DiscountLine], discount: &Discount) -> Money {
    let eligible = eligible_subtotal(lines, discount);
    if !eligible.is_positive() {
        return Money::zero();
    }

    match discount.discount_type {
        DiscountType::Percentage => eligible.percentage_of(discount.value.max(0)),
        DiscountType::BuyXTakeY => match discount.buy_take() {
            Some((buy, take)) => discount
                .eligible_lines(lines)
                .map(|line| {
                    let free_units = (line.quantity / buy.saturating_add(take)) * take;
                    Money::from_cents(line.price_cents).multiply_quantity(free_units)
                })
                .sum::<Money>()
                .min(eligible),
            None => Money::from_cents(discount.value.max(0)).min(eligible),
        },
        DiscountType::Fixed | DiscountType::Bundle => {
            Money::from_cents(discount.value.max(0)).min(eligible)
        }
    }
}

/// Picks the automatic discount worth the most on `lines` at `now`.
///
/// Coupons are skipped. Only a strictly greater amount replaces the current
/// best, so the earliest discount wins a tie.
pub fn best_automatic_discount(
    discounts: &[Discount],
    lines: &[DiscountLine],
    now: DateTime<Utc>,
) -> DiscountCalculation {
    let mut best = DiscountCalculation::none();

    for discount in discounts
        .iter()
        .filter(|d| !d.is_coupon() && d.is_applicable_at(now))
    {
        let amount = calculate_discount_amount(lines, discount);
        if amount.cents() > best.amount_cents {
            best = DiscountCalculation {
                discount_id: Some(discount.id.clone()),
                discount_name: Some(discount.name.clone()),
                amount_cents: amount.cents(),
            };
        }
    }

    best
}

/// Looks up an active coupon by exact code and checks its window.
///
/// ## Errors
/// ```text
/// no active discount with this code ──► CouponNotFound(code)
/// start_date > now                  ──► CouponNotYetActive
/// end_date < now                    ──► CouponExpired
/// ```
pub fn validate_coupon<'a>(
    discounts: &'a [Discount],
    code: &str,
    now: DateTime<Utc>,
) -> CoreResult<&'a Discount> {
    let coupon = discounts
        .iter()
        .find(|d| d.is_active && d.code.as_deref() == Some(code))
        .ok_or_else(|| CoreError::CouponNotFound(code.to_string()))?;

    if coupon.start_date.is_some_and(|start| start > now) {
        return Err(CoreError::CouponNotYetActive);
    }
    if coupon.end_date.is_some_and(|end| end < now) {
        return Err(CoreError::CouponExpired);
    }

    Ok(coupon)
}

/// Computes what an already-validated coupon takes off `lines`.
pub fn apply_coupon(lines: &[DiscountLine], coupon: &Discount) -> DiscountCalculation {
    DiscountCalculation {
        discount_id: Some(coupon.id.clone()),
        discount_name: Some(coupon.name.clone()),
        amount_cents: calculate_discount_amount(lines, coupon).cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
