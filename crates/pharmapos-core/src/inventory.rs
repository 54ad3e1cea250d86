//! # Inventory Rules
//!
//! Stock movements and the shelf alerts shown on the dashboard.
//!
//! ```text
//! sale    ──► deduct_stock(qty)  stock − qty, refused if qty > stock
//! return  ──► add_stock(qty)     stock + qty, qty in 1..=999 and the
//!                                 result at most MAX_STOCK_QUANTITY
//!
//! low_stock        stock ≤ min_stock_level
//! expiring_within  expiry_date ≤ today + days, days in 0..=3650
//! inventory_value  Σ cost × stock
//! ```
//!
//! The database layer performs the same stock guard inside its own SQL for
//! checkout (`UPDATE … WHERE stock_quantity >= ?`); these functions are the
//! rule book it mirrors, and the repository tests check the two agree.

use chrono::{NaiveDate, TimeDelta};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_expiry_window, validate_quantity};
use crate::MAX_STOCK_QUANTITY;

/// Takes `quantity` units off the shelf.
pub fn deduct_stock(product: &mut Product, quantity: i64) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: product.stock_quantity,
            requested: quantity,
        });
    }
    product.stock_quantity -= quantity;
    Ok(())
}

/// Puts returned units back on the shelf.
///
/// A return is one sale line's worth at most, so `quantity` follows the
/// same 1 to [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY) bound.
pub fn add_stock(product: &mut Product, quantity: i64) -> CoreResult<()> {
    validate_quantity(quantity)?;
    let restocked = product.stock_quantity.saturating_add(quantity);
    if restocked > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "stockQuantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        }
        .into());
    }
    product.stock_quantity = restocked;
    Ok(())
}

pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

/// Last expiry date the alert covers: `today + days`.
///
/// `days` must lie in `0..=MAX_EXPIRY_WINDOW_DAYS`.
pub fn expiry_horizon(today: NaiveDate, days: i64) -> CoreResult<NaiveDate> {
    validate_expiry_window(days)?;
    TimeDelta::try_days(days)
        .and_then(|window| today.checked_add_signed(window))
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "days".to_string(),
                reason: "window runs past the last representable date".to_string(),
            }
            .into()
        })
}

/// Products whose expiry falls on or before `today + days`.
///
/// Already-expired products are included.
pub fn expiring_within(
    products: &[Product],
    days: i64,
    today: NaiveDate,
) -> CoreResult<Vec<&Product>> {
    let horizon = expiry_horizon(today, days)?;
    Ok(products.iter().filter(|p| p.expiry_date <= horizon).collect())
}

/// Cost value of everything on the shelf.
pub fn inventory_value(products: &[Product]) -> Money {
    products
        .iter()
        .map(|p| p.cost_price().multiply_quantity(p.stock_quantity))
        .sum()
}

// =============================================================================
// Search
// =============================================================================

/// POS search box: name or generic name contains `term` (any case), or the
/// barcode equals it exactly. An empty term matches everything.
pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.generic_name.to_lowercase().contains(&needle)
        || product.barcode == term
}

/// Returns dialog search: name or SKU contains `term` (any case).
pub fn matches_return_search(product: &Product, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    product.name.to_lowercase().contains(&needle) || product.sku.to_lowercase().contains(&needle)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::product;

    #[test]
    fn test_deduct_stock() {
        let mut p = product("1", 100, 50, 10);
        deduct_stock(&mut p, 4).unwrap();
        assert_eq!(p.stock_quantity, 6);
    }

    #[test]
    fn test_deduct_more_than_stock_is_rejected() {
        let mut p = product("1", 100, 50, 3);
        let err = deduct_stock(&mut p, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 5, .. }
        ));
        assert_eq!(p.stock_quantity, 3);
    }

    #[test]
    fn test_add_stock_requires_positive() {
        let mut p = product("1", 100, 50, 3);
        assert!(add_stock(&mut p, 0).is_err());
        add_stock(&mut p, 2).unwrap();
        assert_eq!(p.stock_quantity, 5);
    }

    #[test]
    fn test_add_stock_is_bounded() {
        let mut p = product("1", 100, 50, 3);
        assert!(matches!(
            add_stock(&mut p, i64::MAX),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(add_stock(&mut p, crate::MAX_ITEM_QUANTITY + 1).is_err());
        assert_eq!(p.stock_quantity, 3);

        p.stock_quantity = MAX_STOCK_QUANTITY - 1;
        assert!(add_stock(&mut p, 2).is_err());
        add_stock(&mut p, 1).unwrap();
        assert_eq!(p.stock_quantity, MAX_STOCK_QUANTITY);
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        let at = product("at", 100, 50, 5); // min 5
        let above = product("above", 100, 50, 6);
        let products = vec![at, above];
        let low = low_stock(&products);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "at");
    }

    #[test]
    fn test_expiring_within() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut soon = product("soon", 100, 50, 1);
        soon.expiry_date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(); // +30
        let mut later = product("later", 100, 50, 1);
        later.expiry_date = NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(); // +31
        let mut expired = product("expired", 100, 50, 1);
        expired.expiry_date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        let products = vec![soon, later, expired];
        let ids: Vec<_> = expiring_within(&products, 30, today)
            .unwrap()
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["soon", "expired"]);
    }

    #[test]
    fn test_expiry_window_bounds() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let products = vec![product("1", 100, 50, 1)];

        assert!(expiring_within(&products, i64::MAX, today).is_err());
        assert!(expiring_within(&products, -1, today).is_err());
        assert_eq!(expiry_horizon(today, 0).unwrap(), today);
        assert_eq!(
            expiry_horizon(today, crate::MAX_EXPIRY_WINDOW_DAYS).unwrap(),
            NaiveDate::from_ymd_opt(2036, 5, 29).unwrap()
        );
        assert!(expiry_horizon(NaiveDate::MAX, 1).is_err());
    }

    #[test]
    fn test_inventory_value() {
        let products = vec![product("1", 100, 50, 10), product("2", 300, 200, 2)];
        assert_eq!(inventory_value(&products).cents(), 900);
    }

    #[test]
    fn test_search_matchers() {
        let mut p = product("1", 100, 50, 1);
        p.name = "Biogesic".into();
        p.generic_name = "Paracetamol".into();
        p.barcode = "4801234567890".into();
        p.sku = "BIO-500".into();

        assert!(matches_search(&p, "bio"));
        assert!(matches_search(&p, "PARACET"));
        assert!(matches_search(&p, "4801234567890"));
        assert!(!matches_search(&p, "480123"));

        assert!(matches_return_search(&p, "bio-5"));
        assert!(!matches_return_search(&p, "paracetamol"));
    }
}
