//! # Field Validation
//!
//! Shape checks for request bodies. They run in the repositories before
//! any SQL, so a bad barcode is a 400 with the field name rather than a
//! constraint failure from SQLite.
//!
//! ```text
//! JSON body ──serde──► ProductInput / DiscountInput / user request
//!                            │
//!                            ▼
//!                   validate_* (this module) ──► ValidationError ──► 400
//!                            │
//!                            ▼
//!                   INSERT / UPDATE ──► UNIQUE(sku, barcode, username, code)
//!                                       failure ──► 409
//! ```
//!
//! ```rust
//! use pharmapos_core::validation::{validate_coupon_code, validate_quantity, validate_sku};
//!
//! assert!(validate_sku("PARA-500").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_coupon_code("save10").is_err());
//! ```

use crate::discount::{DiscountLine, DiscountType};
use crate::error::ValidationError;
use crate::{
    BPS_SCALE, MAX_CART_ITEMS, MAX_EXPIRY_WINDOW_DAYS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS,
    MAX_STOCK_QUANTITY,
};

pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Every character of the trimmed value satisfies `allowed`.
fn only(
    field: &str,
    value: &str,
    allowed: impl Fn(char) -> bool,
    reason: &str,
) -> ValidationResult<()> {
    if value.trim().chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// `0 ..= max`
fn up_to(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if !(0..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Text
// =============================================================================

/// Shelf code such as `AMOX-250`: up to 50 of `[A-Za-z0-9_-]`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku)?;
    max_len("sku", sku, 50)?;
    only(
        "sku",
        sku,
        |c| c.is_alphanumeric() || matches!(c, '-' | '_'),
        "letters, digits, '-' and '_' only",
    )
}

/// Brand or generic name of a product: required, at most 200 characters.
pub fn validate_product_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name)?;
    max_len(field, name, 200)
}

/// Barcode: required, digits only, at most 32 characters.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    required("barcode", barcode)?;
    max_len("barcode", barcode, 32)?;
    only("barcode", barcode, |c| c.is_ascii_digit(), "digits only")
}

/// Product search term, trimmed. Empty matches everything.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    max_len("search", query, 100)?;
    Ok(query.trim().to_string())
}

/// Coupon codes are upper-case letters and digits, 3 to 32 characters.
///
/// ## Example
/// ```rust
/// use pharmapos_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("VIT15").is_ok());
/// assert!(validate_coupon_code("vit15").is_err());
/// assert!(validate_coupon_code("VIT-15").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    required("code", code)?;
    let len = code.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: 3,
        });
    }
    if len > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }
    only(
        "code",
        code,
        |c| c.is_ascii_uppercase() || c.is_ascii_digit(),
        "uppercase letters and digits only",
    )
}

/// Staff username: 3 to 50 characters of letters, digits, `.`, `_` or `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    required("username", username)?;
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    max_len("username", username, 50)?;
    only(
        "username",
        username,
        |c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'),
        "letters, digits, '.', '-' and '_' only",
    )
}

/// Passwords need at least 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    max_len("password", password, 128)
}

/// Customer or discount display name: required, at most 100 characters.
pub fn validate_display_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name)?;
    max_len(field, name, 100)
}

// =============================================================================
// Numbers
// =============================================================================

/// Units on a sale line or a customer return: 1 to [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    match qty {
        q if q <= 0 => Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }),
        q if q > MAX_ITEM_QUANTITY => Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }),
        _ => Ok(()),
    }
}

/// Cost and selling prices, up to [`MAX_PRICE_CENTS`]. Free samples
/// (zero) are allowed.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    up_to(field, cents, MAX_PRICE_CENTS)
}

/// Stock on hand and low-stock alert level, up to [`MAX_STOCK_QUANTITY`].
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    up_to(field, value, MAX_STOCK_QUANTITY)
}

/// Tax rate in basis points, 0 to 10000 (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    up_to("taxRate", i64::from(bps), BPS_SCALE)
}

/// A discount's value for its type.
///
/// Percentage values are basis points up to 100%. Other types are cents
/// bounded like a price.
pub fn validate_discount_value(kind: DiscountType, value: i64) -> ValidationResult<()> {
    let max = match kind {
        DiscountType::Percentage => BPS_SCALE,
        _ => MAX_PRICE_CENTS,
    };
    up_to("value", value, max)
}

/// Look-ahead of the expiring-products alert: 0 to
/// [`MAX_EXPIRY_WINDOW_DAYS`].
pub fn validate_expiry_window(days: i64) -> ValidationResult<()> {
    up_to("days", days, MAX_EXPIRY_WINDOW_DAYS)
}

/// Cart lines sent for a discount quote.
///
/// Same bounds a register cart enforces: at most [`MAX_CART_ITEMS`] lines,
/// each with a valid quantity and price.
pub fn validate_discount_lines(lines: &[DiscountLine]) -> ValidationResult<()> {
    if lines.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cartItems".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_price_cents("price", line.price_cents)?;
    }
    Ok(())
}

/// Tenant id on a discount.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    required(field, id)?;
    uuid::Uuid::parse_str(id.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "not a UUID".to_string(),
        })
}
