//! # Domain Errors
//!
//! Everything the pure pharmacy logic can refuse, before any SQL runs.
//!
//! ```text
//!  request body ──► validate_* ──► ValidationError ─┐
//!                                                   ▼
//!  cart / coupon / tender / stock guard ─────► CoreError
//!                                                   │
//!                        checkout transaction ──► DbError::Rule
//!                                                   │
//!                                                   ▼
//!                                      ApiError { code, message }
//!
//!  CoreError                       code                 status
//!  ─────────────────────────────   ──────────────────   ──────
//!  ProductNotFound, Coupon*,       NOT_FOUND            404
//!    NotInCart
//!  InsufficientStock               INSUFFICIENT_STOCK   409
//!  CartEmpty, CartTooLarge         CART_ERROR           400
//!  PaymentIncomplete, Overpayment, PAYMENT_ERROR        422
//!    InvalidPaymentAmount
//!  Validation                      VALIDATION_ERROR     400
//! ```
//!
//! The coupon messages are shown to cashiers verbatim.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// A business rule said no.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Raised twice: when the cart line grows past the product's stock,
    /// and again by the conditional decrement at checkout if another
    /// register sold the units first.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// No active discount carries this coupon code.
    #[error("Coupon with code '{0}' not found or is inactive.")]
    CouponNotFound(String),

    /// Coupon exists but its start date is in the future.
    #[error("Coupon is not yet active.")]
    CouponNotYetActive,

    /// Coupon exists but its end date has passed.
    #[error("Coupon has expired.")]
    CouponExpired,

    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Checkout or suspend attempted with no lines.
    #[error("Cart is empty")]
    CartEmpty,

    /// More than [`MAX_CART_ITEMS`](crate::MAX_CART_ITEMS) distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    #[error("Payment is not complete: {remaining_cents} cents remaining")]
    PaymentIncomplete { remaining_cents: i64 },

    /// A non-cash tender tried to pay more than what is still owed.
    #[error("Cannot overpay with {method}")]
    Overpayment { method: String },

    /// Negative or oversized tender amounts, or too many of them.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A field in a request body failed its shape check.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantities, basis points, month numbers.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Barcodes, emails, discount windows.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Unknown enum spelling, e.g. a role other than Admin/Pharmacist/Cashier.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_message_names_sku() {
        let err = CoreError::InsufficientStock {
            sku: "AMOX-250".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for AMOX-250: available 3, requested 5"
        );
    }

    #[test]
    fn test_coupon_messages_match_client_toasts() {
        assert_eq!(
            CoreError::CouponNotFound("SAVE10".into()).to_string(),
            "Coupon with code 'SAVE10' not found or is inactive."
        );
        assert_eq!(
            CoreError::CouponNotYetActive.to_string(),
            "Coupon is not yet active."
        );
        assert_eq!(CoreError::CouponExpired.to_string(), "Coupon has expired.");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
