//! # pharmapos-core
//!
//! The pharmacy counter's arithmetic: which discount wins, what the cart
//! costs, how much change to hand back, what the day's report says.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmaPOS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Client (SPA)                             │   │
//! │  │    POS screen ──► Payment modal ──► Reports ──► Admin          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pharmapos-api (axum)                         │   │
//! │  │    /checkout, /sales/apply-coupon, /reports/daily, etc.        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pharmapos-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌────────┐ ┌────────┐ ┌──────────┐  │   │
//! │  │  │  types  │ │ discount │ │  cart  │ │ tender │ │  report  │  │   │
//! │  │  │ Product │ │ best-of  │ │ totals │ │ change │ │ daily /  │  │   │
//! │  │  │ Txn ... │ │ coupons  │ │ profit │ │  due   │ │ monthly  │  │   │
//! │  │  └─────────┘ └──────────┘ └────────┘ └────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  pharmapos-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, Customer, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`discount`] - Automatic discount selection and coupon validation
//! - [`cart`] - Cart lines, manual discount, totals and profit
//! - [`tender`] - Split-tender payments and change due
//! - [`inventory`] - Stock movements and inventory alerts
//! - [`report`] - Daily / monthly / dashboard aggregation and history paging
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Time-dependent rules take `now` as an argument
//! 3. **Integer Money**: All monetary values are in cents (i64), rates in basis points
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmapos_core::money::Money;
//!
//! let subtotal = Money::from_cents(25_000); // $250.00
//!
//! // 12.5% expressed in basis points
//! let off = subtotal.percentage_of(1250);
//! assert_eq!(off.cents(), 3125);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod inventory;
pub mod money;
pub mod report;
pub mod tender;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Organization used when a discount is created without one.
///
/// The discount table keeps `organization_id` for multi-branch setups; a
/// single pharmacy runs entirely under this id.
pub const DEFAULT_ORGANIZATION_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Upper bound on one line's quantity; catches a mistyped 1000 for 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price or cost accepted, in cents (10,000,000.00).
///
/// With [`MAX_CART_ITEMS`] and [`MAX_ITEM_QUANTITY`] this keeps every cart
/// total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Highest stock on hand a product may carry.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

/// Default look-ahead window for the expiring-products alert.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Longest look-ahead the expiring-products alert accepts (ten years).
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3_650;

/// Page size of the transaction history view.
pub const HISTORY_PAGE_SIZE: usize = 10;

/// How many products the dashboard's best-seller chart shows.
pub const TOP_PRODUCTS_LIMIT: usize = 5;
