//! HTTP route handlers.
//!
//! ## Route Map
//! ```text
//! public      GET  /health                    POST /auth/login
//! ─────────────────────────────────────────────────────────────────────────
//! any role    /products[/{id}] [/return]      /customers[/{id}]
//!             /sales/*                        /checkout
//!             /transactions[/{id}]            /suspended-sales[/{id}/resume]
//!             /reports/*                      GET /discounts[/{id}]
//!             GET /settings
//! ─────────────────────────────────────────────────────────────────────────
//! Admin       /users[/{id}]                   POST/PATCH/DELETE /discounts
//!             PUT /settings
//! ```
//!
//! Role checks live in the handler signatures: `AuthUser` for any signed-in
//! account, `AdminUser` for the Admin role.

pub mod checkout;
pub mod customers;
pub mod discounts;
pub mod health;
pub mod login;
pub mod products;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod suspended;
pub mod transactions;
pub mod users;

use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the full REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(login::login))
        // Discounts & coupons
        .route("/discounts", get(discounts::list).post(discounts::create))
        .route(
            "/discounts/{id}",
            get(discounts::get)
                .patch(discounts::update)
                .delete(discounts::delete),
        )
        .route("/sales/calculate-discount", post(sales::calculate_discount))
        .route("/sales/validate-coupon", post(sales::validate_coupon))
        .route("/sales/apply-coupon", post(sales::apply_coupon))
        // Catalog
        .route("/products", get(products::search).post(products::create))
        .route("/products/low-stock", get(products::low_stock))
        .route("/products/expiring", get(products::expiring))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::replace)
                .delete(products::delete),
        )
        .route("/products/{id}/return", post(products::return_stock))
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/{id}",
            get(customers::get)
                .put(customers::replace)
                .delete(customers::delete),
        )
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", axum::routing::put(users::update).delete(users::delete))
        // Register
        .route("/checkout", post(checkout::checkout))
        .route("/transactions", get(transactions::history))
        .route("/transactions/{id}", get(transactions::get))
        .route(
            "/suspended-sales",
            get(suspended::list).post(suspended::suspend),
        )
        .route("/suspended-sales/{id}", axum::routing::delete(suspended::delete))
        .route("/suspended-sales/{id}/resume", post(suspended::resume))
        // Back office
        .route("/reports/daily", get(reports::daily))
        .route("/reports/monthly", get(reports::monthly))
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/top-products", get(reports::top_products))
        .route("/settings", get(settings::get).put(settings::save))
        .fallback(fallback)
        .with_state(state)
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Today's date at the store.
pub(crate) fn local_today(state: &AppState) -> NaiveDate {
    Utc::now().with_timezone(&state.utc_offset()).date_naive()
}
