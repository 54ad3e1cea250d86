//! Register-side discount endpoints under `/sales`.
//!
//! ```text
//! calculate-discount  {cartItems}          ──► best automatic discount
//! validate-coupon     {code}               ──► the coupon, or 404
//! apply-coupon        {code, cartItems}    ──► coupon amount for the lines
//! ```
//!
//! Calculations run against the clock at request time. Client lines carry
//! their own prices, so they are bounds-checked like a register cart first.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use pharmapos_core::discount::{self, Discount, DiscountCalculation, DiscountLine};
use pharmapos_core::validation::validate_discount_lines;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateDiscountRequest {
    pub cart_items: Vec<DiscountLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
    pub cart_items: Vec<DiscountLine>,
}

pub async fn calculate_discount(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<CalculateDiscountRequest>,
) -> ApiResult<Json<DiscountCalculation>> {
    validate_discount_lines(&req.cart_items)?;
    let discounts = state.db.discounts().list_active().await?;
    let best = discount::best_automatic_discount(&discounts, &req.cart_items, Utc::now());
    debug!(
        lines = req.cart_items.len(),
        discount = ?best.discount_id,
        amount = best.amount_cents,
        "Automatic discount calculated"
    );
    Ok(Json(best))
}

/// Looks up a coupon; any reason it can't be used answers 404.
async fn find_coupon(state: &AppState, code: &str) -> ApiResult<Discount> {
    let candidates = state.db.discounts().find_by_code(code).await?;
    let coupon = discount::validate_coupon(&candidates, code, Utc::now())?;
    Ok(coupon.clone())
}

pub async fn validate_coupon(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<CouponRequest>,
) -> ApiResult<Json<Discount>> {
    Ok(Json(find_coupon(&state, &req.code).await?))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<ApplyCouponRequest>,
) -> ApiResult<Json<DiscountCalculation>> {
    validate_discount_lines(&req.cart_items)?;
    let coupon = find_coupon(&state, &req.code).await?;
    Ok(Json(discount::apply_coupon(&req.cart_items, &coupon)))
}
