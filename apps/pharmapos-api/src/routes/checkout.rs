//! # Checkout
//!
//! `POST /checkout` turns a register cart into a completed sale.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request {items, manualDiscount, couponCode, payments, customerId}      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  1. load each product ──► Cart::add_product  (catalog price snapshot)   │
//! │  2. manual discount   ──► Cart::set_manual_discount                     │
//! │  3. coupon code       ──► validate_coupon + apply_coupon (server side)  │
//! │  4. payments          ──► TenderLedger (must cover the total)           │
//! │  5. persist           ──► TransactionRepository::checkout               │
//! │                           one SQLite tx: stock deltas + rows            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  201 {…transaction, changeDueCents}                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Client-side prices and discount amounts are never trusted; only product
//! ids, quantities, the manual discount and the coupon code are taken from
//! the request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use pharmapos_core::cart::Cart;
use pharmapos_core::discount;
use pharmapos_core::tender::TenderLedger;
use pharmapos_core::{CoreError, ManualDiscount, Money, PaymentMethod, Transaction};
use pharmapos_db::CheckoutRecord;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderInput {
    pub method: PaymentMethod,
    /// Omitted or zero pays whatever is still owed. Negative is refused.
    #[serde(default)]
    pub amount_cents: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub manual_discount: Option<ManualDiscount>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payments: Vec<TenderInput>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub change_due_cents: i64,
}

pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    if req.items.is_empty() {
        return Err(CoreError::CartEmpty.into());
    }

    // 1. Price every line from the catalog
    let mut cart = Cart::new();
    for line in &req.items {
        let product = state
            .db
            .products()
            .find(&line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        cart.add_product(&product, line.quantity)?;
    }

    // 2. Cashier discount
    cart.set_manual_discount(req.manual_discount)?;

    // 3. Coupon, re-validated against today's discounts
    if let Some(code) = req.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let candidates = state.db.discounts().find_by_code(code).await?;
        let coupon = discount::validate_coupon(&candidates, code, Utc::now())?;
        let calculation = discount::apply_coupon(&cart.discount_lines(), coupon);
        debug!(code, amount = calculation.amount_cents, "Coupon applied at checkout");
        cart.apply_coupon(code, &calculation);
    }

    // 4. Tender
    let mut ledger = TenderLedger::new(cart.total());
    for tender in &req.payments {
        ledger.add_payment(tender.method, tender.amount_cents.map(Money::from_cents))?;
    }

    // Attach the customer's stored name when only the id was sent
    let customer_name = match (&req.customer_id, req.customer_name) {
        (Some(id), None) => Some(state.db.customers().get(id).await?.name),
        (_, name) => name,
    };

    // 5. Persist atomically
    let record = CheckoutRecord::from_cart(&cart, &ledger)?
        .with_customer(req.customer_id, customer_name)
        .with_user(user.id.clone());
    let transaction = state.db.transactions().checkout(record).await?;
    let change_due_cents = ledger.change_due().cents();

    info!(
        id = %transaction.id,
        total = transaction.total_amount_cents,
        lines = transaction.items.len(),
        change = change_due_cents,
        cashier = %user.username,
        "Sale completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            transaction,
            change_due_cents,
        }),
    ))
}
