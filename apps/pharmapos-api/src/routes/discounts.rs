//! Discount administration: `/discounts` and `/discounts/{id}`.
//!
//! Anyone signed in may read discounts (the register needs them); only
//! Admins may change them.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use pharmapos_core::discount::Discount;
use pharmapos_db::{DiscountInput, DiscountPatch};

pub async fn list(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Discount>>> {
    Ok(Json(state.db.discounts().list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Discount>> {
    Ok(Json(state.db.discounts().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(input): ApiJson<DiscountInput>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    let discount = state.db.discounts().create(input).await?;
    info!(id = %discount.id, by = %admin.username, "Discount created");
    Ok((StatusCode::CREATED, Json(discount)))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<DiscountPatch>,
) -> ApiResult<Json<Discount>> {
    let discount = state.db.discounts().update(&id, patch).await?;
    info!(id = %id, by = %admin.username, "Discount updated");
    Ok(Json(discount))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.db.discounts().delete(&id).await?;
    info!(id = %id, by = %admin.username, "Discount deleted");
    Ok(StatusCode::NO_CONTENT)
}
