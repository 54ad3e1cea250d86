//! Catalog endpoints: search, CRUD, returns and inventory alerts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::local_today;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use pharmapos_core::{Product, DEFAULT_EXPIRY_WINDOW_DAYS};
use pharmapos_db::ProductInput;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    /// Name / generic name substring or exact barcode.
    pub search: Option<String>,
    /// Use the returns dialog matching (name or SKU).
    pub for_return: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpiringParams {
    /// Look-ahead in days, 0 to 3650. Defaults to 30.
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub quantity: i64,
}

pub async fn search(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<Vec<Product>>> {
    let term = params.search.unwrap_or_default();
    let products = if params.for_return {
        state.db.products().search_for_return(&term).await?
    } else {
        state.db.products().search(&term).await?
    };
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let default_tax = state.db.settings().get().await?.default_tax_rate_bps;
    let product = state.db.products().create(&input, default_tax).await?;
    info!(id = %product.id, sku = %product.sku, by = %user.username, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn replace(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().replace(&id, &input).await?;
    info!(id = %id, by = %user.username, "Product replaced");
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    info!(id = %id, by = %user.username, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /products/{id}/return`: puts units back on the shelf.
pub async fn return_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<ReturnRequest>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().add_stock(&id, req.quantity).await?;
    info!(id = %id, quantity = req.quantity, by = %user.username, "Return processed");
    Ok(Json(product))
}

pub async fn low_stock(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().low_stock().await?))
}

pub async fn expiring(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<ExpiringParams>,
) -> ApiResult<Json<Vec<Product>>> {
    let days = params.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    let products = state.db.products().expiring(days, local_today(&state)).await?;
    Ok(Json(products))
}
