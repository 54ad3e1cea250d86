//! Parked carts: suspend, list, resume, discard.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use pharmapos_core::SuspendedSale;
use pharmapos_db::SuspendSaleInput;

pub async fn list(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<SuspendedSale>>> {
    Ok(Json(state.db.suspended_sales().list().await?))
}

pub async fn suspend(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<SuspendSaleInput>,
) -> ApiResult<(StatusCode, Json<SuspendedSale>)> {
    let sale = state.db.suspended_sales().create(input).await?;
    info!(id = %sale.id, lines = sale.items.len(), by = %user.username, "Sale suspended");
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Returns the parked cart and removes it, so it can be resumed once.
pub async fn resume(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<SuspendedSale>> {
    let sale = state.db.suspended_sales().resume(&id).await?;
    info!(id = %id, by = %user.username, "Sale resumed");
    Ok(Json(sale))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.db.suspended_sales().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
