//! # Reports
//!
//! Aggregates are computed in memory from the full transaction list; the
//! store's UTC offset decides which local day and hour a sale falls in.
//!
//! ```text
//! /reports/daily?date=2025-03-15        24 hourly buckets "HH:00"
//! /reports/monthly?year=2025&month=3    one bucket per day of the month
//! /reports/dashboard                    headline numbers
//! /reports/top-products?limit=5         best sellers by quantity
//! ```

use axum::extract::State;
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::local_today;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::state::AppState;
use pharmapos_core::report::{self, DailySummary, DashboardMetrics, MonthlySummary, TopProduct};
use pharmapos_core::TOP_PRODUCTS_LIMIT;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DailyParams {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MonthlyParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopParams {
    pub limit: Option<usize>,
}

pub async fn daily(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<DailyParams>,
) -> ApiResult<Json<DailySummary>> {
    let date = params.date.unwrap_or_else(|| local_today(&state));
    let transactions = state.db.transactions().list().await?;
    Ok(Json(report::daily_summary(
        &transactions,
        date,
        state.utc_offset(),
    )))
}

pub async fn monthly(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<MonthlyParams>,
) -> ApiResult<Json<MonthlySummary>> {
    let today = local_today(&state);
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());

    let transactions = state.db.transactions().list().await?;
    let summary = report::monthly_summary(&transactions, year, month, state.utc_offset())?;
    Ok(Json(summary))
}

pub async fn dashboard(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<DashboardMetrics>> {
    let transactions = state.db.transactions().list().await?;
    let products = state.db.products().list().await?;
    Ok(Json(report::dashboard_metrics(
        &transactions,
        &products,
        local_today(&state),
        state.utc_offset(),
    )))
}

pub async fn top_products(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<TopParams>,
) -> ApiResult<Json<Vec<TopProduct>>> {
    let limit = params.limit.unwrap_or(TOP_PRODUCTS_LIMIT);
    if limit == 0 {
        return Err(ApiError::validation("limit must be at least 1"));
    }
    let transactions = state.db.transactions().list().await?;
    Ok(Json(report::top_products(&transactions, limit)))
}
