//! Transaction history.

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;
use pharmapos_core::report::{self, HistoryPage, HistoryQuery};
use pharmapos_core::Transaction;

/// `GET /transactions?search=&startDate=&endDate=&sortBy=&direction=&page=`
pub async fn history(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<HistoryPage>> {
    let transactions = state.db.transactions().list().await?;
    Ok(Json(report::transaction_history(
        &transactions,
        &query,
        state.utc_offset(),
    )))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.db.transactions().get(&id).await?))
}
