//! Customer records attached to sales.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use pharmapos_core::Customer;
use pharmapos_db::CustomerInput;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Case-insensitive name substring.
    pub name: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state.db.customers().list(params.name.as_deref()).await?;
    Ok(Json(customers))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&input).await?;
    info!(id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn replace(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().replace(&id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(&id).await?;
    info!(id = %id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}
