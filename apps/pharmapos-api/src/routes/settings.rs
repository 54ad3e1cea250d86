//! Store settings: read by everyone, replaced by Admins.

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use pharmapos_core::AppSettings;

pub async fn get(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<AppSettings>> {
    Ok(Json(state.db.settings().get().await?))
}

pub async fn save(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(settings): ApiJson<AppSettings>,
) -> ApiResult<Json<AppSettings>> {
    let saved = state.db.settings().save(&settings).await?;
    info!(by = %admin.username, "Settings saved");
    Ok(Json(saved))
}
