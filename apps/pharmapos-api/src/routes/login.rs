//! `POST /auth/login`

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;
use pharmapos_core::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // Same answer for unknown user and wrong password
    let invalid = || ApiError::unauthorized("Invalid username or password");

    let user = match state.db.users().find_by_username(req.username.trim()).await? {
        Some(user) => user,
        None => {
            warn!(username = %req.username, "Login for unknown user");
            return Err(invalid());
        }
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(username = %user.username, "Login with wrong password");
        return Err(invalid());
    }

    let token = state.jwt.issue(&user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}
