//! Staff account management (Admin only).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::{hash_password, AdminUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use pharmapos_core::validation::validate_password;
use pharmapos_core::{CoreError, User, UserRole};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

/// Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

fn hashed(password: &str) -> ApiResult<String> {
    validate_password(password).map_err(CoreError::from)?;
    hash_password(password)
}

pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let hash = hashed(&req.password)?;
    let user = state
        .db
        .users()
        .create(req.username.trim(), &hash, req.role)
        .await?;
    info!(id = %user.id, by = %admin.username, "Account created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if id == admin.id && req.role.is_some_and(|r| r != UserRole::Admin) {
        return Err(ApiError::validation("You cannot remove your own Admin role"));
    }

    let hash = req.password.as_deref().map(hashed).transpose()?;
    let user = state
        .db
        .users()
        .update(
            &id,
            req.username.as_deref().map(str::trim),
            hash.as_deref(),
            req.role,
        )
        .await?;
    info!(id = %id, by = %admin.username, "Account updated");
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    if id == admin.id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }
    state.db.users().delete(&id).await?;
    info!(id = %id, by = %admin.username, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
