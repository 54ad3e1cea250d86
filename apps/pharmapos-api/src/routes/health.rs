//! Liveness check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// `"applied/embedded"`, or `None` when the database is unreachable.
    pub schema: Option<String>,
    pub version: &'static str,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let schema = match state.db.migration_status().await {
        Ok((embedded, applied)) => Some(format!("{applied}/{embedded}")),
        Err(_) => None,
    };

    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            schema,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
