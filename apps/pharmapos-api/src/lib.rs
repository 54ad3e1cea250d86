//! # PharmaPOS API
//!
//! REST server for the pharmacy register and back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PharmaPOS API                                   │
//! │                                                                         │
//! │  Web client ──► HTTP/JSON (8080) ──► axum Router                        │
//! │                                          │                              │
//! │                     AuthUser / AdminUser extractors (JWT bearer)        │
//! │                                          │                              │
//! │                                          ▼                              │
//! │  ┌───────────────────┐   load   ┌────────────────┐  compute            │
//! │  │  pharmapos-db     │ ───────► │  handlers      │ ─────────►          │
//! │  │  SQLite repos     │ ◄─────── │  routes/*.rs   │  pharmapos-core     │
//! │  └───────────────────┘  persist └────────────────┘  (cart, discount,   │
//! │                                                      tender, report)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]; every field can be overridden with a
//! `PHARMAPOS_*` environment variable.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router over `state`.
pub fn build_router(state: AppState) -> axum::Router {
    routes::router(state)
}
