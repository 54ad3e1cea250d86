//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  AppState (Clone, cheap)                                     │
//! │  ├── db:     Database           pool handle, Arc inside      │
//! │  ├── jwt:    Arc<JwtManager>    signs / verifies tokens      │
//! │  └── config: Arc<ApiConfig>     read-only after startup      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::FixedOffset;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use pharmapos_db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.token_ttl_secs);
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// The store's local offset, used to bucket reports by day and hour.
    pub fn utc_offset(&self) -> FixedOffset {
        self.config.utc_offset()
    }
}
