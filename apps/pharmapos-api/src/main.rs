//! # PharmaPOS API Server
//!
//! ```text
//! load config ──► open SQLite (migrations) ──► seed accounts ──► serve
//!                                                                  │
//!                                        Ctrl+C / SIGTERM ──► drain, close pool
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=pharmapos=trace` - Show trace for pharmapos crates only
//! - Default: `info,pharmapos=debug,sqlx=warn`

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pharmapos_api::auth::seed_default_users;
use pharmapos_api::{build_router, ApiConfig, AppState};
use pharmapos_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting PharmaPOS API server...");

    let config = ApiConfig::load().context("Failed to load configuration")?;
    let db_path = config
        .database_path()
        .context("Failed to resolve database path")?;
    info!(
        addr = %config.listen_addr(),
        db = %db_path.display(),
        utc_offset_minutes = config.utc_offset_minutes,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(db_path.clone()))
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    if config.seed_users {
        seed_default_users(&db)
            .await
            .context("Failed to seed user accounts")?;
    }

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;
    info!(addr = %config.listen_addr(), "Listening");

    let app = build_router(AppState::new(db.clone(), config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharmapos=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
