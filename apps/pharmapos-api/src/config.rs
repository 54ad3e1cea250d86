//! # API Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`PHARMAPOS_*`)
//! 2. Config file (`pharmapos.toml`, or the path in `PHARMAPOS_CONFIG`)
//! 3. Defaults (this file)
//!
//! ## Platform Paths
//! ```text
//! config file   <config dir>/pharmapos.toml    (~/.config/pharmapos on Linux)
//! database      <data dir>/pharmapos.db        (~/.local/share/pharmapos)
//! ```
//!
//! Configuration is read once at startup and shared read-only.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Offsets beyond ±14h don't exist on Earth.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub port: u16,
    /// SQLite file. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    /// HS256 signing key for access tokens.
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Store's offset from UTC; reports bucket sales by local day/hour.
    pub utc_offset_minutes: i32,
    /// Create admin / pharmacist / cashier when the users table is empty.
    pub seed_users: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            db_path: None,
            jwt_secret: "pharmapos-dev-secret-change-in-production".to_string(),
            token_ttl_secs: 8 * 60 * 60, // one shift
            utc_offset_minutes: 0,
            seed_users: true,
        }
    }
}

impl ApiConfig {
    /// Loads defaults → file → environment, then validates.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("PHARMAPOS_CONFIG") {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => project_dirs()
                .map(|dirs| dirs.config_dir().join("pharmapos.toml"))
                .filter(|path| path.exists()),
        };
        Self::load_from(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::load`] with an explicit file and variable source.
    pub fn load_from(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => ApiConfig::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = env("PHARMAPOS_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = env("PHARMAPOS_PORT") {
            self.port = parse_var("PHARMAPOS_PORT", &v)?;
        }
        if let Some(v) = env("PHARMAPOS_DB_PATH") {
            self.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env("PHARMAPOS_JWT_SECRET") {
            self.jwt_secret = v;
        }
        if let Some(v) = env("PHARMAPOS_TOKEN_TTL_SECS") {
            self.token_ttl_secs = parse_var("PHARMAPOS_TOKEN_TTL_SECS", &v)?;
        }
        if let Some(v) = env("PHARMAPOS_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = parse_var("PHARMAPOS_UTC_OFFSET_MINUTES", &v)?;
        }
        if let Some(v) = env("PHARMAPOS_SEED_USERS") {
            self.seed_users = parse_var("PHARMAPOS_SEED_USERS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid("port", "must not be 0"));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::invalid("jwt_secret", "must not be empty"));
        }
        if self.token_ttl_secs <= 0 {
            return Err(ConfigError::invalid("token_ttl_secs", "must be positive"));
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::invalid(
                "utc_offset_minutes",
                "must be within ±840 (14 hours)",
            ));
        }
        Ok(())
    }

    /// `bind_addr:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // validate() keeps the offset in range; UTC is only a fallback
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Resolves the database file, creating the data directory if needed.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Ok(data_dir.join("pharmapos.db"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pharmapos", "pharmapos")
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}'")))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::load_from(None, env_of(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.utc_offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9000\nutc_offset_minutes = 480\nseed_users = false").unwrap();

        let config = ApiConfig::load_from(
            Some(file.path()),
            env_of(&[("PHARMAPOS_PORT", "9100"), ("PHARMAPOS_DB_PATH", "/tmp/x.db")]),
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.utc_offset_minutes, 480);
        assert!(!config.seed_users);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.utc_offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ApiConfig::load_from(None, env_of(&[("PHARMAPOS_PORT", "0")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(ApiConfig::load_from(None, env_of(&[("PHARMAPOS_PORT", "http")])).is_err());
        assert!(ApiConfig::load_from(None, env_of(&[("PHARMAPOS_JWT_SECRET", " ")])).is_err());
        assert!(
            ApiConfig::load_from(None, env_of(&[("PHARMAPOS_UTC_OFFSET_MINUTES", "900")]))
                .is_err()
        );
    }

    #[test]
    fn test_unparseable_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"eighty\"").unwrap();
        assert!(matches!(
            ApiConfig::load_from(Some(file.path()), env_of(&[])),
            Err(ConfigError::Parse { .. })
        ));
    }
}
