//! # Settings Repository
//!
//! One row (`id = 1`). Reading before anything was saved yields
//! [`AppSettings::default`].

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use pharmapos_core::validation::{validate_display_name, validate_tax_rate_bps};
use pharmapos_core::{AppSettings, CoreError};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<AppSettings> {
        let stored = sqlx::query_as::<_, AppSettings>(
            r#"
            SELECT pharmacy_name, address, contact_phone, default_tax_rate_bps
            FROM settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored.unwrap_or_default())
    }

    /// Replaces the stored settings.
    pub async fn save(&self, settings: &AppSettings) -> DbResult<AppSettings> {
        validate_display_name("pharmacyName", &settings.pharmacy_name).map_err(CoreError::from)?;
        validate_tax_rate_bps(settings.default_tax_rate_bps).map_err(CoreError::from)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO settings
                (id, pharmacy_name, address, contact_phone, default_tax_rate_bps)
            VALUES (1, ?1, ?2, ?3, ?4)
            "#,
        )
        .bind(settings.pharmacy_name.trim())
        .bind(&settings.address)
        .bind(&settings.contact_phone)
        .bind(settings.default_tax_rate_bps)
        .execute(&self.pool)
        .await?;

        info!(name = %settings.pharmacy_name, "Settings saved");
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;
    use crate::DbError;

    #[tokio::test]
    async fn test_defaults_until_saved() {
        let db = db().await;
        let repo = db.settings();
        assert_eq!(repo.get().await.unwrap(), AppSettings::default());

        let custom = AppSettings {
            pharmacy_name: "Botika ni Aling Nena".into(),
            default_tax_rate_bps: 1200,
            ..AppSettings::default()
        };
        repo.save(&custom).await.unwrap();
        repo.save(&custom).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), custom);
    }

    #[tokio::test]
    async fn test_rejects_bad_tax_rate() {
        let db = db().await;
        let bad = AppSettings {
            default_tax_rate_bps: 20_000,
            ..AppSettings::default()
        };
        assert!(matches!(
            db.settings().save(&bad).await,
            Err(DbError::Rule(_))
        ));
    }
}
