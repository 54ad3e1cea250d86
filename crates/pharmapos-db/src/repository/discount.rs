//! # Discount Repository
//!
//! Stored discounts and coupons together with their eligibility rules.
//!
//! ## Storage
//! ```text
//! discounts                         discount_rules
//! ┌──────────────────────────┐      ┌──────────────────────────────┐
//! │ id                       │◄─────│ discount_id (ON DELETE       │
//! │ name, code?              │ 1..n │              CASCADE)        │
//! │ discount_type, value     │      │ rule_type PRODUCT | CATEGORY │
//! │ start_date?, end_date?   │      │ product_id? / category?      │
//! │ is_active                │      └──────────────────────────────┘
//! │ rules (JSON text)        │
//! └──────────────────────────┘
//! ```
//!
//! A discount and its rules are always written in one SQL transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::discount::{Discount, DiscountRule, DiscountRuleType, DiscountType};
use pharmapos_core::validation::{
    validate_coupon_code, validate_discount_value, validate_display_name, validate_uuid,
};
use pharmapos_core::{CoreError, ValidationError, DEFAULT_ORGANIZATION_ID};

// =============================================================================
// Inputs
// =============================================================================

/// One eligibility rule in a create / update request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRuleInput {
    pub rule_type: DiscountRuleType,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Body of `POST /discounts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountInput {
    #[serde(default)]
    pub organization_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub rules: Option<serde_json::Value>,
    #[serde(default)]
    pub discount_rules: Vec<DiscountRuleInput>,
}

fn default_true() -> bool {
    true
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Body of `PATCH /discounts/{id}`. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub code: Option<Option<String>>,
    #[serde(rename = "type")]
    pub discount_type: Option<DiscountType>,
    pub value: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub rules: Option<Option<serde_json::Value>>,
    /// When present (even empty), replaces every stored rule.
    pub discount_rules: Option<Vec<DiscountRuleInput>>,
}

fn validate_rule(rule: &DiscountRuleInput) -> Result<(), ValidationError> {
    let (field, value) = match rule.rule_type {
        DiscountRuleType::Product => ("productId", &rule.product_id),
        DiscountRuleType::Category => ("category", &rule.category),
    };
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

/// Checks a fully merged discount before it is written.
fn validate_discount(d: &Discount, rules: &[DiscountRuleInput]) -> Result<(), ValidationError> {
    validate_uuid("organizationId", &d.organization_id)?;
    validate_display_name("name", &d.name)?;
    if let Some(code) = &d.code {
        validate_coupon_code(code)?;
    }
    validate_discount_value(d.discount_type, d.value)?;
    if let (Some(start), Some(end)) = (d.start_date, d.end_date) {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "endDate".to_string(),
                reason: "must not be before startDate".to_string(),
            });
        }
    }
    if let Some(r) = &d.rules {
        if !r.is_object() {
            return Err(ValidationError::InvalidFormat {
                field: "rules".to_string(),
                reason: "must be a JSON object".to_string(),
            });
        }
    }
    rules.iter().try_for_each(validate_rule)
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    organization_id: String,
    name: String,
    code: Option<String>,
    discount_type: DiscountType,
    value: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    rules: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscountRow {
    fn into_discount(self, discount_rules: Vec<DiscountRule>) -> DbResult<Discount> {
        let rules = match self.rules {
            Some(text) => {
                Some(serde_json::from_str(&text).map_err(|e| DbError::corrupt("rules", e))?)
            }
            None => None,
        };
        Ok(Discount {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            code: self.code,
            discount_type: self.discount_type,
            value: self.value,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            rules,
            discount_rules,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    async fn attach_rules(&self, rows: Vec<DiscountRow>) -> DbResult<Vec<Discount>> {
        let all_rules = sqlx::query_as::<_, DiscountRule>(
            "SELECT * FROM discount_rules ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_discount: HashMap<String, Vec<DiscountRule>> = HashMap::new();
        for rule in all_rules {
            by_discount
                .entry(rule.discount_id.clone())
                .or_default()
                .push(rule);
        }

        rows.into_iter()
            .map(|row| {
                let rules = by_discount.remove(&row.id).unwrap_or_default();
                row.into_discount(rules)
            })
            .collect()
    }

    /// Every discount, oldest first (ties in automatic selection favour
    /// the earliest one).
    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(
            "SELECT * FROM discounts ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        self.attach_rules(rows).await
    }

    /// Active discounts only; window checks happen in core.
    pub async fn list_active(&self) -> DbResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(
            "SELECT * FROM discounts WHERE is_active = 1 ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        self.attach_rules(rows).await
    }

    /// Discounts carrying exactly `code` (zero or one, code is unique).
    pub async fn find_by_code(&self, code: &str) -> DbResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>("SELECT * FROM discounts WHERE code = ?1")
            .bind(code)
            .fetch_all(&self.pool)
            .await?;
        self.attach_rules(rows).await
    }

    /// Gets one discount; `NotFound` renders as "Discount with ID x not found".
    pub async fn get(&self, id: &str) -> DbResult<Discount> {
        let row = sqlx::query_as::<_, DiscountRow>("SELECT * FROM discounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))?;

        let rules = sqlx::query_as::<_, DiscountRule>(
            "SELECT * FROM discount_rules WHERE discount_id = ?1 ORDER BY rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        row.into_discount(rules)
    }

    pub async fn create(&self, input: DiscountInput) -> DbResult<Discount> {
        let now = Utc::now();
        let discount = Discount {
            id: generate_id(),
            organization_id: input
                .organization_id
                .unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string()),
            name: input.name.trim().to_string(),
            code: input.code,
            discount_type: input.discount_type,
            value: input.value,
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: input.is_active,
            rules: input.rules,
            discount_rules: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        validate_discount(&discount, &input.discount_rules).map_err(CoreError::from)?;

        debug!(id = %discount.id, name = %discount.name, "Inserting discount");

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, organization_id, name, code, discount_type, value,
                start_date, end_date, is_active, rules, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.organization_id)
        .bind(&discount.name)
        .bind(&discount.code)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(discount.rules.as_ref().map(|r| r.to_string()))
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| coupon_conflict(e, discount.code.as_deref()))?;

        insert_rules(&mut tx, &discount.id, &input.discount_rules).await?;
        tx.commit().await?;

        info!(id = %discount.id, coupon = discount.is_coupon(), "Discount created");
        self.get(&discount.id).await
    }

    /// Merges `patch` into the stored discount and writes it back.
    pub async fn update(&self, id: &str, patch: DiscountPatch) -> DbResult<Discount> {
        let mut discount = self.get(id).await?;

        if let Some(name) = patch.name {
            discount.name = name.trim().to_string();
        }
        if let Some(code) = patch.code {
            discount.code = code;
        }
        if let Some(kind) = patch.discount_type {
            discount.discount_type = kind;
        }
        if let Some(value) = patch.value {
            discount.value = value;
        }
        if let Some(start) = patch.start_date {
            discount.start_date = start;
        }
        if let Some(end) = patch.end_date {
            discount.end_date = end;
        }
        if let Some(active) = patch.is_active {
            discount.is_active = active;
        }
        if let Some(rules) = patch.rules {
            discount.rules = rules;
        }
        discount.updated_at = Utc::now();

        let new_rules = patch.discount_rules;
        validate_discount(&discount, new_rules.as_deref().unwrap_or_default())
            .map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE discounts SET
                name = ?2, code = ?3, discount_type = ?4, value = ?5,
                start_date = ?6, end_date = ?7, is_active = ?8, rules = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&discount.name)
        .bind(&discount.code)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(discount.rules.as_ref().map(|r| r.to_string()))
        .bind(discount.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| coupon_conflict(e, discount.code.as_deref()))?;

        if let Some(rules) = &new_rules {
            sqlx::query("DELETE FROM discount_rules WHERE discount_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_rules(&mut tx, id, rules).await?;
        }
        tx.commit().await?;

        info!(id = %id, "Discount updated");
        self.get(id).await
    }

    /// Deletes a discount; its rules go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }
        info!(id = %id, "Discount deleted");
        Ok(())
    }
}

fn coupon_conflict(err: sqlx::Error, code: Option<&str>) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("code", code.unwrap_or_default()),
        other => other,
    }
}

async fn insert_rules(
    tx: &mut Transaction<'_, Sqlite>,
    discount_id: &str,
    rules: &[DiscountRuleInput],
) -> DbResult<()> {
    for rule in rules {
        sqlx::query(
            r#"
            INSERT INTO discount_rules (id, discount_id, rule_type, product_id, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(generate_id())
        .bind(discount_id)
        .bind(rule.rule_type)
        .bind(&rule.product_id)
        .bind(&rule.category)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    fn input(name: &str, code: Option<&str>) -> DiscountInput {
        DiscountInput {
            organization_id: None,
            name: name.to_string(),
            code: code.map(str::to_string),
            discount_type: DiscountType::Percentage,
            value: 1000,
            start_date: None,
            end_date: None,
            is_active: true,
            rules: None,
            discount_rules: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_with_rules_and_get() {
        let db = db().await;
        let repo = db.discounts();

        let mut req = input("Vitamins Week", None);
        req.discount_rules.push(DiscountRuleInput {
            rule_type: DiscountRuleType::Category,
            product_id: None,
            category: Some("Supplement".into()),
        });
        let created = repo.create(req).await.unwrap();

        assert_eq!(created.organization_id, DEFAULT_ORGANIZATION_ID);
        assert_eq!(created.discount_rules.len(), 1);
        assert_eq!(created.discount_rules[0].discount_id, created.id);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].discount_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_discount_message() {
        let db = db().await;
        let err = db.discounts().get("abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Discount with ID abc not found");
    }

    #[tokio::test]
    async fn test_coupon_code_rules() {
        let db = db().await;
        let repo = db.discounts();

        assert!(repo.create(input("Lower", Some("save10"))).await.is_err());

        repo.create(input("Save", Some("SAVE10"))).await.unwrap();
        let dup = repo.create(input("Again", Some("SAVE10"))).await.unwrap_err();
        assert!(matches!(dup, DbError::UniqueViolation { ref field, .. } if field == "code"));

        assert_eq!(repo.find_by_code("SAVE10").await.unwrap().len(), 1);
        assert!(repo.find_by_code("NOPE").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rule_requires_target() {
        let db = db().await;
        let mut req = input("Broken", None);
        req.discount_rules.push(DiscountRuleInput {
            rule_type: DiscountRuleType::Product,
            product_id: None,
            category: None,
        });
        assert!(matches!(
            db.discounts().create(req).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_patch_and_delete() {
        let db = db().await;
        let repo = db.discounts();
        let mut req = input("Promo", Some("PROMO"));
        req.rules = Some(serde_json::json!({ "buy": 2, "take": 1 }));
        let d = repo.create(req).await.unwrap();

        let patch: DiscountPatch =
            serde_json::from_value(serde_json::json!({ "code": null, "isActive": false }))
                .unwrap();
        let updated = repo.update(&d.id, patch).await.unwrap();
        assert_eq!(updated.code, None);
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Promo");
        assert_eq!(updated.rules, Some(serde_json::json!({ "buy": 2, "take": 1 })));

        assert!(repo.list_active().await.unwrap().is_empty());

        repo.delete(&d.id).await.unwrap();
        assert!(repo.delete(&d.id).await.is_err());
    }
}
