//! # Customer Repository
//!
//! Customers that can be attached to a sale for the receipt.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::validation::validate_display_name;
use pharmapos_core::{CoreError, Customer};

/// Fields a client supplies when creating or replacing a customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers by name, optionally filtered by a name substring.
    pub async fn list(&self, name_filter: Option<&str>) -> DbResult<Vec<Customer>> {
        let filter = name_filter.map(str::trim).filter(|s| !s.is_empty());

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ?1 IS NULL OR instr(lower(name), lower(?1)) > 0
            ORDER BY name
            "#,
        )
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        validate_display_name("name", &input.name).map_err(CoreError::from)?;

        let customer = Customer {
            id: generate_id(),
            name: input.name.trim().to_string(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn replace(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        validate_display_name("name", &input.name).map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, email = ?4, address = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        info!(id = %id, "Customer deleted");
        Ok(())
    }
}
