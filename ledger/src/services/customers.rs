//! Customers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

const COLUMNS: &str = "id, name, email, phone, address, created_at";

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// A stored customer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(custom = "validate_phone_field")]
    pub phone: Option<String>,
    pub address: Option<String>,
}

fn validate_phone_field(phone: &str) -> Result<(), validator::ValidationError> {
    shared::validate_phone(phone).map_err(|message| {
        let mut error = validator::ValidationError::new("phone");
        error.message = Some(message.into());
        error
    })
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CustomerInput) -> AppResult<CustomerRecord> {
        input.validate()?;

        let customer = sqlx::query_as::<_, CustomerRecord>(&format!(
            "INSERT INTO customers (name, email, phone, address) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    pub async fn update(
        &self,
        customer_id: Uuid,
        input: CustomerInput,
    ) -> AppResult<CustomerRecord> {
        input.validate()?;

        sqlx::query_as::<_, CustomerRecord>(&format!(
            "UPDATE customers SET name = $1, email = $2, phone = $3, address = $4 \
             WHERE id = $5 RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn get(&self, customer_id: Uuid) -> AppResult<CustomerRecord> {
        sqlx::query_as::<_, CustomerRecord>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<CustomerRecord>> {
        let customers = sqlx::query_as::<_, CustomerRecord>(&format!(
            "SELECT {} FROM customers ORDER BY name",
            COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// Delete a customer. Their sales remain, with the reference cleared.
    pub async fn delete(&self, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }
}
