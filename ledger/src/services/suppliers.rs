//! Suppliers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

const COLUMNS: &str = "id, name, email, phone, address, created_at";

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// A stored supplier
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a supplier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SupplierInput {
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

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: SupplierInput) -> AppResult<SupplierRecord> {
        input.validate()?;

        let supplier = sqlx::query_as::<_, SupplierRecord>(&format!(
            "INSERT INTO suppliers (name, email, phone, address) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    pub async fn update(
        &self,
        supplier_id: Uuid,
        input: SupplierInput,
    ) -> AppResult<SupplierRecord> {
        input.validate()?;

        sqlx::query_as::<_, SupplierRecord>(&format!(
            "UPDATE suppliers SET name = $1, email = $2, phone = $3, address = $4 \
             WHERE id = $5 RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn get(&self, supplier_id: Uuid) -> AppResult<SupplierRecord> {
        sqlx::query_as::<_, SupplierRecord>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            COLUMNS
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<SupplierRecord>> {
        let suppliers = sqlx::query_as::<_, SupplierRecord>(&format!(
            "SELECT {} FROM suppliers ORDER BY name",
            COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    /// Delete a supplier. Their purchases remain, with the reference
    /// cleared.
    pub async fn delete(&self, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}
