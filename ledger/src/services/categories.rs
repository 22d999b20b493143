//! Item categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::validate_name;

const COLUMNS: &str = "id, name, description, created_at";

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// An item category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<CategoryRecord> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        let category = sqlx::query_as::<_, CategoryRecord>(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("category name".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(category)
    }

    pub async fn update(
        &self,
        category_id: Uuid,
        input: CategoryInput,
    ) -> AppResult<CategoryRecord> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        sqlx::query_as::<_, CategoryRecord>(&format!(
            "UPDATE categories SET name = $1, description = $2 WHERE id = $3 RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(category_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("category name".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    pub async fn get(&self, category_id: Uuid) -> AppResult<CategoryRecord> {
        sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            COLUMNS
        ))
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryRecord>> {
        let categories = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories ORDER BY name",
            COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Delete a category. Items referencing it fall back to "no category".
    pub async fn delete(&self, category_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }
        Ok(())
    }

    /// Case-insensitive lookup by name, creating the category when absent.
    /// Used by the CSV import inside its per-row transaction.
    pub(crate) async fn get_or_create(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> AppResult<CategoryRecord> {
        let name = name.trim();

        let existing = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories WHERE LOWER(name) = LOWER($1)",
            COLUMNS
        ))
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(category) = existing {
            return Ok(category);
        }

        let category = sqlx::query_as::<_, CategoryRecord>(&format!(
            "INSERT INTO categories (name) VALUES ($1) RETURNING {}",
            COLUMNS
        ))
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("category name".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(category)
    }
}
