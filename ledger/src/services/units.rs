//! Units of measure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult};
use shared::validate_name;

const COLUMNS: &str = "id, name, abbreviation, description, created_at";

/// Unit-of-measure service
#[derive(Clone)]
pub struct UnitService {
    db: PgPool,
}

/// A unit of measure
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UnitRecord {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UnitRecord {
    /// Display form, e.g. `Kilogram (kg)`.
    pub fn display_name(&self) -> String {
        match self.abbreviation.as_deref() {
            Some(abbr) if !abbr.is_empty() => format!("{} ({})", self.name, abbr),
            _ => self.name.clone(),
        }
    }
}

/// Input for creating or updating a unit
#[derive(Debug, Clone, Deserialize)]
pub struct UnitInput {
    pub name: String,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
}

impl UnitService {
    /// Create a new UnitService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: UnitInput) -> AppResult<UnitRecord> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        let unit = sqlx::query_as::<_, UnitRecord>(&format!(
            "INSERT INTO units_of_measure (name, abbreviation, description) \
             VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.abbreviation)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("unit name".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(unit)
    }

    pub async fn update(&self, unit_id: Uuid, input: UnitInput) -> AppResult<UnitRecord> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;

        sqlx::query_as::<_, UnitRecord>(&format!(
            "UPDATE units_of_measure SET name = $1, abbreviation = $2, description = $3 \
             WHERE id = $4 RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.abbreviation)
        .bind(&input.description)
        .bind(unit_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("unit name".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("Unit of measure".to_string()))
    }

    pub async fn get(&self, unit_id: Uuid) -> AppResult<UnitRecord> {
        sqlx::query_as::<_, UnitRecord>(&format!(
            "SELECT {} FROM units_of_measure WHERE id = $1",
            COLUMNS
        ))
        .bind(unit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unit of measure".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<UnitRecord>> {
        let units = sqlx::query_as::<_, UnitRecord>(&format!(
            "SELECT {} FROM units_of_measure ORDER BY name",
            COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(units)
    }

    /// Delete a unit. Restricted while items still reference it.
    pub async fn delete(&self, unit_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM units_of_measure WHERE id = $1")
            .bind(unit_id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::validation("unit", "Unit is still referenced by items")
                } else {
                    AppError::from(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Unit of measure".to_string()));
        }
        Ok(())
    }

    /// Case-insensitive lookup by name or abbreviation, creating the unit
    /// with an empty abbreviation when absent. Used by the CSV import
    /// inside its per-row transaction.
    pub(crate) async fn find_or_create(
        tx: &mut Transaction<'_, Postgres>,
        raw: &str,
    ) -> AppResult<UnitRecord> {
        let raw = raw.trim();

        let existing = sqlx::query_as::<_, UnitRecord>(&format!(
            "SELECT {} FROM units_of_measure \
             WHERE LOWER(name) = LOWER($1) OR LOWER(abbreviation) = LOWER($1) \
             ORDER BY name LIMIT 1",
            COLUMNS
        ))
        .bind(raw)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(unit) = existing {
            return Ok(unit);
        }

        let unit = sqlx::query_as::<_, UnitRecord>(&format!(
            "INSERT INTO units_of_measure (name, abbreviation) VALUES ($1, '') RETURNING {}",
            COLUMNS
        ))
        .bind(raw)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("unit name".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(unit)
    }
}
