//! Item catalogue and stock account lifecycle
//!
//! Items own the authoritative `current_stock` balance. This service covers
//! the catalogue side: create (which opens the stock account), update (which
//! never touches the balance), and delete (which takes the item's ledger
//! history with it). Balance changes happen only in the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::{validate_name, validate_price, validate_sku, validate_stock_level};

const COLUMNS: &str = "id, name, sku, unit_id, category_id, selling_price, purchase_price, \
                       opening_stock, reorder_point, current_stock, created_at, updated_at";

/// Item service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// An item and its authoritative stock balance
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemRecord {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_id: Uuid,
    pub category_id: Option<Uuid>,
    pub selling_price: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub opening_stock: Option<i32>,
    pub reorder_point: Option<i32>,
    pub current_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating an item
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub name: String,
    pub sku: String,
    pub unit_id: Uuid,
    pub category_id: Option<Uuid>,
    pub selling_price: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub opening_stock: Option<i32>,
    pub reorder_point: Option<i32>,
    /// Initial balance, falling back to `opening_stock`. Honored on create
    /// only; updates never write the balance.
    pub current_stock: Option<i32>,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an item, opening its stock account.
    pub async fn create(&self, input: ItemInput) -> AppResult<ItemRecord> {
        self.validate(&input).await?;

        // Account opening is the one sanctioned direct write to the balance.
        let initial_stock = input.current_stock.or(input.opening_stock).unwrap_or(0);

        let item = sqlx::query_as::<_, ItemRecord>(&format!(
            "INSERT INTO items (name, sku, unit_id, category_id, selling_price, purchase_price, \
             opening_stock, reorder_point, current_stock) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(input.sku.trim())
        .bind(input.unit_id)
        .bind(input.category_id)
        .bind(input.selling_price)
        .bind(input.purchase_price)
        .bind(input.opening_stock)
        .bind(input.reorder_point)
        .bind(initial_stock)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sku".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(item)
    }

    /// Update catalogue fields. `current_stock` is never written here: the
    /// balance belongs to the ledger engine.
    pub async fn update(&self, item_id: Uuid, input: ItemInput) -> AppResult<ItemRecord> {
        self.validate(&input).await?;

        sqlx::query_as::<_, ItemRecord>(&format!(
            "UPDATE items SET name = $1, sku = $2, unit_id = $3, category_id = $4, \
             selling_price = $5, purchase_price = $6, opening_stock = $7, reorder_point = $8, \
             updated_at = now() WHERE id = $9 RETURNING {}",
            COLUMNS
        ))
        .bind(input.name.trim())
        .bind(input.sku.trim())
        .bind(input.unit_id)
        .bind(input.category_id)
        .bind(input.selling_price)
        .bind(input.purchase_price)
        .bind(input.opening_stock)
        .bind(input.reorder_point)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sku".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn get(&self, item_id: Uuid) -> AppResult<ItemRecord> {
        sqlx::query_as::<_, ItemRecord>(&format!("SELECT {} FROM items WHERE id = $1", COLUMNS))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn get_by_sku(&self, sku: &str) -> AppResult<ItemRecord> {
        sqlx::query_as::<_, ItemRecord>(&format!("SELECT {} FROM items WHERE sku = $1", COLUMNS))
            .bind(sku)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<ItemRecord>> {
        let items =
            sqlx::query_as::<_, ItemRecord>(&format!("SELECT {} FROM items ORDER BY name", COLUMNS))
                .fetch_all(&self.db)
                .await?;

        Ok(items)
    }

    /// Delete an item. Its ledger entries and alerts cascade with it; the
    /// history is not recoverable.
    pub async fn delete(&self, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        tracing::info!(item = %item_id, "item deleted with its ledger history");
        Ok(())
    }

    async fn validate(&self, input: &ItemInput) -> AppResult<()> {
        validate_name(&input.name).map_err(|m| AppError::validation("name", m))?;
        validate_sku(&input.sku).map_err(|m| AppError::validation("sku", m))?;

        if let Some(price) = input.selling_price {
            validate_price(price).map_err(|m| AppError::validation("selling_price", m))?;
        }
        if let Some(price) = input.purchase_price {
            validate_price(price).map_err(|m| AppError::validation("purchase_price", m))?;
        }

        for (field, value) in [
            ("opening_stock", input.opening_stock),
            ("reorder_point", input.reorder_point),
            ("current_stock", input.current_stock),
        ] {
            if let Some(level) = value {
                validate_stock_level(i64::from(level))
                    .map_err(|m| AppError::validation(field, m))?;
            }
        }

        let unit_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM units_of_measure WHERE id = $1)")
                .bind(input.unit_id)
                .fetch_one(&self.db)
                .await?;
        if !unit_exists {
            return Err(AppError::validation("unit_id", "Unit of measure does not exist"));
        }

        if let Some(category_id) = input.category_id {
            let category_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                    .bind(category_id)
                    .fetch_one(&self.db)
                    .await?;
            if !category_exists {
                return Err(AppError::validation("category_id", "Category does not exist"));
            }
        }

        Ok(())
    }
}
