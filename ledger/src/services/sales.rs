//! Sales entries
//!
//! A sale decreases its item's stock when posted and must be covered by the
//! balance. The sales number is assigned once at creation and survives
//! edits; edits and deletes reverse the stored movement through the engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::services::{engine, numbering};
use shared::{
    line_total, sale_discount, validate_price, validate_quantity, DateRange, SequenceKind,
    StockMovement,
};

const COLUMNS: &str = "id, sales_number, item_id, customer_id, quantity, unit_price, \
                       description, date, recorded_by, created_at";

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

/// A stored sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleRecord {
    pub id: Uuid,
    pub sales_number: String,
    pub item_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl SaleRecord {
    /// The movement this entry applied to its item's account.
    pub fn movement(&self) -> StockMovement {
        StockMovement::Sale {
            quantity: i64::from(self.quantity),
        }
    }

    /// Revenue for this sale.
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, i64::from(self.quantity))
    }

    /// Discount against the item's list price, when one is set.
    pub fn discount(&self, selling_price: Option<Decimal>) -> Decimal {
        sale_discount(selling_price, self.unit_price, i64::from(self.quantity))
    }
}

/// Input for recording or editing a sale
#[derive(Debug, Clone, Deserialize)]
pub struct SaleInput {
    pub item_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub recorded_by: Option<Uuid>,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a sale, deducting stock and assigning its sales number.
    ///
    /// Returns the stored record and the updated balance.
    pub async fn create(&self, input: SaleInput) -> AppResult<(SaleRecord, i32)> {
        self.validate_input(&input).await?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let item = engine::lock_item(&mut tx, input.item_id).await?;
        let movement = StockMovement::Sale {
            quantity: i64::from(input.quantity),
        };
        let current_stock = engine::apply_movement(&mut tx, &item, &movement).await?;

        let sales_number =
            numbering::next_sequence_number(&mut tx, SequenceKind::Sale, date).await?;

        let sale = sqlx::query_as::<_, SaleRecord>(&format!(
            "INSERT INTO sales (sales_number, item_id, customer_id, quantity, unit_price, \
             description, date, recorded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            COLUMNS
        ))
        .bind(&sales_number)
        .bind(input.item_id)
        .bind(input.customer_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(&input.description)
        .bind(date)
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sales number".to_string())
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok((sale, current_stock))
    }

    /// Edit a sale. The stored movement is reversed on its original item
    /// before the new one is applied, so validation sees the restored
    /// balance; the sales number is kept.
    pub async fn update(&self, sale_id: Uuid, input: SaleInput) -> AppResult<(SaleRecord, i32)> {
        self.validate_input(&input).await?;

        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, sale_id).await?;
        let updated_movement = StockMovement::Sale {
            quantity: i64::from(input.quantity),
        };

        let current_stock = if stored.item_id == input.item_id {
            let item = engine::lock_item(&mut tx, stored.item_id).await?;
            engine::reapply_movement(&mut tx, &item, &stored.movement(), &updated_movement).await?
        } else {
            let original_item = engine::lock_item(&mut tx, stored.item_id).await?;
            let new_item = engine::lock_item(&mut tx, input.item_id).await?;
            engine::reverse_movement(&mut tx, &original_item, &stored.movement()).await?;
            engine::apply_movement(&mut tx, &new_item, &updated_movement).await?
        };

        let sale = sqlx::query_as::<_, SaleRecord>(&format!(
            "UPDATE sales SET item_id = $1, customer_id = $2, quantity = $3, unit_price = $4, \
             description = $5, date = $6, recorded_by = $7 WHERE id = $8 RETURNING {}",
            COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.customer_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(&input.description)
        .bind(input.date.unwrap_or(stored.date))
        .bind(input.recorded_by)
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((sale, current_stock))
    }

    /// Delete a sale, restoring its quantity to the item's balance.
    pub async fn delete(&self, sale_id: Uuid) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, sale_id).await?;
        let item = engine::lock_item(&mut tx, stored.item_id).await?;
        let current_stock = engine::reverse_movement(&mut tx, &item, &stored.movement()).await?;

        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current_stock)
    }

    /// Delete every sale, restoring stock levels. Unwound newest first in
    /// one transaction.
    pub async fn delete_all(&self) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let sales = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {} FROM sales ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        let mut deleted = 0u64;
        for sale in sales {
            let item = engine::lock_item(&mut tx, sale.item_id).await?;
            engine::reverse_movement(&mut tx, &item, &sale.movement()).await?;
            sqlx::query("DELETE FROM sales WHERE id = $1")
                .bind(sale.id)
                .execute(&mut *tx)
                .await?;
            deleted += 1;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn get(&self, sale_id: Uuid) -> AppResult<SaleRecord> {
        sqlx::query_as::<_, SaleRecord>(&format!("SELECT {} FROM sales WHERE id = $1", COLUMNS))
            .bind(sale_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// List sales, newest first, optionally within a date range.
    pub async fn list(&self, range: Option<DateRange>) -> AppResult<Vec<SaleRecord>> {
        let sales = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {} FROM sales \
             WHERE ($1::date IS NULL OR date >= $1) AND ($2::date IS NULL OR date <= $2) \
             ORDER BY date DESC, created_at DESC",
            COLUMNS
        ))
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }

    async fn validate_input(&self, input: &SaleInput) -> AppResult<()> {
        validate_quantity(i64::from(input.quantity))
            .map_err(|m| AppError::validation("quantity", m))?;
        validate_price(input.unit_price).map_err(|m| AppError::validation("unit_price", m))?;

        if let Some(customer_id) = input.customer_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                    .bind(customer_id)
                    .fetch_one(&self.db)
                    .await?;
            if !exists {
                return Err(AppError::validation("customer_id", "Customer does not exist"));
            }
        }

        Ok(())
    }
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    sale_id: Uuid,
) -> AppResult<SaleRecord> {
    sqlx::query_as::<_, SaleRecord>(&format!(
        "SELECT {} FROM sales WHERE id = $1 FOR UPDATE",
        COLUMNS
    ))
    .bind(sale_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Sale".to_string()))
}
