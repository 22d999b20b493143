//! Purchase entries
//!
//! A purchase increases its item's stock when posted. The unit cost falls
//! back to the item's recorded purchase price; the purchase number is
//! assigned once at creation. Deleting a purchase reverses its increase and
//! fails if the stock it brought in has already been consumed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::services::{engine, numbering};
use shared::{
    line_total, validate_quantity, validate_unit_cost, DateRange, SequenceKind, StockMovement,
};

const COLUMNS: &str = "id, purchase_number, item_id, supplier_id, quantity, unit_cost, \
                       description, date, recorded_by, created_at";

/// Purchase service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

/// A stored purchase
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub purchase_number: String,
    pub item_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// The movement this entry applied to its item's account.
    pub fn movement(&self) -> StockMovement {
        StockMovement::Purchase {
            quantity: i64::from(self.quantity),
        }
    }

    /// Total cost of this purchase.
    pub fn total_cost(&self) -> Decimal {
        line_total(self.unit_cost, i64::from(self.quantity))
    }
}

/// Input for recording or editing a purchase
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseInput {
    pub item_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    /// Falls back to the item's purchase price when absent.
    pub unit_cost: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub recorded_by: Option<Uuid>,
}

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a purchase, adding stock and assigning its purchase number.
    ///
    /// Returns the stored record and the updated balance.
    pub async fn create(&self, input: PurchaseInput) -> AppResult<(PurchaseRecord, i32)> {
        self.validate_input(&input).await?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let item = engine::lock_item(&mut tx, input.item_id).await?;
        let unit_cost = resolve_unit_cost(&mut tx, input.unit_cost, input.item_id).await?;

        let movement = StockMovement::Purchase {
            quantity: i64::from(input.quantity),
        };
        let current_stock = engine::apply_movement(&mut tx, &item, &movement).await?;

        let purchase_number =
            numbering::next_sequence_number(&mut tx, SequenceKind::Purchase, date).await?;

        let purchase = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "INSERT INTO purchases (purchase_number, item_id, supplier_id, quantity, unit_cost, \
             description, date, recorded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            COLUMNS
        ))
        .bind(&purchase_number)
        .bind(input.item_id)
        .bind(input.supplier_id)
        .bind(input.quantity)
        .bind(unit_cost)
        .bind(&input.description)
        .bind(date)
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("purchase number".to_string())
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok((purchase, current_stock))
    }

    /// Edit a purchase. The stored movement is reversed on its original
    /// item before the new one is applied; the purchase number is kept.
    pub async fn update(
        &self,
        purchase_id: Uuid,
        input: PurchaseInput,
    ) -> AppResult<(PurchaseRecord, i32)> {
        self.validate_input(&input).await?;

        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, purchase_id).await?;
        let updated_movement = StockMovement::Purchase {
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

        let unit_cost = resolve_unit_cost(&mut tx, input.unit_cost, input.item_id).await?;

        let purchase = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "UPDATE purchases SET item_id = $1, supplier_id = $2, quantity = $3, unit_cost = $4, \
             description = $5, date = $6, recorded_by = $7 WHERE id = $8 RETURNING {}",
            COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.supplier_id)
        .bind(input.quantity)
        .bind(unit_cost)
        .bind(&input.description)
        .bind(input.date.unwrap_or(stored.date))
        .bind(input.recorded_by)
        .bind(purchase_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((purchase, current_stock))
    }

    /// Delete a purchase, deducting the stock it brought in. The reversal
    /// is never skipped: if that stock has already been consumed the
    /// deletion fails with an insufficient-stock error.
    pub async fn delete(&self, purchase_id: Uuid) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, purchase_id).await?;
        let item = engine::lock_item(&mut tx, stored.item_id).await?;
        let current_stock = engine::reverse_movement(&mut tx, &item, &stored.movement()).await?;

        sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current_stock)
    }

    /// Delete every purchase, deducting each item's balance. Unwound newest
    /// first in one transaction; any reversal that would overdraw its
    /// account aborts the whole sweep.
    pub async fn delete_all(&self) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let purchases = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "SELECT {} FROM purchases ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        let mut deleted = 0u64;
        for purchase in purchases {
            let item = engine::lock_item(&mut tx, purchase.item_id).await?;
            engine::reverse_movement(&mut tx, &item, &purchase.movement()).await?;
            sqlx::query("DELETE FROM purchases WHERE id = $1")
                .bind(purchase.id)
                .execute(&mut *tx)
                .await?;
            deleted += 1;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn get(&self, purchase_id: Uuid) -> AppResult<PurchaseRecord> {
        sqlx::query_as::<_, PurchaseRecord>(&format!(
            "SELECT {} FROM purchases WHERE id = $1",
            COLUMNS
        ))
        .bind(purchase_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
    }

    /// List purchases, newest first, optionally within a date range.
    pub async fn list(&self, range: Option<DateRange>) -> AppResult<Vec<PurchaseRecord>> {
        let purchases = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "SELECT {} FROM purchases \
             WHERE ($1::date IS NULL OR date >= $1) AND ($2::date IS NULL OR date <= $2) \
             ORDER BY date DESC, created_at DESC",
            COLUMNS
        ))
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(purchases)
    }

    async fn validate_input(&self, input: &PurchaseInput) -> AppResult<()> {
        validate_quantity(i64::from(input.quantity))
            .map_err(|m| AppError::validation("quantity", m))?;
        if let Some(cost) = input.unit_cost {
            validate_unit_cost(cost).map_err(|m| AppError::validation("unit_cost", m))?;
        }

        if let Some(supplier_id) = input.supplier_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                    .bind(supplier_id)
                    .fetch_one(&self.db)
                    .await?;
            if !exists {
                return Err(AppError::validation("supplier_id", "Supplier does not exist"));
            }
        }

        Ok(())
    }
}

/// The explicit unit cost, or the item's recorded purchase price.
async fn resolve_unit_cost(
    tx: &mut Transaction<'_, Postgres>,
    unit_cost: Option<Decimal>,
    item_id: Uuid,
) -> AppResult<Decimal> {
    let cost = match unit_cost {
        Some(cost) => cost,
        None => sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT purchase_price FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_one(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::validation("unit_cost", "No purchasing price set for this item")
        })?,
    };

    validate_unit_cost(cost).map_err(|m| AppError::validation("unit_cost", m))?;
    Ok(cost)
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    purchase_id: Uuid,
) -> AppResult<PurchaseRecord> {
    sqlx::query_as::<_, PurchaseRecord>(&format!(
        "SELECT {} FROM purchases WHERE id = $1 FOR UPDATE",
        COLUMNS
    ))
    .bind(purchase_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
}
