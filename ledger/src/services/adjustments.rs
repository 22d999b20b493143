//! Manual inventory adjustments
//!
//! Create, edit, and delete all run through the ledger engine: an edit
//! reverses the stored movement before applying the new one, and a delete
//! always reverses. The stored row, not the incoming input, decides what
//! gets reversed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::engine;
use shared::{
    validate_price, validate_quantity, AdjustmentReason, AdjustmentType, StockMovement,
};

const COLUMNS: &str = "id, item_id, adjustment_type, quantity, cost_price, reason, description, \
                       date, recorded_by, created_at";

/// Adjustment service
#[derive(Clone)]
pub struct AdjustmentService {
    db: PgPool,
}

/// Raw adjustment row; enum columns are stored as text.
#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: Uuid,
    item_id: Uuid,
    adjustment_type: String,
    quantity: i32,
    cost_price: Option<Decimal>,
    reason: String,
    description: Option<String>,
    date: DateTime<Utc>,
    recorded_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl AdjustmentRow {
    fn into_record(self) -> AppResult<AdjustmentRecord> {
        let adjustment_type = AdjustmentType::parse(&self.adjustment_type).ok_or_else(|| {
            AppError::Internal(format!(
                "stored adjustment {} has unknown type '{}'",
                self.id, self.adjustment_type
            ))
        })?;
        let reason = AdjustmentReason::parse(&self.reason).ok_or_else(|| {
            AppError::Internal(format!(
                "stored adjustment {} has unknown reason '{}'",
                self.id, self.reason
            ))
        })?;

        Ok(AdjustmentRecord {
            id: self.id,
            item_id: self.item_id,
            adjustment_type,
            quantity: self.quantity,
            cost_price: self.cost_price,
            reason,
            description: self.description,
            date: self.date,
            recorded_by: self.recorded_by,
            created_at: self.created_at,
        })
    }
}

/// A stored inventory adjustment
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub adjustment_type: AdjustmentType,
    pub quantity: i32,
    pub cost_price: Option<Decimal>,
    pub reason: AdjustmentReason,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AdjustmentRecord {
    /// The movement this entry applied to its item's account.
    pub fn movement(&self) -> StockMovement {
        StockMovement::Adjustment {
            adjustment_type: self.adjustment_type,
            quantity: i64::from(self.quantity),
        }
    }
}

/// Input for recording or editing an adjustment
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentInput {
    pub item_id: Uuid,
    pub adjustment_type: AdjustmentType,
    pub quantity: i32,
    pub cost_price: Option<Decimal>,
    pub reason: Option<AdjustmentReason>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub recorded_by: Option<Uuid>,
}

impl AdjustmentService {
    /// Create a new AdjustmentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an adjustment and apply it to the item's stock account.
    ///
    /// Returns the stored record and the updated balance.
    pub async fn create(&self, input: AdjustmentInput) -> AppResult<(AdjustmentRecord, i32)> {
        validate_input(&input)?;

        let mut tx = self.db.begin().await?;
        let item = engine::lock_item(&mut tx, input.item_id).await?;
        let movement = StockMovement::Adjustment {
            adjustment_type: input.adjustment_type,
            quantity: i64::from(input.quantity),
        };
        let current_stock = engine::apply_movement(&mut tx, &item, &movement).await?;

        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "INSERT INTO inventory_adjustments (item_id, adjustment_type, quantity, cost_price, \
             reason, description, date, recorded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.adjustment_type.as_str())
        .bind(input.quantity)
        .bind(input.cost_price)
        .bind(input.reason.unwrap_or_default().as_str())
        .bind(&input.description)
        .bind(input.date.unwrap_or_else(Utc::now))
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into_record()?, current_stock))
    }

    /// Edit an adjustment. The stored movement is reversed on its original
    /// item, then the new movement applied to the (possibly different)
    /// item, all in one transaction; decrease validation runs against the
    /// already-reversed balance.
    pub async fn update(
        &self,
        adjustment_id: Uuid,
        input: AdjustmentInput,
    ) -> AppResult<(AdjustmentRecord, i32)> {
        validate_input(&input)?;

        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, adjustment_id).await?.into_record()?;
        let updated_movement = StockMovement::Adjustment {
            adjustment_type: input.adjustment_type,
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

        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "UPDATE inventory_adjustments SET item_id = $1, adjustment_type = $2, quantity = $3, \
             cost_price = $4, reason = $5, description = $6, date = $7, recorded_by = $8 \
             WHERE id = $9 RETURNING {}",
            COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.adjustment_type.as_str())
        .bind(input.quantity)
        .bind(input.cost_price)
        .bind(input.reason.unwrap_or(stored.reason).as_str())
        .bind(&input.description)
        .bind(input.date.unwrap_or(stored.date))
        .bind(input.recorded_by)
        .bind(adjustment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into_record()?, current_stock))
    }

    /// Delete an adjustment, reversing its effect first. The reversal is
    /// never skipped; one that would overdraw the account fails instead.
    pub async fn delete(&self, adjustment_id: Uuid) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;
        let stored = fetch_for_update(&mut tx, adjustment_id).await?.into_record()?;
        let item = engine::lock_item(&mut tx, stored.item_id).await?;
        let current_stock = engine::reverse_movement(&mut tx, &item, &stored.movement()).await?;

        sqlx::query("DELETE FROM inventory_adjustments WHERE id = $1")
            .bind(adjustment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current_stock)
    }

    /// Delete every adjustment, restoring each item's balance. Entries are
    /// unwound newest first in a single transaction; an entry whose
    /// reversal would overdraw its account aborts the whole sweep.
    pub async fn delete_all(&self) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {} FROM inventory_adjustments ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        let mut deleted = 0u64;
        for row in rows {
            let record = row.into_record()?;
            let item = engine::lock_item(&mut tx, record.item_id).await?;
            engine::reverse_movement(&mut tx, &item, &record.movement()).await?;
            sqlx::query("DELETE FROM inventory_adjustments WHERE id = $1")
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
            deleted += 1;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn get(&self, adjustment_id: Uuid) -> AppResult<AdjustmentRecord> {
        sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {} FROM inventory_adjustments WHERE id = $1",
            COLUMNS
        ))
        .bind(adjustment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Adjustment".to_string()))?
        .into_record()
    }

    /// List adjustments, newest first, optionally for one item.
    pub async fn list(&self, item_id: Option<Uuid>) -> AppResult<Vec<AdjustmentRecord>> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {} FROM inventory_adjustments \
             WHERE ($1::uuid IS NULL OR item_id = $1) \
             ORDER BY date DESC, created_at DESC",
            COLUMNS
        ))
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AdjustmentRow::into_record).collect()
    }
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    adjustment_id: Uuid,
) -> AppResult<AdjustmentRow> {
    sqlx::query_as::<_, AdjustmentRow>(&format!(
        "SELECT {} FROM inventory_adjustments WHERE id = $1 FOR UPDATE",
        COLUMNS
    ))
    .bind(adjustment_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Adjustment".to_string()))
}

fn validate_input(input: &AdjustmentInput) -> AppResult<()> {
    validate_quantity(i64::from(input.quantity))
        .map_err(|m| AppError::validation("quantity", m))?;
    if let Some(cost) = input.cost_price {
        validate_price(cost).map_err(|m| AppError::validation("cost_price", m))?;
    }
    Ok(())
}
