//! Stock ledger engine: transactional apply/reverse of entry effects
//!
//! All mutation of `items.current_stock` funnels through this module. An
//! entry service opens a transaction, locks the item row, and applies or
//! reverses a movement; the engine persists the new balance and re-evaluates
//! the low-stock alert before the caller commits. The no-overdraft invariant
//! itself lives in [`shared::StockAccount`]; this module adds persistence
//! and locking.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::alerts;
use shared::{InsufficientStock, StockAccount, StockMovement};

/// An item row as seen by the engine, locked for the duration of the
/// surrounding transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedItem {
    pub id: Uuid,
    pub name: String,
    pub reorder_point: Option<i32>,
    pub current_stock: i32,
}

/// Fetch and row-lock the item backing a stock account.
///
/// `FOR UPDATE` serializes concurrent mutations of the same item at the
/// storage layer, so validate-then-subtract and reverse-then-apply
/// sequences cannot interleave with another writer.
pub async fn lock_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> AppResult<LockedItem> {
    sqlx::query_as::<_, LockedItem>(
        "SELECT id, name, reorder_point, current_stock FROM items WHERE id = $1 FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Item".to_string()))
}

/// Apply a movement to an item's stock account and persist the new balance.
pub async fn apply_movement(
    tx: &mut Transaction<'_, Postgres>,
    item: &LockedItem,
    movement: &StockMovement,
) -> AppResult<i32> {
    let account = StockAccount::new(item.current_stock as i64)
        .apply(movement)
        .map_err(|e| insufficient(item, e))?;
    finish(tx, item, account.on_hand()).await
}

/// Reverse a previously applied movement and persist the new balance.
///
/// Keyed off the stored movement of the entry being removed or replaced,
/// never recomputed from incoming input. Never skipped on delete: a
/// reversal that would overdraw the account fails loudly instead.
pub async fn reverse_movement(
    tx: &mut Transaction<'_, Postgres>,
    item: &LockedItem,
    movement: &StockMovement,
) -> AppResult<i32> {
    let account = StockAccount::new(item.current_stock as i64)
        .reverse(movement)
        .map_err(|e| insufficient(item, e))?;
    finish(tx, item, account.on_hand()).await
}

/// Replace `original` with `updated` on the same account: reverse first,
/// then validate the new movement against the restored balance.
pub async fn reapply_movement(
    tx: &mut Transaction<'_, Postgres>,
    item: &LockedItem,
    original: &StockMovement,
    updated: &StockMovement,
) -> AppResult<i32> {
    let account = StockAccount::new(item.current_stock as i64)
        .reapply(original, updated)
        .map_err(|e| insufficient(item, e))?;
    finish(tx, item, account.on_hand()).await
}

fn insufficient(item: &LockedItem, err: InsufficientStock) -> AppError {
    AppError::InsufficientStock {
        item: item.name.clone(),
        requested: err.requested,
        available: err.available,
    }
}

/// Write the balance back and re-evaluate the low-stock alert, all inside
/// the caller's transaction.
async fn finish(
    tx: &mut Transaction<'_, Postgres>,
    item: &LockedItem,
    on_hand: i64,
) -> AppResult<i32> {
    let balance = on_hand as i32;
    sqlx::query("UPDATE items SET current_stock = $1, updated_at = now() WHERE id = $2")
        .bind(balance)
        .bind(item.id)
        .execute(&mut **tx)
        .await?;

    alerts::sync_low_stock(
        tx,
        item.id,
        &item.name,
        on_hand,
        item.reorder_point.map(i64::from),
    )
    .await?;

    tracing::debug!(item = %item.id, balance, "stock balance updated");
    Ok(balance)
}
