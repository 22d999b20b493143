//! Low-stock alert monitoring and the email-digest surface
//!
//! [`sync_low_stock`] runs inside the same transaction as every stock
//! mutation. The pool-based [`AlertService`] methods are the read/mark
//! surface used by the scheduled summary mail and the UI badge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use shared::{evaluate_low_stock, low_stock_message, AlertTransition, AlertType};

/// Alert service for querying and marking stock alerts
#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

/// A stored stock alert
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub alert_type: String,
    pub message: String,
    pub is_resolved: bool,
    pub notified_by_email: bool,
    pub created_at: DateTime<Utc>,
}

/// An unresolved, not-yet-emailed alert joined to its item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingAlert {
    pub id: Uuid,
    pub item_id: Uuid,
    pub message: String,
    pub item_name: String,
    pub sku: String,
    pub current_stock: i32,
    pub reorder_point: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Re-evaluate the low-stock alert for an item after a balance change.
///
/// Runs inside the mutation's transaction so the alert state commits with
/// the balance it describes. At most one unresolved low-stock alert exists
/// per item; re-evaluating in an unchanged state writes nothing. Resolved
/// alerts are history and are never deleted here.
pub(crate) async fn sync_low_stock(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    item_name: &str,
    current_stock: i64,
    reorder_point: Option<i64>,
) -> AppResult<()> {
    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stock_alerts \
         WHERE item_id = $1 AND alert_type = $2 AND is_resolved = FALSE",
    )
    .bind(item_id)
    .bind(AlertType::LowStock.as_str())
    .fetch_one(&mut **tx)
    .await?;

    match evaluate_low_stock(current_stock, reorder_point, open > 0) {
        AlertTransition::Raise => {
            // evaluate_low_stock only raises when a reorder point is set
            let threshold = reorder_point.unwrap_or(0);
            sqlx::query(
                "INSERT INTO stock_alerts (item_id, alert_type, message) VALUES ($1, $2, $3)",
            )
            .bind(item_id)
            .bind(AlertType::LowStock.as_str())
            .bind(low_stock_message(item_name, current_stock, threshold))
            .execute(&mut **tx)
            .await?;
            tracing::info!(item = %item_id, current_stock, threshold, "low stock alert raised");
        }
        AlertTransition::Resolve => {
            sqlx::query(
                "UPDATE stock_alerts SET is_resolved = TRUE \
                 WHERE item_id = $1 AND alert_type = $2 AND is_resolved = FALSE",
            )
            .bind(item_id)
            .bind(AlertType::LowStock.as_str())
            .execute(&mut **tx)
            .await?;
            tracing::info!(item = %item_id, current_stock, "low stock alert resolved");
        }
        AlertTransition::NoChange => {}
    }

    Ok(())
}

impl AlertService {
    /// Create a new AlertService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List alerts, optionally for one item, newest first.
    pub async fn list(&self, item_id: Option<Uuid>) -> AppResult<Vec<AlertRecord>> {
        let alerts = sqlx::query_as::<_, AlertRecord>(
            r#"
            SELECT id, item_id, alert_type, message, is_resolved, notified_by_email, created_at
            FROM stock_alerts
            WHERE ($1::uuid IS NULL OR item_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }

    /// Number of unresolved alerts (the UI badge).
    pub async fn unresolved_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_alerts WHERE is_resolved = FALSE",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Unresolved alerts the summary mail has not yet covered.
    pub async fn pending_notification(&self) -> AppResult<Vec<PendingAlert>> {
        let pending = sqlx::query_as::<_, PendingAlert>(
            r#"
            SELECT a.id, a.item_id, a.message, i.name AS item_name, i.sku,
                   i.current_stock, i.reorder_point, a.created_at
            FROM stock_alerts a
            JOIN items i ON i.id = a.item_id
            WHERE a.is_resolved = FALSE AND a.notified_by_email = FALSE
            ORDER BY a.created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(pending)
    }

    /// Mark a batch of alerts as emailed. Called only after the caller
    /// reports a successful send; a failed send leaves them pending for the
    /// next scheduled run.
    pub async fn mark_notified(&self, alert_ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE stock_alerts SET notified_by_email = TRUE WHERE id = ANY($1)",
        )
        .bind(alert_ids)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Plain-text body of the low-stock summary mail.
pub fn digest_text(alerts: &[PendingAlert]) -> String {
    alerts
        .iter()
        .map(|alert| alert.message.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
