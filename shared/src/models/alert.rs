//! Low-stock alert transition rules

use serde::{Deserialize, Serialize};

/// Alert categories. Only low stock today; storage keys alerts by
/// (item, type) so further categories slot in without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low_stock" => Some(AlertType::LowStock),
            _ => None,
        }
    }
}

/// What the alert monitor should do after a stock level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    /// Create a new unresolved alert.
    Raise,
    /// Mark the open alert resolved; historical alerts are never deleted.
    Resolve,
    /// State already consistent; write nothing.
    NoChange,
}

/// Decide the low-stock transition for a new balance.
///
/// At most one unresolved alert exists per item, so a breach with an open
/// alert is a no-op. An item without a reorder point never holds an open
/// alert; any open one is resolved. Evaluating twice in the same state
/// yields `NoChange` the second time.
pub fn evaluate_low_stock(
    current_stock: i64,
    reorder_point: Option<i64>,
    has_open_alert: bool,
) -> AlertTransition {
    match reorder_point {
        Some(threshold) if current_stock <= threshold => {
            if has_open_alert {
                AlertTransition::NoChange
            } else {
                AlertTransition::Raise
            }
        }
        _ => {
            if has_open_alert {
                AlertTransition::Resolve
            } else {
                AlertTransition::NoChange
            }
        }
    }
}

/// Message recorded on a freshly raised low-stock alert.
pub fn low_stock_message(item_name: &str, current_stock: i64, reorder_point: i64) -> String {
    format!(
        "Stock for '{}' is low (Current: {}, Reorder Point: {})",
        item_name, current_stock, reorder_point
    )
}
