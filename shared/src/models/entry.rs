//! Ledger entry kinds and the signed stock-movement algebra
//!
//! Every record that mutates a stock account (adjustment, sale, purchase)
//! reduces to a [`StockMovement`]: a tagged quantity with a signed effect
//! and an exact algebraic inverse. The ledger engine applies and reverses
//! movements; it never special-cases the three entry kinds.

use serde::{Deserialize, Serialize};

/// Kinds of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Adjustment,
    Sale,
    Purchase,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Adjustment => "adjustment",
            EntryKind::Sale => "sale",
            EntryKind::Purchase => "purchase",
        }
    }
}

/// Direction of a manual inventory adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    Increase,
    Decrease,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Increase => "INCREASE",
            AdjustmentType::Decrease => "DECREASE",
        }
    }

    /// Parse the stored column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INCREASE" => Some(AdjustmentType::Increase),
            "DECREASE" => Some(AdjustmentType::Decrease),
            _ => None,
        }
    }
}

/// Why a manual adjustment was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentReason {
    Purchase,
    Sale,
    #[default]
    StockCount,
    Stolen,
    Damaged,
    Other,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Purchase => "PURCHASE",
            AdjustmentReason::Sale => "SALE",
            AdjustmentReason::StockCount => "STOCK_COUNT",
            AdjustmentReason::Stolen => "STOLEN",
            AdjustmentReason::Damaged => "DAMAGED",
            AdjustmentReason::Other => "OTHER",
        }
    }

    /// Parse the stored column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PURCHASE" => Some(AdjustmentReason::Purchase),
            "SALE" => Some(AdjustmentReason::Sale),
            "STOCK_COUNT" => Some(AdjustmentReason::StockCount),
            "STOLEN" => Some(AdjustmentReason::Stolen),
            "DAMAGED" => Some(AdjustmentReason::Damaged),
            "OTHER" => Some(AdjustmentReason::Other),
            _ => None,
        }
    }
}

/// The signed, reversible effect of one ledger entry on a stock account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockMovement {
    /// Goods received; increases stock.
    Purchase { quantity: i64 },
    /// Goods sold; decreases stock.
    Sale { quantity: i64 },
    /// Manual correction in either direction.
    Adjustment {
        adjustment_type: AdjustmentType,
        quantity: i64,
    },
}

impl StockMovement {
    pub fn kind(&self) -> EntryKind {
        match self {
            StockMovement::Purchase { .. } => EntryKind::Purchase,
            StockMovement::Sale { .. } => EntryKind::Sale,
            StockMovement::Adjustment { .. } => EntryKind::Adjustment,
        }
    }

    /// Absolute quantity the movement carries.
    pub fn quantity(&self) -> i64 {
        match self {
            StockMovement::Purchase { quantity }
            | StockMovement::Sale { quantity }
            | StockMovement::Adjustment { quantity, .. } => *quantity,
        }
    }

    /// Signed effect on `current_stock` when the movement is applied.
    pub fn effect_on_stock(&self) -> i64 {
        match self {
            StockMovement::Purchase { quantity } => *quantity,
            StockMovement::Sale { quantity } => -quantity,
            StockMovement::Adjustment {
                adjustment_type,
                quantity,
            } => match adjustment_type {
                AdjustmentType::Increase => *quantity,
                AdjustmentType::Decrease => -quantity,
            },
        }
    }

    /// Signed effect that undoes a previously applied movement.
    pub fn reversal_effect(&self) -> i64 {
        -self.effect_on_stock()
    }
}
