//! Stock account arithmetic
//!
//! A [`StockAccount`] is the authoritative on-hand quantity for one item,
//! as a pure value. The ledger engine loads the persisted balance into an
//! account, runs the movement algebra, and writes the result back inside
//! the same transaction. Decreases that are not covered by the balance fail
//! with [`InsufficientStock`] and leave the account untouched.

use thiserror::Error;

use crate::models::entry::StockMovement;

/// A decrease would overdraw the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot remove {requested} from stock; only {available} on hand")]
pub struct InsufficientStock {
    pub requested: i64,
    pub available: i64,
}

/// The authoritative current-quantity state for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAccount {
    on_hand: i64,
}

impl StockAccount {
    pub fn new(on_hand: i64) -> Self {
        Self { on_hand }
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    /// Apply a signed effect. A negative effect must be covered by the
    /// current balance.
    pub fn apply_effect(&self, effect: i64) -> Result<Self, InsufficientStock> {
        if effect < 0 && self.on_hand < -effect {
            return Err(InsufficientStock {
                requested: -effect,
                available: self.on_hand,
            });
        }
        Ok(Self {
            on_hand: self.on_hand + effect,
        })
    }

    /// Apply a movement as recorded.
    pub fn apply(&self, movement: &StockMovement) -> Result<Self, InsufficientStock> {
        self.apply_effect(movement.effect_on_stock())
    }

    /// Undo a previously applied movement.
    ///
    /// Keyed off the stored movement, never off incoming input. Reversing an
    /// increase-type entry is subject to the same overdraft check as a
    /// direct decrease: if the stock it brought in has already been
    /// consumed, the reversal fails instead of driving the balance negative.
    pub fn reverse(&self, movement: &StockMovement) -> Result<Self, InsufficientStock> {
        self.apply_effect(movement.reversal_effect())
    }

    /// Replace `original` with `updated` on this account.
    ///
    /// Reverses first, then validates the new movement against the restored
    /// balance, so shrinking a decrease-type entry is never falsely
    /// rejected.
    pub fn reapply(
        &self,
        original: &StockMovement,
        updated: &StockMovement,
    ) -> Result<Self, InsufficientStock> {
        self.reverse(original)?.apply(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::AdjustmentType;

    #[test]
    fn apply_and_reverse_round_trip() {
        let account = StockAccount::new(40);
        let movement = StockMovement::Sale { quantity: 15 };

        let applied = account.apply(&movement).unwrap();
        assert_eq!(applied.on_hand(), 25);

        let restored = applied.reverse(&movement).unwrap();
        assert_eq!(restored, account);
    }

    #[test]
    fn overdraft_is_rejected_without_mutation() {
        let account = StockAccount::new(10);
        let err = account
            .apply(&StockMovement::Sale { quantity: 11 })
            .unwrap_err();
        assert_eq!(
            err,
            InsufficientStock {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(account.on_hand(), 10);
    }

    #[test]
    fn reapply_validates_against_restored_balance() {
        // 2 on hand after a DECREASE of 8; shrinking it to 5 must pass even
        // though 5 > 2.
        let account = StockAccount::new(2);
        let original = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 8,
        };
        let updated = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 5,
        };

        let result = account.reapply(&original, &updated).unwrap();
        assert_eq!(result.on_hand(), 5);
    }
}
