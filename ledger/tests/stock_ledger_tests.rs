//! Stock ledger tests
//!
//! Exercises the movement algebra and account arithmetic behind the
//! engine:
//! - balance equals opening stock plus signed movement sum
//! - apply/reverse round trips (delete then re-create)
//! - edit semantics: reverse-then-validate-then-apply
//! - overdraft rejection with no mutation

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{sale_discount, AdjustmentType, InsufficientStock, StockAccount, StockMovement};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The worked example: purchase 100 into an empty account, sell 30 at a
    /// discount, then delete the sale.
    #[test]
    fn purchase_sale_delete_scenario() {
        let account = StockAccount::new(0);

        let purchase = StockMovement::Purchase { quantity: 100 };
        let account = account.apply(&purchase).unwrap();
        assert_eq!(account.on_hand(), 100);

        let sale = StockMovement::Sale { quantity: 30 };
        let account = account.apply(&sale).unwrap();
        assert_eq!(account.on_hand(), 70);

        // List price 20.00, sold at 15.00: discount is 150.00, never
        // negative.
        assert_eq!(sale_discount(Some(dec("20.00")), dec("15.00"), 30), dec("150.00"));

        // Deleting the sale reverses its stored movement.
        let account = account.reverse(&sale).unwrap();
        assert_eq!(account.on_hand(), 100);
    }

    #[test]
    fn oversell_fails_with_stock_unchanged() {
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
    fn decrease_at_exact_balance_is_allowed() {
        let account = StockAccount::new(10);
        let account = account
            .apply(&StockMovement::Adjustment {
                adjustment_type: AdjustmentType::Decrease,
                quantity: 10,
            })
            .unwrap();
        assert_eq!(account.on_hand(), 0);
    }

    /// Shrinking a DECREASE entry must validate against the restored
    /// balance, not the current one.
    #[test]
    fn shrinking_a_decrease_is_not_falsely_rejected() {
        // Opening 10, DECREASE 8 applied -> 2 on hand.
        let account = StockAccount::new(10);
        let original = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 8,
        };
        let account = account.apply(&original).unwrap();
        assert_eq!(account.on_hand(), 2);

        // Editing the entry down to 5 exceeds the 2 on hand but fits the
        // restored 10.
        let updated = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 5,
        };
        let account = account.reapply(&original, &updated).unwrap();
        assert_eq!(account.on_hand(), 5);
    }

    /// Growing a DECREASE past the restored balance still fails.
    #[test]
    fn growing_a_decrease_past_restored_balance_fails() {
        let account = StockAccount::new(10);
        let original = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 8,
        };
        let account = account.apply(&original).unwrap();

        let updated = StockMovement::Adjustment {
            adjustment_type: AdjustmentType::Decrease,
            quantity: 11,
        };
        assert!(account.reapply(&original, &updated).is_err());
        // The failed edit leaves the applied balance alone.
        assert_eq!(account.on_hand(), 2);
    }

    /// Deleting a purchase whose stock is already consumed fails instead of
    /// silently skipping the reversal.
    #[test]
    fn reversing_consumed_purchase_fails() {
        let account = StockAccount::new(0);
        let purchase = StockMovement::Purchase { quantity: 10 };
        let account = account.apply(&purchase).unwrap();
        let account = account
            .apply(&StockMovement::Sale { quantity: 7 })
            .unwrap();
        assert_eq!(account.on_hand(), 3);

        let err = account.reverse(&purchase).unwrap_err();
        assert_eq!(
            err,
            InsufficientStock {
                requested: 10,
                available: 3
            }
        );
    }

    /// Moving an entry between items is reversal on A plus apply on B.
    #[test]
    fn cross_item_move_keeps_totals_consistent() {
        let item_a = StockAccount::new(50);
        let item_b = StockAccount::new(20);
        let original = StockMovement::Sale { quantity: 10 };

        let item_a = item_a.apply(&original).unwrap();
        assert_eq!(item_a.on_hand(), 40);

        // Edit: the sale was actually of item B, for 15 units.
        let updated = StockMovement::Sale { quantity: 15 };
        let item_a = item_a.reverse(&original).unwrap();
        let item_b = item_b.apply(&updated).unwrap();

        assert_eq!(item_a.on_hand(), 50);
        assert_eq!(item_b.on_hand(), 5);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn movement_strategy() -> impl Strategy<Value = StockMovement> {
        prop_oneof![
            (1i64..=100).prop_map(|quantity| StockMovement::Purchase { quantity }),
            (1i64..=100).prop_map(|quantity| StockMovement::Sale { quantity }),
            (1i64..=100).prop_map(|quantity| StockMovement::Adjustment {
                adjustment_type: AdjustmentType::Increase,
                quantity
            }),
            (1i64..=100).prop_map(|quantity| StockMovement::Adjustment {
                adjustment_type: AdjustmentType::Decrease,
                quantity
            }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Balance equals opening stock plus increases minus decreases over
        /// the movements that were actually applied.
        #[test]
        fn prop_balance_matches_signed_sum(
            opening in 0i64..=1000,
            movements in prop::collection::vec(movement_strategy(), 0..30)
        ) {
            let mut account = StockAccount::new(opening);
            let mut increases = 0i64;
            let mut decreases = 0i64;

            for movement in &movements {
                match account.apply(movement) {
                    Ok(next) => {
                        account = next;
                        if movement.effect_on_stock() >= 0 {
                            increases += movement.quantity();
                        } else {
                            decreases += movement.quantity();
                        }
                    }
                    // A rejected movement leaves no trace.
                    Err(_) => prop_assert_eq!(
                        account.on_hand(),
                        opening + increases - decreases
                    ),
                }
            }

            prop_assert_eq!(account.on_hand(), opening + increases - decreases);
            prop_assert!(account.on_hand() >= 0);
        }

        /// Delete then re-create an identical entry restores the balance.
        #[test]
        fn prop_delete_recreate_round_trip(
            opening in 0i64..=1000,
            movement in movement_strategy()
        ) {
            let account = StockAccount::new(opening);
            if let Ok(applied) = account.apply(&movement) {
                let restored = applied.reverse(&movement).unwrap();
                prop_assert_eq!(restored.on_hand(), opening);

                let reapplied = restored.apply(&movement).unwrap();
                prop_assert_eq!(reapplied.on_hand(), applied.on_hand());
            }
        }

        /// Editing a sale from q1 to q2 moves the balance by exactly
        /// (q1 - q2).
        #[test]
        fn prop_edit_changes_balance_by_signed_delta(
            opening in 0i64..=1000,
            q1 in 1i64..=100,
            q2 in 1i64..=100
        ) {
            let account = StockAccount::new(opening);
            let original = StockMovement::Sale { quantity: q1 };
            let updated = StockMovement::Sale { quantity: q2 };

            if let Ok(applied) = account.apply(&original) {
                match applied.reapply(&original, &updated) {
                    Ok(edited) => {
                        prop_assert_eq!(edited.on_hand() - applied.on_hand(), q1 - q2);
                    }
                    // Only rejected when the new quantity exceeds the
                    // restored balance.
                    Err(_) => prop_assert!(q2 > opening),
                }
            }
        }

        /// Moving an entry from item A to item B conserves combined stock.
        #[test]
        fn prop_cross_item_move_conserves_total(
            a in 0i64..=1000,
            b in 0i64..=1000,
            q1 in 1i64..=100,
            q2 in 1i64..=100
        ) {
            let item_a = StockAccount::new(a);
            let item_b = StockAccount::new(b);
            let original = StockMovement::Purchase { quantity: q1 };
            let updated = StockMovement::Purchase { quantity: q2 };

            let a_applied = item_a.apply(&original).unwrap();
            let a_after = a_applied.reverse(&original).unwrap();
            let b_after = item_b.apply(&updated).unwrap();

            prop_assert_eq!(a_after.on_hand(), a);
            prop_assert_eq!(
                a_after.on_hand() + b_after.on_hand(),
                a + b + q2
            );
        }

        /// A reversal is always the exact algebraic inverse of the apply.
        #[test]
        fn prop_reversal_is_exact_inverse(movement in movement_strategy()) {
            prop_assert_eq!(
                movement.effect_on_stock() + movement.reversal_effect(),
                0
            );
        }

        /// Discount is never negative and zero without a list price.
        #[test]
        fn prop_discount_bounds(
            list in 1i64..=10_000,
            actual in 1i64..=10_000,
            quantity in 1i64..=100
        ) {
            let list_price = Decimal::new(list, 2);
            let unit_price = Decimal::new(actual, 2);

            let discount = sale_discount(Some(list_price), unit_price, quantity);
            prop_assert!(discount >= Decimal::ZERO);
            if unit_price >= list_price {
                prop_assert_eq!(discount, Decimal::ZERO);
            }
            prop_assert_eq!(sale_discount(None, unit_price, quantity), Decimal::ZERO);
        }
    }
}
