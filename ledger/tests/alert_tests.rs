//! Low-stock alert tests
//!
//! Covers the transition rules (raise at or below the reorder point,
//! resolve on recovery, idempotent re-evaluation) and the digest body used
//! by the summary mail.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use shared::{evaluate_low_stock, low_stock_message, AlertTransition};
use stockflow_ledger::services::alerts::{digest_text, PendingAlert};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn breach_raises_exactly_one_alert() {
        // Stock 5, reorder point 10: raise, then hold.
        assert_eq!(evaluate_low_stock(5, Some(10), false), AlertTransition::Raise);
        assert_eq!(evaluate_low_stock(5, Some(10), true), AlertTransition::NoChange);
    }

    #[test]
    fn boundary_counts_as_low() {
        assert_eq!(evaluate_low_stock(10, Some(10), false), AlertTransition::Raise);
        assert_eq!(evaluate_low_stock(11, Some(10), false), AlertTransition::NoChange);
    }

    #[test]
    fn recovery_resolves_without_new_alert() {
        // Stock back to 15: resolve the open alert, then nothing more while
        // above threshold.
        assert_eq!(evaluate_low_stock(15, Some(10), true), AlertTransition::Resolve);
        assert_eq!(evaluate_low_stock(15, Some(10), false), AlertTransition::NoChange);
    }

    #[test]
    fn no_reorder_point_never_raises() {
        assert_eq!(evaluate_low_stock(0, None, false), AlertTransition::NoChange);
        // A leftover open alert is cleaned up when the threshold is removed.
        assert_eq!(evaluate_low_stock(0, None, true), AlertTransition::Resolve);
    }

    #[test]
    fn message_names_item_and_levels() {
        let message = low_stock_message("Arabica Beans", 4, 10);
        assert!(message.contains("Arabica Beans"));
        assert!(message.contains("Current: 4"));
        assert!(message.contains("Reorder Point: 10"));
    }

    fn pending(message: &str) -> PendingAlert {
        PendingAlert {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            message: message.to_string(),
            item_name: "Item".to_string(),
            sku: "SKU-001".to_string(),
            current_stock: 2,
            reorder_point: Some(10),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn digest_joins_messages_with_blank_lines() {
        let alerts = vec![pending("first alert"), pending("second alert")];
        assert_eq!(digest_text(&alerts), "first alert\n\nsecond alert");
    }

    #[test]
    fn digest_of_nothing_is_empty() {
        assert_eq!(digest_text(&[]), "");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Replaying any stock trajectory through the monitor keeps the
        /// open-alert flag equal to "stock at or below threshold", with at
        /// most one raise per breach episode.
        #[test]
        fn prop_alert_state_tracks_threshold(
            levels in prop::collection::vec(0i64..100, 1..50),
            threshold in 0i64..100
        ) {
            let mut open = false;

            for level in levels {
                match evaluate_low_stock(level, Some(threshold), open) {
                    AlertTransition::Raise => {
                        prop_assert!(!open);
                        open = true;
                    }
                    AlertTransition::Resolve => {
                        prop_assert!(open);
                        open = false;
                    }
                    AlertTransition::NoChange => {}
                }

                prop_assert_eq!(open, level <= threshold);
            }
        }

        /// Re-evaluating the same state twice never writes twice.
        #[test]
        fn prop_sync_is_idempotent(
            level in 0i64..100,
            threshold in proptest::option::of(0i64..100),
            open in any::<bool>()
        ) {
            let first = evaluate_low_stock(level, threshold, open);
            let open_after = match first {
                AlertTransition::Raise => true,
                AlertTransition::Resolve => false,
                AlertTransition::NoChange => open,
            };

            prop_assert_eq!(
                evaluate_low_stock(level, threshold, open_after),
                AlertTransition::NoChange
            );
        }
    }
}
