//! Sequence numbering tests
//!
//! Format checks plus an in-memory mirror of the storage probe loop in
//! `services::numbering`: start at the day's entry count plus one, bump on
//! collision until a free slot is found.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;

use shared::{format_sequence, SequenceKind};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The probe loop against an in-memory set of taken numbers.
fn next_free(kind: SequenceKind, day: NaiveDate, day_count: u32, taken: &HashSet<String>) -> String {
    let mut suffix = day_count + 1;
    loop {
        let candidate = format_sequence(kind, day, suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn three_sales_on_one_day_number_sequentially() {
        let day = date(2024, 6, 1);
        let mut taken = HashSet::new();

        for expected in ["SALE-20240601-001", "SALE-20240601-002", "SALE-20240601-003"] {
            let number = next_free(SequenceKind::Sale, day, taken.len() as u32, &taken);
            assert_eq!(number, expected);
            taken.insert(number);
        }
    }

    #[test]
    fn purchase_numbers_use_their_own_prefix() {
        assert_eq!(
            format_sequence(SequenceKind::Purchase, date(2024, 6, 1), 1),
            "PUR-20240601-001"
        );
    }

    /// A racing insert took the counted slot: the loop lands on the next
    /// free one.
    #[test]
    fn collision_retries_to_next_free_slot() {
        let day = date(2024, 6, 1);
        let mut taken = HashSet::new();
        taken.insert(format_sequence(SequenceKind::Sale, day, 1));
        // Concurrent writer grabbed -002 while our count still said one
        // entry today.
        taken.insert(format_sequence(SequenceKind::Sale, day, 2));

        let number = next_free(SequenceKind::Sale, day, 1, &taken);
        assert_eq!(number, "SALE-20240601-003");
    }

    #[test]
    fn suffix_is_zero_padded_to_three_digits() {
        let day = date(2024, 12, 31);
        assert_eq!(format_sequence(SequenceKind::Sale, day, 7), "SALE-20241231-007");
        assert_eq!(format_sequence(SequenceKind::Sale, day, 70), "SALE-20241231-070");
        assert_eq!(format_sequence(SequenceKind::Sale, day, 700), "SALE-20241231-700");
    }

    #[test]
    fn different_days_never_collide() {
        assert_ne!(
            format_sequence(SequenceKind::Sale, date(2024, 6, 1), 1),
            format_sequence(SequenceKind::Sale, date(2024, 6, 2), 1)
        );
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

        /// Sequential allocations never produce a duplicate, regardless of
        /// pre-existing numbers.
        #[test]
        fn prop_allocations_never_collide(
            prefilled in 0u32..50,
            extra in 1usize..20
        ) {
            let day = date(2024, 6, 1);
            let mut taken = HashSet::new();
            for suffix in 1..=prefilled {
                taken.insert(format_sequence(SequenceKind::Sale, day, suffix));
            }

            for _ in 0..extra {
                let number = next_free(SequenceKind::Sale, day, taken.len() as u32, &taken);
                // insert returns false on duplicates
                prop_assert!(taken.insert(number));
            }
        }

        /// Numbers within one day sort in allocation order.
        #[test]
        fn prop_numbers_sort_in_allocation_order(count in 2usize..50) {
            let day = date(2024, 6, 1);
            let mut taken = HashSet::new();
            let mut allocated = Vec::new();

            for _ in 0..count {
                let number = next_free(SequenceKind::Sale, day, taken.len() as u32, &taken);
                taken.insert(number.clone());
                allocated.push(number);
            }

            let mut sorted = allocated.clone();
            sorted.sort();
            prop_assert_eq!(allocated, sorted);
        }
    }
}
