//! Sequence number formatting for sales and purchases

use chrono::NaiveDate;

/// Entry families that carry a human-readable daily sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Sale,
    Purchase,
}

impl SequenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Sale => "SALE",
            SequenceKind::Purchase => "PUR",
        }
    }
}

/// Format `PREFIX-YYYYMMDD-NNN`, e.g. `SALE-20240601-003`.
///
/// The suffix is zero-padded to three digits but not truncated: the
/// thousandth entry of a day becomes `-1000`.
pub fn format_sequence(kind: SequenceKind, date: NaiveDate, suffix: u32) -> String {
    format!("{}-{}-{:03}", kind.prefix(), date.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_prefix_date_and_padded_suffix() {
        assert_eq!(
            format_sequence(SequenceKind::Sale, date(2024, 6, 1), 3),
            "SALE-20240601-003"
        );
        assert_eq!(
            format_sequence(SequenceKind::Purchase, date(2024, 12, 31), 42),
            "PUR-20241231-042"
        );
    }

    #[test]
    fn suffix_grows_past_three_digits() {
        assert_eq!(
            format_sequence(SequenceKind::Sale, date(2024, 6, 1), 1000),
            "SALE-20240601-1000"
        );
    }
}
