//! Daily sequence numbers for sales and purchases

use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};

use crate::error::AppResult;
use shared::{format_sequence, SequenceKind};

/// Generate the next free sequence number for `kind` on `date`.
///
/// The starting suffix is `count of entries dated that day + 1`; each
/// candidate is checked against storage and bumped on collision. Best
/// effort only: two writers can still race between check and insert, so
/// the unique column on the entry table is the final backstop.
pub(crate) async fn next_sequence_number(
    tx: &mut Transaction<'_, Postgres>,
    kind: SequenceKind,
    date: NaiveDate,
) -> AppResult<String> {
    let (table, column) = match kind {
        SequenceKind::Sale => ("sales", "sales_number"),
        SequenceKind::Purchase => ("purchases", "purchase_number"),
    };

    let existing: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE date = $1", table))
            .bind(date)
            .fetch_one(&mut **tx)
            .await?;

    let mut suffix = existing as u32 + 1;
    loop {
        let candidate = format_sequence(kind, date, suffix);
        let taken: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)",
            table, column
        ))
        .bind(&candidate)
        .fetch_one(&mut **tx)
        .await?;

        if !taken {
            return Ok(candidate);
        }
        tracing::debug!(%candidate, "sequence number taken, trying the next slot");
        suffix += 1;
    }
}
