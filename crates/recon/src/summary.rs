use crate::model::{ImportSummary, MatchStatus, Outcome, RowOutcome};

/// Aggregate per-row outcomes. Skipped rows count toward `total` only.
pub fn compute_summary(rows: &[RowOutcome]) -> ImportSummary {
    let mut summary = ImportSummary { total: rows.len(), ..ImportSummary::default() };

    for r in rows {
        match r.outcome {
            Outcome::Created => summary.created += 1,
            Outcome::Updated => {
                summary.updated += 1;
                if r.status == MatchStatus::Match {
                    summary.matched += 1;
                }
            }
            Outcome::Unchanged => summary.unchanged += 1,
            Outcome::Error => summary.errors += 1,
            Outcome::Skipped => {}
        }
    }

    summary
}
