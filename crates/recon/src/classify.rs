use std::collections::BTreeMap;

use tracing::debug;

use crate::config::MatchConfig;
use crate::matcher::{BestMatch, CatalogIndex};
use crate::model::{CandidateRecord, CatalogProduct, MatchResult, MatchStatus};

/// Classify every candidate against a catalog snapshot.
///
/// Returns exactly one result per candidate, in candidate order:
/// - invalid row → UNMATCHED, no suggestion
/// - best similarity ≥ high → NO_CHANGE when every supplied price equals the
///   product's (within `price_tolerance_cents`), MATCH otherwise
/// - low ≤ best < high → UNMATCHED with the best product as suggestion
/// - below low, or empty catalog → NEW
///
/// Pure and deterministic: the catalog is scanned in id order and ties go to
/// the lowest id.
pub fn classify(candidates: &[CandidateRecord], catalog: &[CatalogProduct], config: &MatchConfig) -> Vec<MatchResult> {
    let index = CatalogIndex::new(catalog);
    let results: Vec<MatchResult> = candidates
        .iter()
        .map(|c| classify_one(c, &index, config))
        .collect();

    debug!(
        rows = results.len(),
        catalog = index.len(),
        counts = ?status_counts(&results),
        "classified import rows"
    );
    results
}

fn classify_one(candidate: &CandidateRecord, index: &CatalogIndex<'_>, config: &MatchConfig) -> MatchResult {
    let mut result = MatchResult {
        row: candidate.row,
        status: MatchStatus::New,
        name: candidate.name.clone(),
        purchase_cents: candidate.purchase_cents,
        sale_cents: candidate.sale_cents,
        group_name: candidate.group_name.clone(),
        matched_product: None,
        similarity: None,
        suggested_product: None,
        suggested_similarity: None,
        validation_error: None,
    };

    if let Some(err) = &candidate.validation_error {
        result.status = MatchStatus::Unmatched;
        result.validation_error = Some(err.to_string());
        return result;
    }

    match index.best_match(&candidate.name, config) {
        Some(BestMatch { product, similarity }) if similarity >= config.high_threshold => {
            result.status = if prices_unchanged(candidate, product, config.price_tolerance_cents) {
                MatchStatus::NoChange
            } else {
                MatchStatus::Match
            };
            result.matched_product = Some(product.clone());
            result.similarity = Some(similarity);
        }
        Some(BestMatch { product, similarity }) if similarity >= config.low_threshold => {
            result.status = MatchStatus::Unmatched;
            result.suggested_product = Some(product.clone());
            result.suggested_similarity = Some(similarity);
            result.similarity = Some(similarity);
        }
        _ => {}
    }

    result
}

/// True when no supplied price differs from the product's by more than
/// `tolerance`. A price the row does not supply is not a difference.
pub fn prices_unchanged(candidate: &CandidateRecord, product: &CatalogProduct, tolerance: i64) -> bool {
    let same = |supplied: Option<i64>, current: i64| supplied.map_or(true, |v| (v - current).abs() <= tolerance);
    same(candidate.purchase_cents, product.purchase_cents) && same(candidate.sale_cents, product.sale_cents)
}

/// Count of results per status, keyed by the status label.
pub fn status_counts(results: &[MatchResult]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for r in results {
        *counts.entry(r.status.to_string()).or_insert(0) += 1;
    }
    counts
}
