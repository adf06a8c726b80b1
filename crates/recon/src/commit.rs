//! Commit executor: applies decisions against the live catalog.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::classify::classify;
use crate::config::MatchConfig;
use crate::decision::Decisions;
use crate::error::{CommitError, ImportError};
use crate::model::{
    Action, ApplyOutcome, CandidateRecord, MatchResult, MatchStatus, NewProduct, Outcome, PriceUpdate, ProductId,
    RowNumber, RowOutcome,
};
use crate::summary::compute_summary;

/// Reclassify `candidates` against the current catalog and apply.
///
/// Only a failure to read the catalog snapshot fails the call. Every other
/// problem is recorded against its own row and the remaining rows still run.
/// Returns one [`RowOutcome`] per candidate, in candidate order.
pub fn commit<C: Catalog + ?Sized>(
    catalog: &mut C,
    candidates: &[CandidateRecord],
    decisions: &Decisions,
    config: &MatchConfig,
) -> Result<ApplyOutcome, ImportError> {
    let snapshot = catalog.find_all_active()?;
    let results = classify(candidates, &snapshot, config);
    drop(snapshot);

    for row in decisions.rows() {
        if !results.iter().any(|r| r.row == row) {
            warn!(row, "ignoring decision for a row that is not in the file");
        }
    }

    let mut executor = Executor { catalog, claimed: automatic_claims(candidates, &results) };
    let rows: Vec<RowOutcome> = candidates
        .iter()
        .zip(&results)
        .map(|(candidate, result)| executor.apply_row(candidate, result, decisions))
        .collect();

    let summary = compute_summary(&rows);
    info!(
        total = summary.total,
        created = summary.created,
        updated = summary.updated,
        unchanged = summary.unchanged,
        errors = summary.errors,
        "import applied"
    );
    Ok(ApplyOutcome { summary, rows })
}

/// Products an automatic row will settle (MATCH updates, NO_CHANGE keeps),
/// keyed to the first such row. A link to one of them would be overwritten
/// or would contradict that row, so it is rejected up front.
fn automatic_claims(candidates: &[CandidateRecord], results: &[MatchResult]) -> HashMap<ProductId, RowNumber> {
    let mut claimed = HashMap::new();
    for (candidate, result) in candidates.iter().zip(results) {
        if candidate.validation_error.is_some() {
            continue;
        }
        if let (MatchStatus::Match | MatchStatus::NoChange, Some(product)) = (result.status, &result.matched_product) {
            claimed.entry(product.id).or_insert(result.row);
        }
    }
    claimed
}

struct Executor<'c, C: Catalog + ?Sized> {
    catalog: &'c mut C,
    /// Products already taken in this batch, with the row that took them.
    claimed: HashMap<ProductId, RowNumber>,
}

impl<C: Catalog + ?Sized> Executor<'_, C> {
    fn apply_row(&mut self, candidate: &CandidateRecord, result: &MatchResult, decisions: &Decisions) -> RowOutcome {
        let row = candidate.row;
        let mut outcome = RowOutcome {
            row,
            status: result.status,
            outcome: Outcome::Skipped,
            product_id: None,
            error: None,
        };

        if let Some(err) = &candidate.validation_error {
            debug!(row, %err, "skipping invalid row");
            return outcome;
        }

        let applied = match result.status {
            MatchStatus::NoChange => Ok((Outcome::Unchanged, result.matched_product.as_ref().map(|p| p.id))),
            MatchStatus::Match => match &result.matched_product {
                Some(product) => self.update(product.id, candidate).map(|id| (Outcome::Updated, Some(id))),
                None => Ok((Outcome::Skipped, None)),
            },
            MatchStatus::New | MatchStatus::Unmatched => match decisions.effective(result) {
                Some(decision) => match decision.action {
                    Action::Skip => Ok((Outcome::Skipped, None)),
                    Action::Create => self.create(candidate).map(|id| (Outcome::Created, Some(id))),
                    Action::Link => self
                        .link(row, decision.link_product_id, candidate)
                        .map(|id| (Outcome::Updated, Some(id))),
                },
                None => Ok((Outcome::Skipped, None)),
            },
        };

        match applied {
            Ok((kind, product_id)) => {
                debug!(row, status = %result.status, outcome = %kind, ?product_id, "row applied");
                outcome.outcome = kind;
                outcome.product_id = product_id;
            }
            Err(err) => {
                warn!(row, status = %result.status, error = %err, "row failed");
                outcome.outcome = Outcome::Error;
                outcome.error = Some(err.to_string());
            }
        }
        outcome
    }

    fn create(&mut self, candidate: &CandidateRecord) -> Result<ProductId, CommitError> {
        if let Some(existing) = self.catalog.find_by_name(&candidate.name)? {
            return Err(CommitError::DuplicateName { name: candidate.name.clone(), existing_id: existing.id });
        }
        let created = self.catalog.create_product(&NewProduct {
            name: candidate.name.clone(),
            purchase_cents: candidate.purchase_cents.unwrap_or(0),
            sale_cents: candidate.sale_cents.unwrap_or(0),
            group_name: candidate.group_name.clone(),
        })?;
        Ok(created.id)
    }

    fn link(
        &mut self,
        row: RowNumber,
        target: Option<ProductId>,
        candidate: &CandidateRecord,
    ) -> Result<ProductId, CommitError> {
        let id = target.ok_or(CommitError::LinkTargetMissing)?;
        if let Some(&first_row) = self.claimed.get(&id) {
            return Err(CommitError::LinkTargetClaimed { id, first_row });
        }
        match self.catalog.find_by_id(id)? {
            Some(product) if product.active => {}
            _ => return Err(CommitError::LinkTargetNotFound { id }),
        }
        let id = self.update(id, candidate)?;
        self.claimed.insert(id, row);
        Ok(id)
    }

    fn update(&mut self, id: ProductId, candidate: &CandidateRecord) -> Result<ProductId, CommitError> {
        let prices = PriceUpdate { purchase_cents: candidate.purchase_cents, sale_cents: candidate.sale_cents };
        Ok(self.catalog.update_prices(id, prices)?.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::error::{CatalogError, RowValidationError};
    use crate::model::{CatalogProduct, DecisionEntry, ImportSummary, ProductGroup};

    fn candidate(row: RowNumber, name: &str, purchase: Option<i64>, sale: Option<i64>) -> CandidateRecord {
        CandidateRecord {
            row,
            name: name.into(),
            purchase_cents: purchase,
            sale_cents: sale,
            group_name: None,
            validation_error: None,
        }
    }

    fn decide(entries: &[(RowNumber, Action, Option<ProductId>)]) -> Decisions {
        let entries: Vec<DecisionEntry> = entries
            .iter()
            .map(|&(row, action, link_product_id)| DecisionEntry { row, action, link_product_id })
            .collect();
        Decisions::from_entries(&entries)
    }

    fn cfg() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn match_row_updates_prices() {
        let mut catalog = MemoryCatalog::new();
        let kahve = catalog.add("Kahve", 1000, 1500);
        let out = commit(&mut catalog, &[candidate(2, "Kahve", Some(1000), Some(1800))], &Decisions::new(), &cfg())
            .unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Updated);
        assert_eq!(out.rows[0].product_id, Some(kahve.id));
        assert_eq!(out.summary.updated, 1);
        assert_eq!(out.summary.matched, 1);
        assert_eq!(catalog.find_by_id(kahve.id).unwrap().unwrap().sale_cents, 1800);
    }

    #[test]
    fn decisions_on_automatic_rows_are_ignored() {
        let mut catalog = MemoryCatalog::new();
        catalog.add("Kahve", 1000, 1500);
        let decisions = decide(&[(2, Action::Create, None)]);
        let out = commit(&mut catalog, &[candidate(2, "Kahve", Some(1000), Some(1500))], &decisions, &cfg()).unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Unchanged);
        assert_eq!(catalog.products().len(), 1);
    }

    #[test]
    fn duplicate_new_names_in_one_batch() {
        let mut catalog = MemoryCatalog::new();
        let rows = [candidate(2, "Limonata", None, Some(900)), candidate(3, "limonata", None, Some(950))];
        let out = commit(&mut catalog, &rows, &Decisions::new(), &cfg()).unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Created);
        assert_eq!(out.rows[1].outcome, Outcome::Error);
        assert!(out.rows[1].error.as_deref().unwrap_or("").contains("already exists"));
        assert_eq!(out.summary.created, 1);
        assert_eq!(out.summary.errors, 1);
    }

    #[test]
    fn invalid_row_always_skips() {
        let mut catalog = MemoryCatalog::new();
        let mut bad = candidate(2, "", None, None);
        bad.validation_error = Some(RowValidationError::EmptyName);
        let out = commit(&mut catalog, &[bad], &decide(&[(2, Action::Create, None)]), &cfg()).unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Skipped);
        assert!(catalog.products().is_empty());
    }

    #[test]
    fn link_to_unknown_product_fails_row_only() {
        let mut catalog = MemoryCatalog::new();
        catalog.add("Türk Kahvesi", 1000, 2000);
        let rows = [candidate(2, "Turk Kahvesi", Some(1100), Some(2100)), candidate(3, "Limonata", None, Some(900))];
        let out = commit(&mut catalog, &rows, &decide(&[(2, Action::Link, Some(404))]), &cfg()).unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Error);
        assert_eq!(out.rows[1].outcome, Outcome::Created);
        assert_eq!(out.summary.errors, 1);
        assert_eq!(out.summary.created, 1);
    }

    #[test]
    fn link_to_inactive_product_fails() {
        let mut catalog = MemoryCatalog::new();
        catalog.add("Türk Kahvesi", 1000, 2000);
        let old = catalog.add("Eski Kahve", 100, 200);
        catalog.deactivate(old.id);
        let out = commit(
            &mut catalog,
            &[candidate(2, "Turk Kahvesi", None, Some(1))],
            &decide(&[(2, Action::Link, Some(old.id))]),
            &cfg(),
        )
        .unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Error);
    }

    #[test]
    fn link_without_target_is_an_error() {
        let mut catalog = MemoryCatalog::new();
        catalog.add("Türk Kahvesi", 1000, 2000);
        let out = commit(
            &mut catalog,
            &[candidate(2, "Turk Kahvesi", None, Some(1))],
            &decide(&[(2, Action::Link, None)]),
            &cfg(),
        )
        .unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Error);
        assert_eq!(out.rows[0].error.as_deref(), Some("link decision has no target product"));
    }

    #[test]
    fn link_honored_when_row_became_new() {
        let mut catalog = MemoryCatalog::new();
        let target = catalog.add("Espresso", 500, 900);
        let out = commit(
            &mut catalog,
            &[candidate(2, "Yepyeni Ürün", None, Some(1200))],
            &decide(&[(2, Action::Link, Some(target.id))]),
            &cfg(),
        )
        .unwrap();
        assert_eq!(out.rows[0].status, MatchStatus::New);
        assert_eq!(out.rows[0].outcome, Outcome::Updated);
        assert_eq!(catalog.find_by_id(target.id).unwrap().unwrap().sale_cents, 1200);
    }

    #[test]
    fn default_for_unmatched_is_skip() {
        let mut catalog = MemoryCatalog::new();
        catalog.add("Türk Kahvesi", 1000, 2000);
        let out = commit(&mut catalog, &[candidate(2, "Turk Kahvesi", Some(1), Some(2))], &Decisions::new(), &cfg())
            .unwrap();
        assert_eq!(out.rows[0].status, MatchStatus::Unmatched);
        assert_eq!(out.rows[0].outcome, Outcome::Skipped);
        assert_eq!(out.summary, ImportSummary { total: 1, ..Default::default() });
    }

    #[test]
    fn unknown_decision_rows_are_ignored() {
        let mut catalog = MemoryCatalog::new();
        let out = commit(
            &mut catalog,
            &[candidate(2, "Limonata", None, Some(900))],
            &decide(&[(99, Action::Skip, None)]),
            &cfg(),
        )
        .unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].outcome, Outcome::Created);
    }

    #[test]
    fn group_created_with_product() {
        let mut catalog = MemoryCatalog::new();
        let mut row = candidate(2, "Salep", Some(200), Some(600));
        row.group_name = Some("Sıcak İçecek".into());
        commit(&mut catalog, &[row], &Decisions::new(), &cfg()).unwrap();
        assert_eq!(catalog.groups(), &[ProductGroup { id: 1, name: "Sıcak İçecek".into() }]);
        assert_eq!(catalog.products()[0].group_id, Some(1));
    }

    #[test]
    fn second_link_to_same_target_rejected() {
        let mut catalog = MemoryCatalog::new();
        let target = catalog.add("Türk Kahvesi", 1000, 2000);
        let rows = [candidate(2, "Turk Kahvesi", Some(1100), Some(2100)), candidate(3, "Turk Kahvesii", None, Some(2200))];
        let decisions = decide(&[(2, Action::Link, Some(target.id)), (3, Action::Link, Some(target.id))]);
        let out = commit(&mut catalog, &rows, &decisions, &cfg()).unwrap();
        assert_eq!(out.rows[0].outcome, Outcome::Updated);
        assert_eq!(out.rows[1].outcome, Outcome::Error);
        assert!(out.rows[1].error.as_deref().unwrap_or("").contains("row 2"));
        assert_eq!(catalog.find_by_id(target.id).unwrap().unwrap().sale_cents, 2100);
    }

    #[test]
    fn link_onto_automatic_match_target_rejected() {
        let mut catalog = MemoryCatalog::new();
        let kahve = catalog.add("Kahve", 1000, 1500);
        let rows = [candidate(2, "Kahvee", Some(50), Some(99)), candidate(3, "Kahve", Some(1000), Some(1800))];
        let out = commit(&mut catalog, &rows, &decide(&[(2, Action::Link, Some(kahve.id))]), &cfg()).unwrap();

        assert_eq!(out.rows[0].outcome, Outcome::Error);
        assert!(out.rows[0].error.as_deref().unwrap_or("").contains("row 3"));
        assert_eq!(out.rows[1].outcome, Outcome::Updated);
        assert_eq!(out.summary.updated, 1);
        assert_eq!(out.summary.errors, 1);
        assert_eq!(catalog.find_by_id(kahve.id).unwrap().unwrap().sale_cents, 1800);
    }

    #[test]
    fn link_onto_unchanged_row_target_rejected() {
        let mut catalog = MemoryCatalog::new();
        let kahve = catalog.add("Kahve", 1000, 1500);
        let rows = [candidate(2, "Kahve", Some(1000), Some(1500)), candidate(3, "Kahvee", Some(50), Some(99))];
        let out = commit(&mut catalog, &rows, &decide(&[(3, Action::Link, Some(kahve.id))]), &cfg()).unwrap();

        assert_eq!(out.rows[0].outcome, Outcome::Unchanged);
        assert_eq!(out.rows[1].outcome, Outcome::Error);
        assert_eq!(catalog.find_by_id(kahve.id).unwrap().unwrap().sale_cents, 1500);
    }

    /// Catalog whose writes always fail.
    struct ReadOnly(MemoryCatalog);

    impl Catalog for ReadOnly {
        fn find_by_id(&self, id: ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
            self.0.find_by_id(id)
        }
        fn find_all_active(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
            self.0.find_all_active()
        }
        fn find_by_name(&self, name: &str) -> Result<Option<CatalogProduct>, CatalogError> {
            self.0.find_by_name(name)
        }
        fn find_group_by_name(&self, name: &str) -> Result<Option<ProductGroup>, CatalogError> {
            self.0.find_group_by_name(name)
        }
        fn create_group(&mut self, _: &str) -> Result<ProductGroup, CatalogError> {
            Err(CatalogError::Backend("read-only".into()))
        }
        fn create_product(&mut self, _: &NewProduct) -> Result<CatalogProduct, CatalogError> {
            Err(CatalogError::Backend("read-only".into()))
        }
        fn update_prices(&mut self, _: ProductId, _: PriceUpdate) -> Result<CatalogProduct, CatalogError> {
            Err(CatalogError::Backend("read-only".into()))
        }
    }

    #[test]
    fn backend_write_failures_are_per_row() {
        let mut inner = MemoryCatalog::new();
        inner.add("Kahve", 1000, 1500);
        let mut catalog = ReadOnly(inner);
        let rows = [
            candidate(2, "Kahve", Some(1000), Some(1500)),
            candidate(3, "Kahve", Some(1000), Some(1900)),
            candidate(4, "Limonata", None, Some(900)),
        ];
        let out = commit(&mut catalog, &rows, &Decisions::new(), &cfg()).unwrap();
        let kinds: Vec<Outcome> = out.rows.iter().map(|r| r.outcome).collect();
        assert_eq!(kinds, vec![Outcome::Unchanged, Outcome::Error, Outcome::Error]);
        assert_eq!(out.summary.errors, 2);
        assert_eq!(out.summary.unchanged, 1);
    }
}
