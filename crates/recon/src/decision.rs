use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DecisionError;
use crate::model::{Action, Decision, DecisionEntry, MatchResult, MatchStatus, RowNumber};

/// Operator decisions keyed by row number.
///
/// Only NEW and UNMATCHED rows carry an entry; MATCH and NO_CHANGE rows are
/// handled automatically at commit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decisions(BTreeMap<RowNumber, Decision>);

/// Default action for a classified row, if the row takes a decision at all.
pub fn default_decision(result: &MatchResult) -> Option<Decision> {
    match result.status {
        MatchStatus::New => Some(Decision::create()),
        MatchStatus::Unmatched => Some(Decision::skip()),
        MatchStatus::Match | MatchStatus::NoChange => None,
    }
}

impl Decisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for a fresh classification: NEW → create, UNMATCHED → skip.
    pub fn seed(results: &[MatchResult]) -> Self {
        let map = results
            .iter()
            .filter_map(|r| default_decision(r).map(|d| (r.row, d)))
            .collect();
        Self(map)
    }

    /// Record an operator override for one row.
    ///
    /// A `link` is only allowed on UNMATCHED rows; without an explicit target
    /// it takes the row's suggested product.
    pub fn decide(&mut self, results: &[MatchResult], row: RowNumber, decision: Decision) -> Result<(), DecisionError> {
        let result = results
            .iter()
            .find(|r| r.row == row)
            .ok_or(DecisionError::UnknownRow(row))?;

        if matches!(result.status, MatchStatus::Match | MatchStatus::NoChange) {
            return Err(DecisionError::NotDecidable { row, status: result.status });
        }

        let decision = match decision.action {
            Action::Link if result.status != MatchStatus::Unmatched => {
                return Err(DecisionError::LinkNotAllowed { row });
            }
            Action::Link => {
                let target = decision
                    .link_product_id
                    .or_else(|| result.suggested_product.as_ref().map(|p| p.id))
                    .ok_or(DecisionError::LinkTargetMissing { row })?;
                Decision::link(target)
            }
            Action::Create | Action::Skip => Decision { action: decision.action, link_product_id: None },
        };

        debug!(row, action = %decision.action, "decision recorded");
        self.0.insert(row, decision);
        Ok(())
    }

    pub fn get(&self, row: RowNumber) -> Option<&Decision> {
        self.0.get(&row)
    }

    /// Decision for a row, falling back to its classification default.
    pub fn effective(&self, result: &MatchResult) -> Option<Decision> {
        match result.status {
            MatchStatus::Match | MatchStatus::NoChange => None,
            _ => self.get(result.row).copied().or_else(|| default_decision(result)),
        }
    }

    /// Build from wire entries. A later entry for the same row wins.
    pub fn from_entries(entries: &[DecisionEntry]) -> Self {
        let map = entries
            .iter()
            .map(|e| (e.row, Decision { action: e.action, link_product_id: e.link_product_id }))
            .collect();
        Self(map)
    }

    pub fn to_entries(&self) -> Vec<DecisionEntry> {
        self.0
            .iter()
            .map(|(&row, d)| DecisionEntry { row, action: d.action, link_product_id: d.link_product_id })
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowNumber> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
