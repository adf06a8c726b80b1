use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::classify::classify;
use crate::commit::commit;
use crate::config::MatchConfig;
use crate::decision::Decisions;
use crate::error::ImportError;
use crate::mapper::resolve;
use crate::model::{ApplyOutcome, CandidateRecord, ColumnMapping, Grid, MatchResult};
use crate::normalize::normalize_rows;

/// Validate the mapping against the grid and normalize every data row.
///
/// A grid without headers is a file error; a mapping that misses the name or
/// both price columns, or names a header the file lacks, is a mapping error.
pub fn prepare(grid: &Grid, mapping: &ColumnMapping) -> Result<Vec<CandidateRecord>, ImportError> {
    if grid.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::FileParse("file has no header row".into()));
    }
    let cols = resolve(mapping, &grid.headers)?;
    let candidates = normalize_rows(grid, &cols);
    debug!(
        rows = candidates.len(),
        invalid = candidates.iter().filter(|c| !c.is_valid()).count(),
        "normalized import rows"
    );
    Ok(candidates)
}

/// Classify the file against the catalog without writing anything.
pub fn preview<C: Catalog + ?Sized>(
    catalog: &C,
    grid: &Grid,
    mapping: &ColumnMapping,
    config: &MatchConfig,
) -> Result<Vec<MatchResult>, ImportError> {
    let candidates = prepare(grid, mapping)?;
    let snapshot = catalog.find_all_active()?;
    let results = classify(&candidates, &snapshot, config);
    info!(rows = results.len(), catalog = snapshot.len(), "preview computed");
    Ok(results)
}

/// Reclassify against the live catalog and apply `decisions`.
pub fn apply<C: Catalog + ?Sized>(
    catalog: &mut C,
    grid: &Grid,
    mapping: &ColumnMapping,
    decisions: &Decisions,
    config: &MatchConfig,
) -> Result<ApplyOutcome, ImportError> {
    let candidates = prepare(grid, mapping)?;
    commit(catalog, &candidates, decisions, config)
}
