use thiserror::Error;

use crate::model::{Field, MatchStatus, ProductId, RowNumber};

/// Whole-request failures. These are the only errors that fail a preview or
/// apply call; everything row-level is absorbed into the per-row results.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unreadable or empty file.
    #[error("cannot read file: {0}")]
    FileParse(String),
    /// Required column missing from the mapping.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// Catalog could not be read.
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

impl ImportError {
    /// HTTP-style status: client errors are 400, catalog failures 500.
    pub fn status(&self) -> u16 {
        match self {
            Self::FileParse(_) | Self::Mapping(_) => 400,
            Self::Catalog(_) => 500,
        }
    }

    /// Stable machine-readable kind for wire responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileParse(_) => "file_parse",
            Self::Mapping(_) => "mapping",
            Self::Catalog(_) => "catalog",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no column selected for the product name")]
    MissingNameColumn,
    #[error("no column selected for either purchase or sale price")]
    MissingPriceColumn,
    #[error("{field} column '{header}' is not in the file")]
    UnknownHeader { field: Field, header: String },
}

/// Per-row validation problem. Demotes the row to UNMATCHED / skip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowValidationError {
    #[error("product name is empty")]
    EmptyName,
    #[error("no readable price in the mapped price columns")]
    NoParsablePrice,
}

/// Per-row commit failure, counted in `errors`.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("a product named '{name}' already exists (id {existing_id})")]
    DuplicateName { name: String, existing_id: ProductId },
    #[error("link decision has no target product")]
    LinkTargetMissing,
    #[error("link target product {id} does not exist")]
    LinkTargetNotFound { id: ProductId },
    #[error("product {id} is already claimed by row {first_row}")]
    LinkTargetClaimed { id: ProductId, first_row: RowNumber },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("product {id} not found")]
    NotFound { id: ProductId },
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Operator override rejected by the decision model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("row {0} is not part of this import")]
    UnknownRow(RowNumber),
    #[error("row {row} is {status}; its disposition is automatic")]
    NotDecidable { row: RowNumber, status: MatchStatus },
    #[error("row {row} can only be linked when it is UNMATCHED")]
    LinkNotAllowed { row: RowNumber },
    #[error("row {row}: link needs a target product and no suggestion exists")]
    LinkTargetMissing { row: RowNumber },
}

/// Wizard transition attempted out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while at the {stage} stage")]
    WrongStage { action: &'static str, stage: crate::session::Stage },
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Values that parse but make no sense together.
    #[error("config validation error: {0}")]
    Validation(String),
}
