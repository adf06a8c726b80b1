//! `resortdesk-recon` — Catalog bulk-import reconciliation engine.
//!
//! Pure engine crate: receives a decoded spreadsheet grid and a catalog
//! handle, returns classified rows and per-row apply outcomes.
//! No CLI, file or database dependencies.

pub mod catalog;
pub mod classify;
pub mod commit;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod session;
pub mod similarity;
pub mod summary;
pub mod wire;

pub use catalog::{Catalog, MemoryCatalog};
pub use config::{KeywordConfig, MatchConfig};
pub use decision::Decisions;
pub use engine::{apply, prepare, preview};
pub use error::{
    CatalogError, CommitError, ConfigError, DecisionError, ImportError, MappingError, RowValidationError, SessionError,
};
pub use mapper::{guess_mapping, MappingGuess};
pub use model::{
    Action, ApplyOutcome, CandidateRecord, CatalogProduct, ColumnMapping, Decision, DecisionEntry, Field, Grid,
    ImportSummary, MatchResult, MatchStatus, NewProduct, Outcome, PriceUpdate, ProductGroup, ProductId, RawRow,
    RowNumber, RowOutcome,
};
pub use session::{ImportSession, Stage};
