use serde::{Deserialize, Serialize};

use crate::error::RowValidationError;

/// Spreadsheet row number (header = 1, first data row = 2).
pub type RowNumber = u32;

/// Catalog product identifier.
pub type ProductId = i64;

// ---------------------------------------------------------------------------
// Input grid
// ---------------------------------------------------------------------------

/// One data row as produced by the spreadsheet decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row: RowNumber,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(row: RowNumber, cells: Vec<String>) -> Self {
        Self { row, cells }
    }

    /// Cell at `idx`, or `""` for ragged rows shorter than the header.
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|s| s.as_str()).unwrap_or("")
    }
}

/// Header row plus data rows of the first sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Grid {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a grid from literal rows; the first row is the header.
    /// Data rows are numbered from 2, matching spreadsheet row numbers.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        let mut iter = rows.iter();
        let headers = iter
            .next()
            .map(|h| h.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();
        let rows = iter
            .enumerate()
            .map(|(i, cells)| {
                RawRow::new(
                    i as RowNumber + 2,
                    cells.iter().map(|c| c.trim().to_string()).collect(),
                )
            })
            .collect();
        Self { headers, rows }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Canonical fields a spreadsheet column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Purchase,
    Sale,
    Group,
}

impl Field {
    /// Claim order used by the mapper.
    pub const ALL: [Field; 4] = [Field::Name, Field::Purchase, Field::Sale, Field::Group];
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Purchase => write!(f, "purchase"),
            Self::Sale => write!(f, "sale"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// Header names selected for each canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_col: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_col: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_col: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_col: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name_col.as_deref(),
            Field::Purchase => self.purchase_col.as_deref(),
            Field::Sale => self.sale_col.as_deref(),
            Field::Group => self.group_col.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, header: Option<String>) {
        let header = header.filter(|h| !h.trim().is_empty());
        match field {
            Field::Name => self.name_col = header,
            Field::Purchase => self.purchase_col = header,
            Field::Sale => self.sale_col = header,
            Field::Group => self.group_col = header,
        }
    }

    /// Usable once the name column and at least one price column are set.
    pub fn is_complete(&self) -> bool {
        self.name_col.is_some() && (self.purchase_col.is_some() || self.sale_col.is_some())
    }

    /// Apply operator overrides on top of this mapping; set fields win.
    pub fn overlay(mut self, overrides: &ColumnMapping) -> ColumnMapping {
        for field in Field::ALL {
            if let Some(header) = overrides.get(field) {
                self.set(field, Some(header.to_string()));
            }
        }
        self
    }
}

/// Column indexes resolved from a [`ColumnMapping`] against a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub name: usize,
    pub purchase: Option<usize>,
    pub sale: Option<usize>,
    pub group: Option<usize>,
}

// ---------------------------------------------------------------------------
// Candidate records
// ---------------------------------------------------------------------------

/// A normalized, not-yet-classified spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub row: RowNumber,
    pub name: String,
    pub purchase_cents: Option<i64>,
    pub sale_cents: Option<i64>,
    pub group_name: Option<String>,
    pub validation_error: Option<RowValidationError>,
}

impl CandidateRecord {
    pub fn is_valid(&self) -> bool {
        self.validation_error.is_none()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub purchase_cents: i64,
    pub sale_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub id: i64,
    pub name: String,
}

/// Product to be inserted by the commit executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub purchase_cents: i64,
    pub sale_cents: i64,
    /// Attached to the group of this name, created if missing.
    pub group_name: Option<String>,
}

/// Price overwrite; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceUpdate {
    pub purchase_cents: Option<i64>,
    pub sale_cents: Option<i64>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    New,
    Match,
    NoChange,
    Unmatched,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Match => write!(f, "MATCH"),
            Self::NoChange => write!(f, "NO_CHANGE"),
            Self::Unmatched => write!(f, "UNMATCHED"),
        }
    }
}

/// Classification of one candidate record. Carries the candidate's values so
/// a preview table can be rendered from the result alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub row: RowNumber,
    pub status: MatchStatus,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_product: Option<CatalogProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_product: Option<CatalogProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Skip,
    Link,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Skip => write!(f, "skip"),
            Self::Link => write!(f, "link"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_product_id: Option<ProductId>,
}

impl Decision {
    pub fn create() -> Self {
        Self { action: Action::Create, link_product_id: None }
    }

    pub fn skip() -> Self {
        Self { action: Action::Skip, link_product_id: None }
    }

    pub fn link(id: ProductId) -> Self {
        Self { action: Action::Link, link_product_id: Some(id) }
    }
}

/// Wire form of a decision: `{row, action, linkProductId?}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEntry {
    pub row: RowNumber,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_product_id: Option<ProductId>,
}

// ---------------------------------------------------------------------------
// Commit outcomes + summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Skipped,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Terminal outcome of one data row after apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutcome {
    pub row: RowNumber,
    /// Classification at apply time (may differ from the preview).
    pub status: MatchStatus,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub matched: usize,
    pub unchanged: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub summary: ImportSummary,
    pub rows: Vec<RowOutcome>,
}
