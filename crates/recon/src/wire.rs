//! JSON request/response envelopes for preview and apply.

use serde::{Deserialize, Serialize};

use crate::decision::Decisions;
use crate::error::ImportError;
use crate::model::{ApplyOutcome, ColumnMapping, DecisionEntry, MatchResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub mapping: ColumnMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub items: Vec<MatchResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub mapping: ColumnMapping,
    #[serde(default)]
    pub decisions: Vec<DecisionEntry>,
}

impl ApplyRequest {
    pub fn decisions(&self) -> Decisions {
        Decisions::from_entries(&self.decisions)
    }
}

pub type ApplyResponse = ApplyOutcome;

/// Body of a whole-request failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: String,
    pub message: String,
}

impl From<&ImportError> for ErrorBody {
    fn from(err: &ImportError) -> Self {
        Self {
            status: err.status(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
