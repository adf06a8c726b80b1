//! Import wizard state as a single serializable value.
//!
//! Transitions consume the session and return the next one. Changing the
//! file drops the mapping; changing the mapping drops the preview and the
//! decisions built on it.

use serde::{Deserialize, Serialize};

use crate::config::KeywordConfig;
use crate::decision::Decisions;
use crate::error::SessionError;
use crate::mapper::{guess_mapping, resolve};
use crate::model::{ApplyOutcome, ColumnMapping, Decision, MatchResult, RowNumber};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    File,
    Mapping,
    Preview,
    Result,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Mapping => write!(f, "mapping"),
            Self::Preview => write!(f, "preview"),
            Self::Result => write!(f, "result"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub mapping: ColumnMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<MatchResult>>,
    #[serde(default)]
    pub decisions: Decisions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ApplyOutcome>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over with a new file. Allowed from any stage.
    pub fn load_file(self, file_name: impl Into<String>, headers: Vec<String>, keywords: &KeywordConfig) -> Self {
        let guess = guess_mapping(&headers, None, keywords);
        Self {
            stage: Stage::Mapping,
            file_name: Some(file_name.into()),
            headers,
            mapping: guess.mapping,
            preview: None,
            decisions: Decisions::new(),
            result: None,
        }
    }

    /// Replace the mapping. Drops any preview and decisions.
    pub fn set_mapping(self, mapping: ColumnMapping) -> Result<Self, SessionError> {
        self.expect_stage("set the mapping", &[Stage::Mapping, Stage::Preview])?;
        resolve(&mapping, &self.headers)?;
        Ok(Self {
            stage: Stage::Mapping,
            mapping,
            preview: None,
            decisions: Decisions::new(),
            result: None,
            ..self
        })
    }

    /// Store a classification and seed default decisions.
    pub fn set_preview(self, items: Vec<MatchResult>) -> Result<Self, SessionError> {
        self.expect_stage("show the preview", &[Stage::Mapping, Stage::Preview])?;
        resolve(&self.mapping, &self.headers)?;
        let decisions = Decisions::seed(&items);
        Ok(Self {
            stage: Stage::Preview,
            preview: Some(items),
            decisions,
            result: None,
            ..self
        })
    }

    pub fn decide(mut self, row: RowNumber, decision: Decision) -> Result<Self, SessionError> {
        self.expect_stage("record a decision", &[Stage::Preview])?;
        let items = self.preview.as_deref().unwrap_or_default();
        self.decisions.decide(items, row, decision)?;
        Ok(self)
    }

    pub fn finish(self, outcome: ApplyOutcome) -> Result<Self, SessionError> {
        self.expect_stage("apply", &[Stage::Preview])?;
        Ok(Self { stage: Stage::Result, result: Some(outcome), ..self })
    }

    /// Return to the mapping step, dropping the preview and everything after.
    pub fn back_to_mapping(self) -> Result<Self, SessionError> {
        self.expect_stage("go back to the mapping", &[Stage::Preview, Stage::Result])?;
        Ok(Self {
            stage: Stage::Mapping,
            preview: None,
            decisions: Decisions::new(),
            result: None,
            ..self
        })
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    fn expect_stage(&self, action: &'static str, allowed: &[Stage]) -> Result<(), SessionError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(SessionError::WrongStage { action, stage: self.stage })
        }
    }
}
