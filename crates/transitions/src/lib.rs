//! Transition Extraction
//!
//! Derives ordered AOI transitions from a trial's fixation sequence and
//! builds empirical transition-probability matrices per participant and
//! per participant × condition.

mod aggregate;
mod extractor;
mod matrix;

pub use aggregate::{GroupedMatrix, MatrixAggregator};
pub use extractor::{TransitionExtractor, TrialTransitions};
pub use matrix::{MatrixCell, TransitionMatrix};

use aoi_stream::normalize_label;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Transition error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("Invalid AOI vocabulary: {0}")]
    Vocabulary(String),
}

/// A move from one fixation's AOI to the next fixation's AOI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub participant_id: String,
    pub trial_id: String,
    pub from_aoi: String,
    pub to_aoi: String,
    /// Index of the pair within the trial's transition sequence
    pub position: usize,
    /// `sequence_index` of the source fixation
    pub from_fixation: usize,
    /// `sequence_index` of the target fixation
    pub to_fixation: usize,
}

/// Transition extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Trials with fewer transitions are excluded from aggregation
    pub min_transitions: usize,

    /// Drop a fixation whose label equals its predecessor's before pairing
    pub collapse_repeats: bool,

    /// AOI labels the probability matrix is restricted to
    pub vocabulary: Vec<String>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            min_transitions: 5,
            collapse_repeats: true,
            vocabulary: vec![
                "man_face".into(),
                "woman_face".into(),
                "toy_present".into(),
                "toy_location".into(),
            ],
        }
    }
}

impl TransitionConfig {
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.vocabulary.is_empty() {
            return Err(TransitionError::Vocabulary("vocabulary is empty".into()));
        }
        let mut seen = HashSet::new();
        for label in &self.vocabulary {
            if label.trim().is_empty() {
                return Err(TransitionError::Vocabulary("blank AOI label".into()));
            }
            let normalized = normalize_label(label);
            if normalized != *label {
                return Err(TransitionError::Vocabulary(format!(
                    "`{}` can never match a composed label, write `{}`",
                    label, normalized
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(TransitionError::Vocabulary(format!(
                    "`{}` is listed twice",
                    label
                )));
            }
        }
        Ok(())
    }
}
