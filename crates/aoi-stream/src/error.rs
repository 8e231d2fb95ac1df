//! Frame Stream Error Types

use thiserror::Error;

/// Errors that fail a single participant-trial
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// A required field is absent on one of the trial's rows
    #[error("{participant_id}/{trial_id}: row {row} is missing required field `{field}`")]
    MissingField {
        participant_id: String,
        trial_id: String,
        row: usize,
        field: &'static str,
    },

    /// A field is present but cannot be parsed
    #[error("{participant_id}/{trial_id}: row {row} has invalid {field} value {value:?}")]
    InvalidValue {
        participant_id: String,
        trial_id: String,
        row: usize,
        field: &'static str,
        value: String,
    },

    /// A row carries a different participant or trial than the first row
    #[error("{participant_id}/{trial_id}: row {row} belongs to {found}")]
    MixedTrial {
        participant_id: String,
        trial_id: String,
        row: usize,
        found: String,
    },

    /// A per-trial attribute differs from the trial's first row
    #[error("{participant_id}/{trial_id}: row {row} has {field} {found:?}, first row has {expected:?}")]
    InconsistentValue {
        participant_id: String,
        trial_id: String,
        row: usize,
        field: &'static str,
        expected: String,
        found: String,
    },

    /// No rows at all
    #[error("trial has no frame rows")]
    EmptyTrial,
}

impl StreamError {
    /// Short machine-readable kind for failure tables
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::MissingField { .. } => "missing_field",
            StreamError::InvalidValue { .. } => "invalid_value",
            StreamError::MixedTrial { .. } => "mixed_trial",
            StreamError::InconsistentValue { .. } => "inconsistent_value",
            StreamError::EmptyTrial => "empty_trial",
        }
    }
}

/// Errors while reading the raw input table
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header lacks a column the schema requires
    #[error("Input has no `{0}` column")]
    MissingColumn(String),
}
