//! Master Fixation Log
//!
//! Holds every detected fixation together with its trial metadata, in
//! processing order, and exports the output tables consumed by the
//! downstream analyses.

mod log;
mod writer;

pub use log::{FixationLog, FixationRecord};
pub use writer::{
    TableWriter, TrialFailure, DWELL_FILE, FAILURES_FILE, FIXATIONS_FILE, SUMMARY_FILE,
    TRANSITIONS_FILE, TRIPLETS_FILE,
};

use thiserror::Error;

/// Log and export errors
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Trial {0} is already in the log")]
    DuplicateTrial(String),
}
