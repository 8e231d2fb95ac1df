//! Triplet Detection
//!
//! Finds three-fixation social-gaze sequences (person → object → person)
//! in a trial's fixation list:
//! - Ordered pattern matching against configured `valid_patterns`
//! - No-repeat rule within a window
//! - Strict or gap-tolerant inter-fixation gaps
//! - Label substitution for toy-absent variants

mod aggregate;
mod config;
mod detector;

pub use aggregate::{ConditionTriplets, TripletTally};
pub use config::{GapMode, Pattern, PatternSet, TripletConfig};
pub use detector::TripletDetector;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Triplet configuration errors, raised when the detector is built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TripletError {
    #[error("Invalid triplet pattern #{index}: {reason}")]
    InvalidPattern { index: usize, reason: String },

    #[error("Invalid toy-absent mapping: {0}")]
    InvalidMapping(String),
}

/// A detected three-fixation sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    pub participant_id: String,
    pub trial_id: String,
    /// Position of the matched entry in `valid_patterns`
    pub pattern_index: usize,
    /// Matched pattern as `a>b>c`
    pub pattern_matched: String,
    /// Raw AOI labels of the three fixations, before any substitution
    pub aoi_labels: [String; 3],
    /// `sequence_index` of the three fixations
    pub fixation_indices: [usize; 3],
    /// Frames strictly between fixations 1→2 and 2→3
    pub frame_gaps: [i64; 2],
    pub start_frame: u64,
    pub end_frame: u64,
}
