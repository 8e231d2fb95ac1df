//! Fixation Detection
//!
//! Collapses a trial's AOI frame stream into discrete fixation events:
//! - Minimum run length in frames (default 3)
//! - Minimum run duration in milliseconds for dwell-time analysis
//! - Per-participant outlier trimming of dwell durations

pub mod config;
pub mod detector;
pub mod dwell;

pub use config::{FixationConfig, Threshold};
pub use detector::FixationDetector;
pub use dwell::{DwellAnalyzer, DwellConfig, DwellReport, DwellSummary, ParticipantDwell};

use aoi_stream::Segment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixation detection error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixationError {
    /// Frame indices are not strictly increasing
    #[error(
        "{participant_id}/{trial_id}: frame index {current} at position {position} does not follow {previous}"
    )]
    SequenceOrder {
        participant_id: String,
        trial_id: String,
        position: usize,
        previous: u64,
        current: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FixationError {
    /// Short machine-readable kind for failure tables
    pub fn kind(&self) -> &'static str {
        match self {
            FixationError::SequenceOrder { .. } => "sequence_order",
            FixationError::Config(_) => "config",
        }
    }
}

/// A sustained gaze on one AOI within a trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    pub participant_id: String,
    pub trial_id: String,
    pub aoi_label: String,
    /// First frame index of the run (inclusive)
    pub start_frame: u64,
    /// Last frame index of the run (inclusive)
    pub end_frame: u64,
    /// Number of frames in the run
    pub duration_frames: u32,
    /// Run length converted at the configured frame rate
    pub duration_ms: f64,
    /// Order among the trial's emitted fixations, starting at 0
    pub sequence_index: usize,
    /// Segment of the run's first frame
    pub segment: Option<Segment>,
}

impl Fixation {
    /// Frames strictly between this fixation and a later one.
    ///
    /// Negative when `next` starts at or before this one's end; saturates at
    /// the `i64` bounds.
    pub fn gap_to(&self, next: &Fixation) -> i64 {
        let gap = i128::from(next.start_frame) - i128::from(self.end_frame) - 1;
        gap.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}
