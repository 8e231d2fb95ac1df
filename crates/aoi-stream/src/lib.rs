//! AOI Frame Stream
//!
//! Turns raw per-frame annotation rows into an ordered stream of
//! `(frame_index, aoi_label)` pairs for one participant-trial:
//! - AOI label composition from the "what" and "where" annotations
//! - Off-screen / ambiguous frames kept as a sentinel label
//! - Required field checking (a bad row fails the whole trial)
//! - CSV ingestion grouped by participant-trial

mod composer;
mod error;
mod reader;
mod stream;

pub use composer::{normalize_label, LabelComposer, DEFAULT_OFF_SCREEN_TOKENS};
pub use error::{ReaderError, StreamError};
pub use reader::{ColumnMap, CsvFrameReader, TrialRows};
pub use stream::{AoiFrameStream, Frame, TrialMeta, MAX_FRAME_INDEX};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel AOI label for off-screen and ambiguous frames
pub const OFF_SCREEN: &str = "off_screen";

/// Identifies one participant-trial
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialKey {
    pub participant_id: String,
    pub trial_id: String,
}

impl TrialKey {
    pub fn new(participant_id: impl Into<String>, trial_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            trial_id: trial_id.into(),
        }
    }
}

impl fmt::Display for TrialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.participant_id, self.trial_id)
    }
}

/// Participant population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    Infant,
    Adult,
}

impl ParticipantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::Infant => "infant",
            ParticipantType::Adult => "adult",
        }
    }
}

impl FromStr for ParticipantType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infant" | "infants" | "baby" => Ok(ParticipantType::Infant),
            "adult" | "adults" => Ok(ParticipantType::Adult),
            _ => Err(()),
        }
    }
}

/// Event segment a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Approach,
    Interaction,
    Departure,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Approach => "approach",
            Segment::Interaction => "interaction",
            Segment::Departure => "departure",
        }
    }
}

impl FromStr for Segment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approach" => Ok(Segment::Approach),
            "interaction" => Ok(Segment::Interaction),
            "departure" => Ok(Segment::Departure),
            _ => Err(()),
        }
    }
}

/// One raw annotation row as read from the input table.
///
/// Every field is optional here; presence is enforced when the trial's rows
/// are turned into an [`AoiFrameStream`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrameRow {
    pub participant_id: Option<String>,
    pub trial_id: Option<String>,
    pub frame_index: Option<String>,
    /// What is being looked at (e.g. `man`, `toy`)
    pub what: Option<String>,
    /// Where on it (e.g. `face`, `present`)
    pub location: Option<String>,
    pub condition: Option<String>,
    pub segment: Option<String>,
    pub age_months: Option<String>,
    pub participant_type: Option<String>,
    /// `(field, lossy text)` for cells that were not valid UTF-8
    #[serde(skip)]
    pub undecodable: Vec<(&'static str, String)>,
}
