//! Fixation detection configuration

use crate::FixationError;
use serde::{Deserialize, Serialize};

/// Default sampling rate of the annotated video (frames per second)
pub const DEFAULT_FRAME_RATE_HZ: f64 = 30.0;

/// Minimum run length for a run to count as a fixation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// At least this many consecutive frames
    Frames { min_frames: u32 },
    /// At least this many milliseconds at the configured frame rate
    Millis { min_ms: f64 },
}

/// Fixation detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixationConfig {
    /// Run-length rule
    pub threshold: Threshold,

    /// Frame rate used to convert frame counts to milliseconds
    pub frame_rate_hz: f64,
}

impl Default for FixationConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::Frames { min_frames: 3 },
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

impl FixationConfig {
    /// Frame-count rule
    pub fn frames(min_frames: u32) -> Self {
        Self {
            threshold: Threshold::Frames { min_frames },
            ..Default::default()
        }
    }

    /// Millisecond rule, used for dwell-time detection
    pub fn millis(min_ms: f64) -> Self {
        Self {
            threshold: Threshold::Millis { min_ms },
            ..Default::default()
        }
    }

    /// Override the frame rate
    pub fn with_frame_rate(mut self, frame_rate_hz: f64) -> Self {
        self.frame_rate_hz = frame_rate_hz;
        self
    }

    /// Duration of one frame in milliseconds
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / self.frame_rate_hz
    }

    /// Milliseconds covered by a run of `frames` frames
    pub fn duration_ms(&self, frames: u32) -> f64 {
        frames as f64 * 1000.0 / self.frame_rate_hz
    }

    /// Whether a run of `frames` frames qualifies as a fixation
    pub fn accepts(&self, frames: u32) -> bool {
        match self.threshold {
            Threshold::Frames { min_frames } => frames >= min_frames,
            Threshold::Millis { min_ms } => self.duration_ms(frames) >= min_ms,
        }
    }

    pub fn validate(&self) -> Result<(), FixationError> {
        if !(self.frame_rate_hz.is_finite() && self.frame_rate_hz > 0.0) {
            return Err(FixationError::Config(format!(
                "frame rate must be positive, got {}",
                self.frame_rate_hz
            )));
        }
        match self.threshold {
            Threshold::Frames { min_frames } if min_frames == 0 => Err(FixationError::Config(
                "minimum fixation length must be at least 1 frame".into(),
            )),
            Threshold::Millis { min_ms } if !(min_ms.is_finite() && min_ms > 0.0) => {
                Err(FixationError::Config(format!(
                    "minimum fixation duration must be positive, got {}ms",
                    min_ms
                )))
            }
            _ => Ok(()),
        }
    }
}
