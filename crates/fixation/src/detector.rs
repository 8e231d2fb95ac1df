//! Run-length fixation detector

use crate::{Fixation, FixationConfig, FixationError};
use aoi_stream::{AoiFrameStream, Frame, Segment};
use tracing::debug;

/// A maximal run of same-label frames, before thresholding
#[derive(Debug, Clone, PartialEq)]
struct Run<'a> {
    label: &'a str,
    start_frame: u64,
    end_frame: u64,
    frames: u32,
    segment: Option<Segment>,
}

impl<'a> Run<'a> {
    fn open(frame: &'a Frame) -> Self {
        Self {
            label: &frame.aoi_label,
            start_frame: frame.frame_index,
            end_frame: frame.frame_index,
            frames: 1,
            segment: frame.segment,
        }
    }
}

/// Collapses frame streams into fixations
#[derive(Debug, Clone)]
pub struct FixationDetector {
    config: FixationConfig,
}

impl FixationDetector {
    pub fn new(config: FixationConfig) -> Result<Self, FixationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Skip validation; only for configurations known to be valid
    pub(crate) fn unchecked(config: FixationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixationConfig {
        &self.config
    }

    /// Detect the fixations of one trial.
    ///
    /// Sub-threshold runs are dropped and leave a gap; they never merge or
    /// extend the surrounding fixations.
    pub fn detect(&self, stream: &AoiFrameStream) -> Result<Vec<Fixation>, FixationError> {
        let key = stream.key();
        let frames = stream.frames();
        check_order(frames, &key.participant_id, &key.trial_id)?;

        let fixations: Vec<Fixation> = close_runs(frames)
            .into_iter()
            .filter(|run| self.config.accepts(run.frames))
            .enumerate()
            .map(|(sequence_index, run)| Fixation {
                participant_id: key.participant_id.clone(),
                trial_id: key.trial_id.clone(),
                aoi_label: run.label.to_string(),
                start_frame: run.start_frame,
                end_frame: run.end_frame,
                duration_frames: run.frames,
                duration_ms: self.config.duration_ms(run.frames),
                sequence_index,
                segment: run.segment,
            })
            .collect();

        debug!(
            "{}: {} frames -> {} fixations",
            key,
            frames.len(),
            fixations.len()
        );
        Ok(fixations)
    }
}

impl Default for FixationDetector {
    fn default() -> Self {
        Self::unchecked(FixationConfig::default())
    }
}

/// Frame indices must be strictly increasing; nothing is re-sorted
fn check_order(frames: &[Frame], participant_id: &str, trial_id: &str) -> Result<(), FixationError> {
    match frames
        .windows(2)
        .position(|pair| pair[1].frame_index <= pair[0].frame_index)
    {
        Some(i) => Err(FixationError::SequenceOrder {
            participant_id: participant_id.to_string(),
            trial_id: trial_id.to_string(),
            position: i + 1,
            previous: frames[i].frame_index,
            current: frames[i + 1].frame_index,
        }),
        None => Ok(()),
    }
}

/// Fold the frames into closed maximal runs
fn close_runs(frames: &[Frame]) -> Vec<Run<'_>> {
    frames.iter().fold(Vec::<Run>::new(), |mut runs, frame| {
        match runs.last_mut() {
            Some(run) if run.label == frame.aoi_label => {
                run.end_frame = frame.frame_index;
                run.frames += 1;
            }
            _ => runs.push(Run::open(frame)),
        }
        runs
    })
}
