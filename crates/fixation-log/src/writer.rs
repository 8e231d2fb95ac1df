//! Output table export

use crate::{FixationLog, LogError};
use fixation::DwellSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use transitions::TrialTransitions;
use triplets::Triplet;

pub const FIXATIONS_FILE: &str = "fixations.csv";
pub const TRANSITIONS_FILE: &str = "transitions.csv";
pub const TRIPLETS_FILE: &str = "triplets.csv";
pub const DWELL_FILE: &str = "dwell.csv";
pub const FAILURES_FILE: &str = "trial_failures.csv";
pub const SUMMARY_FILE: &str = "summary.json";

const FIXATION_COLUMNS: &[&str] = &[
    "participant_id",
    "trial_id",
    "aoi_label",
    "start_frame",
    "end_frame",
    "duration_frames",
    "duration_ms",
    "sequence_index",
    "condition",
    "segment",
    "age_months",
    "participant_type",
];
const TRANSITION_COLUMNS: &[&str] = &[
    "participant_id",
    "trial_id",
    "from_aoi",
    "to_aoi",
    "position",
    "trial_eligible",
];
const TRIPLET_COLUMNS: &[&str] = &[
    "participant_id",
    "trial_id",
    "condition",
    "pattern_index",
    "pattern_matched",
    "first_index",
    "second_index",
    "third_index",
    "gap_1",
    "gap_2",
];
const DWELL_COLUMNS: &[&str] = &["participant_id", "aoi_label", "fixation_count", "total_ms", "mean_ms"];
const FAILURE_COLUMNS: &[&str] = &["participant_id", "trial_id", "kind", "reason"];

/// A trial excluded from the outputs, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub participant_id: String,
    pub trial_id: String,
    pub kind: String,
    pub reason: String,
}

#[derive(Serialize)]
struct FixationRow<'a> {
    participant_id: &'a str,
    trial_id: &'a str,
    aoi_label: &'a str,
    start_frame: u64,
    end_frame: u64,
    duration_frames: u32,
    duration_ms: f64,
    sequence_index: usize,
    condition: &'a str,
    segment: Option<&'static str>,
    age_months: Option<f64>,
    participant_type: &'static str,
}

#[derive(Serialize)]
struct TransitionRow<'a> {
    participant_id: &'a str,
    trial_id: &'a str,
    from_aoi: &'a str,
    to_aoi: &'a str,
    position: usize,
    trial_eligible: bool,
}

#[derive(Serialize)]
struct TripletRow<'a> {
    participant_id: &'a str,
    trial_id: &'a str,
    condition: &'a str,
    pattern_index: usize,
    pattern_matched: &'a str,
    first_index: usize,
    second_index: usize,
    third_index: usize,
    gap_1: i64,
    gap_2: i64,
}

/// Writes the output tables into one directory
#[derive(Debug, Clone)]
pub struct TableWriter {
    dir: PathBuf,
}

impl TableWriter {
    /// Creates the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, LogError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn write_fixations(&self, log: &FixationLog) -> Result<PathBuf, LogError> {
        let rows = log.records().iter().map(|r| FixationRow {
            participant_id: &r.fixation.participant_id,
            trial_id: &r.fixation.trial_id,
            aoi_label: &r.fixation.aoi_label,
            start_frame: r.fixation.start_frame,
            end_frame: r.fixation.end_frame,
            duration_frames: r.fixation.duration_frames,
            duration_ms: r.fixation.duration_ms,
            sequence_index: r.fixation.sequence_index,
            condition: &r.condition,
            segment: r.fixation.segment.map(|s| s.as_str()),
            age_months: r.age_months,
            participant_type: r.participant_type.as_str(),
        });
        self.write_csv(FIXATIONS_FILE, FIXATION_COLUMNS, rows)
    }

    /// Every transition, flagged with its trial's eligibility
    pub fn write_transitions<'a, I>(&self, trials: I, min_transitions: usize) -> Result<PathBuf, LogError>
    where
        I: IntoIterator<Item = &'a TrialTransitions>,
    {
        let rows = trials.into_iter().flat_map(|trial| {
            let eligible = trial.is_eligible(min_transitions);
            trial.transitions.iter().map(move |t| TransitionRow {
                participant_id: &t.participant_id,
                trial_id: &t.trial_id,
                from_aoi: &t.from_aoi,
                to_aoi: &t.to_aoi,
                position: t.position,
                trial_eligible: eligible,
            })
        });
        self.write_csv(TRANSITIONS_FILE, TRANSITION_COLUMNS, rows)
    }

    /// Items are `(condition, triplet)` pairs
    pub fn write_triplets<'a, I>(&self, triplets: I) -> Result<PathBuf, LogError>
    where
        I: IntoIterator<Item = (&'a str, &'a Triplet)>,
    {
        let rows = triplets.into_iter().map(|(condition, t)| TripletRow {
            participant_id: &t.participant_id,
            trial_id: &t.trial_id,
            condition,
            pattern_index: t.pattern_index,
            pattern_matched: &t.pattern_matched,
            first_index: t.fixation_indices[0],
            second_index: t.fixation_indices[1],
            third_index: t.fixation_indices[2],
            gap_1: t.frame_gaps[0],
            gap_2: t.frame_gaps[1],
        });
        self.write_csv(TRIPLETS_FILE, TRIPLET_COLUMNS, rows)
    }

    pub fn write_dwell(&self, summaries: &[DwellSummary]) -> Result<PathBuf, LogError> {
        self.write_csv(DWELL_FILE, DWELL_COLUMNS, summaries.iter())
    }

    pub fn write_failures(&self, failures: &[TrialFailure]) -> Result<PathBuf, LogError> {
        self.write_csv(FAILURES_FILE, FAILURE_COLUMNS, failures.iter())
    }

    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf, LogError> {
        let path = self.dir.join(SUMMARY_FILE);
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, summary)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Header is written up front so empty tables still name their columns
    fn write_csv<S, I>(&self, name: &str, columns: &[&str], rows: I) -> Result<PathBuf, LogError>
    where
        S: Serialize,
        I: IntoIterator<Item = S>,
    {
        let path = self.dir.join(name);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(columns)?;
        let mut count = 0usize;
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
        info!("Wrote {} rows to {}", count, path.display());
        Ok(path)
    }
}
