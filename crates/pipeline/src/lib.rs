//! Gaze Sequence Pipeline
//!
//! Reads an AOI annotation table, extracts fixations per participant-trial
//! and writes the master fixation log, transitions, triplets, dwell
//! aggregates and a run summary.

pub mod batch;
pub mod cli;
pub mod settings;
pub mod summary;

pub use batch::{BatchResult, BatchRunner, TrialOutcome};
pub use settings::{CohortConfig, Detectors, Settings, SettingsError};
pub use summary::{CohortSummary, Summary, TripletCounts};

use anyhow::Context;
use aoi_stream::CsvFrameReader;
use fixation_log::{FixationLog, TableWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: Summary,
    pub written: Vec<PathBuf>,
}

/// Process `input` with `settings` and write every table into `output`.
///
/// Only input, settings and output failures abort the run; bad trials are
/// recorded in `trial_failures.csv`.
pub fn run(settings: &Settings, input: &Path, output: &Path) -> anyhow::Result<RunReport> {
    let detectors = settings.detectors()?;
    let patterns = detectors.triplets.patterns().clone();
    let dwell = detectors.dwell.clone();

    let trials = CsvFrameReader::new(settings.columns.clone())
        .read_path(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let batch = BatchRunner::new(detectors, settings.parallel).run(&trials);

    let mut log = FixationLog::new();
    for outcome in &batch.outcomes {
        log.push_trial(&outcome.meta, outcome.fixations.clone())?;
    }
    if log.is_empty() {
        warn!("No fixations in {} processed trials", log.trial_count());
    } else {
        info!("Fixation log: {} fixations from {} trials", log.len(), log.trial_count());
    }

    let dwell_report = dwell.summarize(
        batch
            .outcomes
            .iter()
            .flat_map(|o| o.dwell_fixations.iter()),
    );
    if dwell_report.excluded_total() > 0 {
        info!("Dwell trimming excluded {} fixations", dwell_report.excluded_total());
    }

    let writer = TableWriter::new(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let mut written = vec![
        writer.write_fixations(&log)?,
        writer.write_transitions(
            batch.outcomes.iter().map(|o| &o.transitions),
            settings.transitions.min_transitions,
        )?,
        writer.write_triplets(batch.outcomes.iter().flat_map(|o| {
            o.triplets
                .iter()
                .map(move |t| (o.meta.condition.as_str(), t))
        }))?,
        writer.write_dwell(&dwell_report.summaries)?,
        writer.write_failures(&batch.failures)?,
    ];

    let summary = Summary::build(&batch, settings, &patterns, dwell_report);
    written.push(writer.write_summary(&summary)?);

    info!(
        "Run complete: {} trials, {} failed, {} fixations, {} triplets",
        summary.trials_processed, summary.trials_failed, summary.fixations, summary.triplets.total
    );

    Ok(RunReport { summary, written })
}
