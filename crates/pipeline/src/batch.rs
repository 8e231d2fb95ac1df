//! Per-trial batch processing

use crate::settings::Detectors;
use aoi_stream::{AoiFrameStream, TrialMeta, TrialRows};
use fixation::Fixation;
use fixation_log::TrialFailure;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use transitions::TrialTransitions;
use triplets::Triplet;

/// Everything derived from one successfully processed trial
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub meta: TrialMeta,
    /// Frame-count fixations for the master log
    pub fixations: Vec<Fixation>,
    pub transitions: TrialTransitions,
    pub triplets: Vec<Triplet>,
    /// Millisecond-threshold fixations for dwell analysis
    pub dwell_fixations: Vec<Fixation>,
}

/// Successful trials and recorded failures, both in input order
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub outcomes: Vec<TrialOutcome>,
    pub failures: Vec<TrialFailure>,
}

impl BatchResult {
    pub fn trials_seen(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }
}

/// Runs every trial independently; one bad trial never stops the others
#[derive(Debug, Clone)]
pub struct BatchRunner {
    detectors: Detectors,
    parallel: bool,
}

impl BatchRunner {
    pub fn new(detectors: Detectors, parallel: bool) -> Self {
        Self { detectors, parallel }
    }

    pub fn run(&self, trials: &[TrialRows]) -> BatchResult {
        info!(
            "Processing {} trials ({})",
            trials.len(),
            if self.parallel { "parallel" } else { "serial" }
        );

        // Indexed collect keeps input order in both modes
        let results: Vec<Result<TrialOutcome, TrialFailure>> = if self.parallel {
            trials.par_iter().map(|trial| self.process_trial(trial)).collect()
        } else {
            trials.iter().map(|trial| self.process_trial(trial)).collect()
        };

        let mut batch = BatchResult::default();
        for result in results {
            match result {
                Ok(outcome) => batch.outcomes.push(outcome),
                Err(failure) => batch.failures.push(failure),
            }
        }

        info!(
            "Processed {} trials, {} excluded",
            batch.outcomes.len(),
            batch.failures.len()
        );
        batch
    }

    /// frame stream → fixations → transitions, triplets and dwell fixations
    pub fn process_trial(&self, trial: &TrialRows) -> Result<TrialOutcome, TrialFailure> {
        let d = &self.detectors;
        let failure = |kind: &str, reason: String| {
            warn!("Excluding trial {}: {}", trial.key, reason);
            TrialFailure {
                participant_id: trial.key.participant_id.clone(),
                trial_id: trial.key.trial_id.clone(),
                kind: kind.to_string(),
                reason,
            }
        };

        let stream = AoiFrameStream::from_rows(&trial.rows, &d.composer)
            .map_err(|e| failure(e.kind(), e.to_string()))?;

        let fixations = d
            .fixation
            .detect(&stream)
            .map_err(|e| failure(e.kind(), e.to_string()))?;
        let dwell_fixations = d
            .dwell
            .detect(&stream)
            .map_err(|e| failure(e.kind(), e.to_string()))?;

        let transitions = d.transitions.extract(stream.key(), &fixations);
        let triplets = d.triplets.detect(&fixations);

        debug!(
            "Trial {}: {} fixations, {} transitions, {} triplets",
            trial.key,
            fixations.len(),
            transitions.count(),
            triplets.len()
        );

        Ok(TrialOutcome {
            meta: stream.meta().clone(),
            fixations,
            transitions,
            triplets,
            dwell_fixations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use aoi_stream::CsvFrameReader;

    fn runner(parallel: bool) -> BatchRunner {
        BatchRunner::new(Settings::default().detectors().unwrap(), parallel)
    }

    const INPUT: &str = "\
participant_id,trial_id,frame_index,what,where,condition,participant_type
P01,1,1,man,face,give,infant
P01,1,2,man,face,give,infant
P01,1,3,man,face,give,infant
P01,2,5,toy,present,give,infant
P01,2,4,toy,present,give,infant
P02,1,1,woman,face,hug,adult
P02,1,2,woman,face,hug,adult
P02,1,3,woman,face,hug,adult
";

    #[test]
    fn test_out_of_order_trial_is_isolated() {
        let trials = CsvFrameReader::default().read_from(INPUT.as_bytes()).unwrap();
        let batch = runner(false).run(&trials);

        assert_eq!(batch.trials_seen(), 3);
        assert_eq!(batch.outcomes.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].trial_id, "2");
        assert_eq!(batch.failures[0].kind, "sequence_order");
        assert_eq!(batch.outcomes[1].meta.key.participant_id, "P02");
        assert_eq!(batch.outcomes[0].fixations[0].aoi_label, "man_face");
    }

    #[test]
    fn test_parallel_matches_serial() {
        let trials = CsvFrameReader::default().read_from(INPUT.as_bytes()).unwrap();
        let serial = runner(false).run(&trials);
        let parallel = runner(true).run(&trials);

        assert_eq!(serial.failures, parallel.failures);
        let keys = |b: &BatchResult| -> Vec<String> {
            b.outcomes.iter().map(|o| o.meta.key.to_string()).collect()
        };
        assert_eq!(keys(&serial), keys(&parallel));
    }
}
