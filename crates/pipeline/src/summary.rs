//! Run summary

use crate::batch::BatchResult;
use crate::settings::{CohortConfig, Settings};
use chrono::{DateTime, Utc};
use fixation::DwellReport;
use gaze_stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use transitions::{GroupedMatrix, MatrixAggregator};
use triplets::{ConditionTriplets, PatternSet, TripletTally};

/// Triplet totals across the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripletCounts {
    pub total: usize,
    pub by_pattern: BTreeMap<String, usize>,
    pub by_condition: Vec<ConditionTriplets>,
}

/// One participant type × age band cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub participant_type: String,
    pub age_band: String,
    pub participants: usize,
    pub trials: usize,
    pub fixations: usize,
    pub triplets: usize,
    pub fixation_duration_ms: DescriptiveStats,
}

/// Everything written to `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub trials_processed: usize,
    pub trials_failed: usize,
    pub failures_by_kind: BTreeMap<String, usize>,
    pub fixations: usize,
    pub transitions: usize,
    /// Trials with at least `min_transitions` transitions
    pub eligible_trials: usize,
    pub min_transitions: usize,
    pub triplets: TripletCounts,
    pub matrices_by_participant: Vec<GroupedMatrix>,
    pub matrices_by_participant_condition: Vec<GroupedMatrix>,
    pub dwell: DwellReport,
    pub cohorts: Vec<CohortSummary>,
}

impl Summary {
    pub fn build(
        batch: &BatchResult,
        settings: &Settings,
        patterns: &PatternSet,
        dwell: DwellReport,
    ) -> Self {
        let min_transitions = settings.transitions.min_transitions;

        let mut failures_by_kind = BTreeMap::new();
        for failure in &batch.failures {
            *failures_by_kind.entry(failure.kind.clone()).or_insert(0) += 1;
        }

        let mut tally = TripletTally::new(patterns);
        for outcome in &batch.outcomes {
            tally.add_trial(&outcome.meta.condition, &outcome.triplets);
        }

        let aggregator = MatrixAggregator::new(&settings.transitions);
        let pairs = || {
            batch
                .outcomes
                .iter()
                .map(|o| (o.meta.condition.as_str(), &o.transitions))
        };

        Self {
            generated_at: Utc::now(),
            trials_processed: batch.outcomes.len(),
            trials_failed: batch.failures.len(),
            failures_by_kind,
            fixations: batch.outcomes.iter().map(|o| o.fixations.len()).sum(),
            transitions: batch.outcomes.iter().map(|o| o.transitions.count()).sum(),
            eligible_trials: batch
                .outcomes
                .iter()
                .filter(|o| o.transitions.is_eligible(min_transitions))
                .count(),
            min_transitions,
            triplets: TripletCounts {
                total: tally.total(),
                by_pattern: tally.by_pattern().clone(),
                by_condition: tally.by_condition(),
            },
            matrices_by_participant: aggregator.by_participant(pairs()),
            matrices_by_participant_condition: aggregator.by_participant_condition(pairs()),
            dwell,
            cohorts: cohorts(batch, &settings.cohort),
        }
    }
}

#[derive(Default)]
struct CohortAccumulator<'a> {
    participants: BTreeSet<&'a str>,
    trials: usize,
    triplets: usize,
    durations: Vec<f64>,
}

fn cohorts(batch: &BatchResult, config: &CohortConfig) -> Vec<CohortSummary> {
    let mut cells: BTreeMap<(&str, String), CohortAccumulator> = BTreeMap::new();
    for outcome in &batch.outcomes {
        let meta = &outcome.meta;
        let cell = cells
            .entry((meta.participant_type.as_str(), config.band(meta.age_months)))
            .or_default();
        cell.participants.insert(meta.key.participant_id.as_str());
        cell.trials += 1;
        cell.triplets += outcome.triplets.len();
        cell.durations
            .extend(outcome.fixations.iter().map(|f| f.duration_ms));
    }

    cells
        .into_iter()
        .map(|((participant_type, age_band), cell)| CohortSummary {
            participant_type: participant_type.to_string(),
            age_band,
            participants: cell.participants.len(),
            trials: cell.trials,
            fixations: cell.durations.len(),
            triplets: cell.triplets,
            fixation_duration_ms: DescriptiveStats::compute(&cell.durations),
        })
        .collect()
}
