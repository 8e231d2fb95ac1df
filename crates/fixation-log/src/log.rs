//! In-memory fixation log

use crate::LogError;
use aoi_stream::{ParticipantType, TrialKey, TrialMeta};
use fixation::Fixation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A fixation with the attributes of the trial it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    pub fixation: Fixation,
    pub condition: String,
    pub participant_type: ParticipantType,
    pub age_months: Option<f64>,
}

/// Fixations of all processed trials, in insertion order
#[derive(Debug, Clone, Default)]
pub struct FixationLog {
    records: Vec<FixationRecord>,
    trials: HashSet<TrialKey>,
}

impl FixationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one trial's fixations. A trial can be added once.
    pub fn push_trial(&mut self, meta: &TrialMeta, fixations: Vec<Fixation>) -> Result<(), LogError> {
        if self.trials.contains(&meta.key) {
            return Err(LogError::DuplicateTrial(meta.key.to_string()));
        }

        let start = self.records.len();
        self.records.extend(fixations.into_iter().map(|fixation| FixationRecord {
            fixation,
            condition: meta.condition.clone(),
            participant_type: meta.participant_type,
            age_months: meta.age_months,
        }));

        debug!("Logged {} fixations for {}", self.records.len() - start, meta.key);
        self.trials.insert(meta.key.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn records(&self) -> &[FixationRecord] {
        &self.records
    }
}
