//! Per-participant transition matrices

use crate::{TransitionConfig, TransitionMatrix, TrialTransitions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A transition matrix for one participant, optionally within one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMatrix {
    pub participant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Trials that met the minimum transition count
    pub eligible_trials: usize,
    /// Trials left out for having too few transitions
    pub excluded_trials: usize,
    pub matrix: TransitionMatrix,
}

/// Builds matrices from eligible trials only
#[derive(Debug, Clone)]
pub struct MatrixAggregator {
    vocabulary: Vec<String>,
    min_transitions: usize,
}

impl MatrixAggregator {
    pub fn new(config: &TransitionConfig) -> Self {
        Self {
            vocabulary: config.vocabulary.clone(),
            min_transitions: config.min_transitions,
        }
    }

    /// One matrix per participant
    pub fn by_participant<'a, I>(&self, trials: I) -> Vec<GroupedMatrix>
    where
        I: IntoIterator<Item = (&'a str, &'a TrialTransitions)>,
    {
        self.group(trials, false)
    }

    /// One matrix per participant × condition
    pub fn by_participant_condition<'a, I>(&self, trials: I) -> Vec<GroupedMatrix>
    where
        I: IntoIterator<Item = (&'a str, &'a TrialTransitions)>,
    {
        self.group(trials, true)
    }

    /// Items are `(condition, trial transitions)` pairs
    fn group<'a, I>(&self, trials: I, split_condition: bool) -> Vec<GroupedMatrix>
    where
        I: IntoIterator<Item = (&'a str, &'a TrialTransitions)>,
    {
        let mut groups: BTreeMap<(&str, Option<&str>), Vec<&TrialTransitions>> = BTreeMap::new();
        for (condition, trial) in trials {
            let condition = split_condition.then_some(condition);
            groups
                .entry((trial.key.participant_id.as_str(), condition))
                .or_default()
                .push(trial);
        }

        groups
            .into_iter()
            .map(|((participant_id, condition), trials)| {
                let (eligible, excluded): (Vec<&TrialTransitions>, Vec<&TrialTransitions>) = trials
                    .into_iter()
                    .partition(|t| t.is_eligible(self.min_transitions));

                if !excluded.is_empty() {
                    debug!(
                        "Participant {}: {} trials below {} transitions",
                        participant_id,
                        excluded.len(),
                        self.min_transitions
                    );
                }

                let matrix = TransitionMatrix::from_transitions(
                    &self.vocabulary,
                    eligible.iter().flat_map(|t| t.transitions.iter()),
                );

                GroupedMatrix {
                    participant_id: participant_id.to_string(),
                    condition: condition.map(str::to_string),
                    eligible_trials: eligible.len(),
                    excluded_trials: excluded.len(),
                    matrix,
                }
            })
            .collect()
    }
}

impl Default for MatrixAggregator {
    fn default() -> Self {
        Self::new(&TransitionConfig::default())
    }
}
