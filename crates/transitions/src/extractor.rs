//! Pairwise transition extraction

use crate::Transition;
use aoi_stream::TrialKey;
use fixation::Fixation;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// All transitions of one trial.
///
/// Nothing is discarded here; eligibility against the minimum count is a
/// consumer-side decision made through [`TrialTransitions::is_eligible`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTransitions {
    pub key: TrialKey,
    pub transitions: Vec<Transition>,
}

impl TrialTransitions {
    pub fn count(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the trial has enough transitions to enter aggregates
    pub fn is_eligible(&self, min_transitions: usize) -> bool {
        self.count() >= min_transitions
    }
}

/// Pairs each fixation with its successor
#[derive(Debug, Clone)]
pub struct TransitionExtractor {
    collapse_repeats: bool,
}

impl TransitionExtractor {
    pub fn new(collapse_repeats: bool) -> Self {
        Self { collapse_repeats }
    }

    pub fn extract(&self, key: &TrialKey, fixations: &[Fixation]) -> TrialTransitions {
        let sequence: Vec<&Fixation> = if self.collapse_repeats {
            let mut collapsed: Vec<&Fixation> = Vec::with_capacity(fixations.len());
            for fixation in fixations {
                if collapsed.last().map_or(true, |prev| prev.aoi_label != fixation.aoi_label) {
                    collapsed.push(fixation);
                }
            }
            collapsed
        } else {
            fixations.iter().collect()
        };

        let transitions: Vec<Transition> = sequence
            .windows(2)
            .enumerate()
            .map(|(position, pair)| Transition {
                participant_id: key.participant_id.clone(),
                trial_id: key.trial_id.clone(),
                from_aoi: pair[0].aoi_label.clone(),
                to_aoi: pair[1].aoi_label.clone(),
                position,
                from_fixation: pair[0].sequence_index,
                to_fixation: pair[1].sequence_index,
            })
            .collect();

        debug!(
            "{}: {} fixations -> {} transitions",
            key,
            fixations.len(),
            transitions.len()
        );

        TrialTransitions {
            key: key.clone(),
            transitions,
        }
    }
}

impl Default for TransitionExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}
