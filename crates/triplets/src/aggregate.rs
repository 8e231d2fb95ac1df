//! Triplet counts by pattern and condition

use crate::{PatternSet, Triplet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Triplet totals for one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTriplets {
    pub condition: String,
    pub trials: usize,
    pub triplets: usize,
    pub per_trial: f64,
    /// Directional breakdown, keyed by `a>b>c`
    pub by_pattern: BTreeMap<String, usize>,
}

/// Running tally of triplets over trials
#[derive(Debug, Clone, Default)]
pub struct TripletTally {
    patterns: Vec<String>,
    by_pattern: BTreeMap<String, usize>,
    trials: BTreeMap<String, usize>,
    by_condition: BTreeMap<String, BTreeMap<String, usize>>,
}

impl TripletTally {
    /// Every configured pattern gets an entry, so unmatched ones report zero
    pub fn new(patterns: &PatternSet) -> Self {
        let patterns: Vec<String> = patterns.patterns().iter().map(|p| p.name()).collect();
        Self {
            by_pattern: patterns.iter().map(|p| (p.clone(), 0)).collect(),
            patterns,
            ..Default::default()
        }
    }

    /// Record one trial and the triplets found in it
    pub fn add_trial(&mut self, condition: &str, triplets: &[Triplet]) {
        *self.trials.entry(condition.to_string()).or_default() += 1;

        let per_condition = self.by_condition.entry(condition.to_string()).or_insert_with(|| {
            self.patterns.iter().map(|p| (p.clone(), 0)).collect()
        });

        for triplet in triplets {
            *self.by_pattern.entry(triplet.pattern_matched.clone()).or_default() += 1;
            *per_condition.entry(triplet.pattern_matched.clone()).or_default() += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.by_pattern.values().sum()
    }

    pub fn by_pattern(&self) -> &BTreeMap<String, usize> {
        &self.by_pattern
    }

    pub fn by_condition(&self) -> Vec<ConditionTriplets> {
        self.by_condition
            .iter()
            .map(|(condition, by_pattern)| {
                let trials = self.trials.get(condition).copied().unwrap_or(0);
                let triplets: usize = by_pattern.values().sum();
                ConditionTriplets {
                    condition: condition.clone(),
                    trials,
                    triplets,
                    per_trial: if trials > 0 {
                        triplets as f64 / trials as f64
                    } else {
                        0.0
                    },
                    by_pattern: by_pattern.clone(),
                }
            })
            .collect()
    }
}
