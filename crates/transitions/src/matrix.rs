//! Transition-probability matrix

use crate::Transition;
use serde::{Deserialize, Serialize};

/// One cell of a transition matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub from_aoi: String,
    pub to_aoi: String,
    pub count: u32,
    pub probability: f64,
}

/// Empirical P(to | from) over a fixed AOI vocabulary.
///
/// Transitions with either side outside the vocabulary are ignored. A
/// `from` row with no outgoing transitions stays in the matrix as an
/// all-zero row, so every matrix built from the same vocabulary has the
/// same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    vocabulary: Vec<String>,
    counts: Vec<Vec<u32>>,
    probabilities: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    pub fn from_transitions<'a, I>(vocabulary: &[String], transitions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let n = vocabulary.len();
        let mut counts = vec![vec![0u32; n]; n];
        let position = |label: &str| vocabulary.iter().position(|v| v == label);

        for transition in transitions {
            if let (Some(from), Some(to)) = (
                position(transition.from_aoi.as_str()),
                position(transition.to_aoi.as_str()),
            ) {
                counts[from][to] += 1;
            }
        }

        let probabilities: Vec<Vec<f64>> = counts
            .iter()
            .map(|row| {
                let total: u32 = row.iter().sum();
                row.iter()
                    .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
                    .collect::<Vec<f64>>()
            })
            .collect();

        Self {
            vocabulary: vocabulary.to_vec(),
            counts,
            probabilities,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    fn index(&self, label: &str) -> Option<usize> {
        self.vocabulary.iter().position(|v| v == label)
    }

    pub fn count(&self, from: &str, to: &str) -> u32 {
        match (self.index(from), self.index(to)) {
            (Some(f), Some(t)) => self.counts[f][t],
            _ => 0,
        }
    }

    /// Outgoing transitions counted for `from`
    pub fn row_total(&self, from: &str) -> u32 {
        self.index(from)
            .map(|f| self.counts[f].iter().sum())
            .unwrap_or(0)
    }

    /// P(to | from); 0.0 for an empty row or a label outside the vocabulary
    pub fn probability(&self, from: &str, to: &str) -> f64 {
        match (self.index(from), self.index(to)) {
            (Some(f), Some(t)) => self.probabilities[f][t],
            _ => 0.0,
        }
    }

    /// Total transitions counted in the matrix
    pub fn total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Every cell in row-major vocabulary order
    pub fn cells(&self) -> Vec<MatrixCell> {
        let mut cells = Vec::with_capacity(self.vocabulary.len() * self.vocabulary.len());
        for (f, from) in self.vocabulary.iter().enumerate() {
            for (t, to) in self.vocabulary.iter().enumerate() {
                cells.push(MatrixCell {
                    from_aoi: from.clone(),
                    to_aoi: to.clone(),
                    count: self.counts[f][t],
                    probability: self.probabilities[f][t],
                });
            }
        }
        cells
    }
}
