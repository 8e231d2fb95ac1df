//! Descriptive Statistics Computation

use serde::{Deserialize, Serialize};

/// Descriptive statistics for a sample of values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of values
    pub count: usize,
    /// Sum of values
    pub sum: f64,
    /// Mean value
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Median value
    pub median: f64,
}

impl DescriptiveStats {
    /// Compute descriptive statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let sum: f64 = values.iter().sum();
        let mean = sum / n;

        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        // Sample variance; a single value has no spread
        let std_dev = if values.len() >= 2 {
            let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (m2 / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            count: values.len(),
            sum,
            mean,
            std_dev,
            min,
            max,
            median,
        }
    }

    /// Bounds at `sd_threshold` standard deviations around the mean.
    ///
    /// Returns `None` when the sample cannot support a trim (fewer than two
    /// values, or zero spread), in which case nothing is an outlier.
    pub fn outlier_bounds(&self, sd_threshold: f64) -> Option<OutlierBounds> {
        if self.count < 2 || self.std_dev <= 0.0 {
            return None;
        }
        let span = sd_threshold * self.std_dev;
        Some(OutlierBounds {
            lower: self.mean - span,
            upper: self.mean + span,
        })
    }
}

/// Inclusive acceptance interval for outlier trimming
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Whether a value lies outside the interval
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}
