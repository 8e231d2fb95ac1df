//! Descriptive Statistics
//!
//! Summary statistics over fixation durations, used for dwell-time outlier
//! trimming and for the per-participant aggregates in the run summary.

mod descriptive;

pub use descriptive::{DescriptiveStats, OutlierBounds};
