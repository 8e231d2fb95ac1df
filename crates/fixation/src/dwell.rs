//! Dwell-time analysis
//!
//! Dwell fixations are detected with a millisecond threshold instead of the
//! frame-count rule, then trimmed per participant: a fixation whose duration
//! lies more than `outlier_sd` standard deviations from that participant's
//! own mean is left out of the dwell aggregates. Trimming never touches the
//! master fixation log.

use crate::config::DEFAULT_FRAME_RATE_HZ;
use crate::{Fixation, FixationConfig, FixationDetector, FixationError};
use aoi_stream::AoiFrameStream;
use gaze_stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Dwell-time configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Minimum fixation duration (milliseconds)
    pub min_duration_ms: f64,

    /// Outlier cut-off in participant standard deviations
    pub outlier_sd: f64,

    /// Frame rate used to convert frame counts to milliseconds
    pub frame_rate_hz: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 100.0,
            outlier_sd: 3.0,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

/// Dwell totals for one participant on one AOI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellSummary {
    pub participant_id: String,
    pub aoi_label: String,
    pub fixation_count: usize,
    pub total_ms: f64,
    pub mean_ms: f64,
}

/// Per-participant trimming outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDwell {
    pub participant_id: String,
    /// Duration statistics before trimming
    pub duration: DescriptiveStats,
    pub kept: usize,
    pub excluded: usize,
}

/// Result of dwell summarization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DwellReport {
    pub participants: Vec<ParticipantDwell>,
    pub summaries: Vec<DwellSummary>,
}

impl DwellReport {
    pub fn excluded_total(&self) -> usize {
        self.participants.iter().map(|p| p.excluded).sum()
    }
}

/// Millisecond-threshold detection plus outlier-trimmed dwell aggregates
#[derive(Debug, Clone)]
pub struct DwellAnalyzer {
    config: DwellConfig,
    detector: FixationDetector,
}

impl DwellAnalyzer {
    pub fn new(config: DwellConfig) -> Result<Self, FixationError> {
        if !(config.outlier_sd.is_finite() && config.outlier_sd > 0.0) {
            return Err(FixationError::Config(format!(
                "outlier cut-off must be positive, got {}",
                config.outlier_sd
            )));
        }
        let detector = FixationDetector::new(
            FixationConfig::millis(config.min_duration_ms).with_frame_rate(config.frame_rate_hz),
        )?;
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &DwellConfig {
        &self.config
    }

    /// Detect dwell fixations for one trial
    pub fn detect(&self, stream: &AoiFrameStream) -> Result<Vec<Fixation>, FixationError> {
        self.detector.detect(stream)
    }

    /// Trim outliers per participant and aggregate per participant × AOI.
    ///
    /// Output is ordered by participant id, then AOI label.
    pub fn summarize<'a, I>(&self, fixations: I) -> DwellReport
    where
        I: IntoIterator<Item = &'a Fixation>,
    {
        let mut by_participant: BTreeMap<&str, Vec<&Fixation>> = BTreeMap::new();
        for fixation in fixations {
            by_participant
                .entry(fixation.participant_id.as_str())
                .or_default()
                .push(fixation);
        }

        let mut report = DwellReport::default();
        for (participant_id, fixations) in by_participant {
            let durations: Vec<f64> = fixations.iter().map(|f| f.duration_ms).collect();
            let duration = DescriptiveStats::compute(&durations);
            let bounds = duration.outlier_bounds(self.config.outlier_sd);

            let kept: Vec<&Fixation> = fixations
                .iter()
                .copied()
                .filter(|f| bounds.map_or(true, |b| !b.is_outlier(f.duration_ms)))
                .collect();
            let excluded = fixations.len() - kept.len();
            if excluded > 0 {
                debug!(
                    "Participant {}: excluded {} dwell outliers (mean {:.1}ms, sd {:.1}ms)",
                    participant_id, excluded, duration.mean, duration.std_dev
                );
            }

            let mut by_aoi: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for fixation in &kept {
                by_aoi
                    .entry(fixation.aoi_label.as_str())
                    .or_default()
                    .push(fixation.duration_ms);
            }
            for (aoi_label, durations) in by_aoi {
                let stats = DescriptiveStats::compute(&durations);
                report.summaries.push(DwellSummary {
                    participant_id: participant_id.to_string(),
                    aoi_label: aoi_label.to_string(),
                    fixation_count: stats.count,
                    total_ms: stats.sum,
                    mean_ms: stats.mean,
                });
            }

            report.participants.push(ParticipantDwell {
                participant_id: participant_id.to_string(),
                duration,
                kept: kept.len(),
                excluded,
            });
        }

        report
    }
}

impl Default for DwellAnalyzer {
    fn default() -> Self {
        let config = DwellConfig::default();
        let detector = FixationDetector::unchecked(
            FixationConfig::millis(config.min_duration_ms).with_frame_rate(config.frame_rate_hz),
        );
        Self { config, detector }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoi_stream::{Frame, ParticipantType, TrialKey, TrialMeta};

    fn fixation(participant: &str, aoi: &str, duration_ms: f64) -> Fixation {
        Fixation {
            participant_id: participant.into(),
            trial_id: "1".into(),
            aoi_label: aoi.into(),
            start_frame: 0,
            end_frame: 0,
            duration_frames: 0,
            duration_ms,
            sequence_index: 0,
            segment: None,
        }
    }

    #[test]
    fn test_detects_with_millisecond_threshold() {
        let analyzer = DwellAnalyzer::new(DwellConfig {
            min_duration_ms: 150.0,
            ..Default::default()
        })
        .unwrap();
        let labels = ["A", "A", "A", "A", "B", "B", "B", "B", "B"];
        let frames = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Frame::new(i as u64, *l))
            .collect();
        let stream = AoiFrameStream::new(
            TrialMeta {
                key: TrialKey::new("P01", "1"),
                condition: "give".into(),
                participant_type: ParticipantType::Adult,
                age_months: None,
            },
            frames,
        );

        // 4 frames = 133ms, 5 frames = 167ms at 30 Hz
        let fixations = analyzer.detect(&stream).unwrap();
        assert_eq!(fixations.len(), 1);
        assert_eq!(fixations[0].aoi_label, "B");
    }

    #[test]
    fn test_outlier_excluded_from_aggregates() {
        let analyzer = DwellAnalyzer::new(DwellConfig {
            outlier_sd: 2.0,
            ..Default::default()
        })
        .unwrap();

        let mut fixations: Vec<Fixation> = (0..10)
            .map(|i| fixation("P01", "man_face", 100.0 + i as f64))
            .collect();
        fixations.push(fixation("P01", "man_face", 5000.0));

        let report = analyzer.summarize(&fixations);
        assert_eq!(report.participants[0].excluded, 1);
        assert_eq!(report.participants[0].kept, 10);
        assert_eq!(report.summaries[0].fixation_count, 10);
        assert!((report.summaries[0].mean_ms - 104.5).abs() < 1e-9);
        // The input itself is untouched
        assert_eq!(fixations.len(), 11);
    }

    #[test]
    fn test_trim_is_per_participant() {
        let analyzer = DwellAnalyzer::default();
        let fixations = vec![
            fixation("P01", "man_face", 100.0),
            fixation("P01", "toy_present", 100.0),
            fixation("P02", "man_face", 900.0),
            fixation("P02", "man_face", 1000.0),
        ];

        let report = analyzer.summarize(&fixations);
        assert_eq!(report.excluded_total(), 0);

        let keys: Vec<_> = report
            .summaries
            .iter()
            .map(|s| (s.participant_id.as_str(), s.aoi_label.as_str(), s.fixation_count))
            .collect();
        assert_eq!(
            keys,
            vec![("P01", "man_face", 1), ("P01", "toy_present", 1), ("P02", "man_face", 2)]
        );
        assert!((report.summaries[2].total_ms - 1900.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_outlier_cutoff() {
        let config = DwellConfig {
            outlier_sd: 0.0,
            ..Default::default()
        };
        assert!(DwellAnalyzer::new(config).is_err());
    }
}
