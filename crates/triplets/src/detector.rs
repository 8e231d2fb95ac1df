//! Sliding-window triplet detection

use crate::{GapMode, PatternSet, Triplet, TripletConfig, TripletError};
use fixation::Fixation;
use std::collections::BTreeMap;
use tracing::debug;

/// Scans fixation lists three at a time for configured patterns
#[derive(Debug, Clone)]
pub struct TripletDetector {
    patterns: PatternSet,
    mode: GapMode,
    max_gap_frames: u32,
    /// `raw_label -> pattern_label`, empty when no substitution applies
    substitutions: BTreeMap<String, String>,
}

impl TripletDetector {
    /// Validates every pattern and the label mapping up front
    pub fn new(config: &TripletConfig) -> Result<Self, TripletError> {
        let patterns = PatternSet::new(&config.valid_patterns)?;
        let substitutions = config.raw_to_pattern_labels()?;

        debug!(
            "Triplet detector: {} patterns, {:?}, max gap {}, {} substitutions",
            patterns.len(),
            config.require_consecutive,
            config.max_gap_frames,
            substitutions.len()
        );

        Ok(Self {
            patterns,
            mode: config.require_consecutive,
            max_gap_frames: config.max_gap_frames,
            substitutions,
        })
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Every window of three consecutive fixations that passes the
    /// no-repeat rule, matches a pattern and satisfies the gap rule.
    ///
    /// Windows overlap, so one fixation can take part in several triplets.
    pub fn detect(&self, fixations: &[Fixation]) -> Vec<Triplet> {
        let triplets: Vec<Triplet> = fixations
            .windows(3)
            .filter_map(|window| self.match_window(window))
            .collect();

        if let Some(first) = fixations.first() {
            debug!(
                "Trial {}/{}: {} triplets in {} fixations",
                first.participant_id,
                first.trial_id,
                triplets.len(),
                fixations.len()
            );
        }

        triplets
    }

    fn match_window(&self, window: &[Fixation]) -> Option<Triplet> {
        let [a, b, c] = window else {
            return None;
        };

        let raw = [a.aoi_label.as_str(), b.aoi_label.as_str(), c.aoi_label.as_str()];
        if !all_distinct(raw) {
            return None;
        }

        let mapped = raw.map(|label| self.substitute(label));
        if !all_distinct(mapped) {
            return None;
        }

        let pattern = self.patterns.find(mapped)?;

        let frame_gaps = [a.gap_to(b), b.gap_to(c)];
        if !frame_gaps
            .iter()
            .all(|&gap| self.mode.accepts(gap, self.max_gap_frames))
        {
            return None;
        }

        Some(Triplet {
            participant_id: a.participant_id.clone(),
            trial_id: a.trial_id.clone(),
            pattern_index: pattern.index,
            pattern_matched: pattern.name(),
            aoi_labels: raw.map(str::to_string),
            fixation_indices: [a.sequence_index, b.sequence_index, c.sequence_index],
            frame_gaps,
            start_frame: a.start_frame,
            end_frame: c.end_frame,
        })
    }

    fn substitute<'a>(&'a self, label: &'a str) -> &'a str {
        self.substitutions
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }
}

fn all_distinct(labels: [&str; 3]) -> bool {
    labels[0] != labels[1] && labels[1] != labels[2] && labels[0] != labels[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `(label, start, end)` triples to fixations of one trial
    fn fixations(runs: &[(&str, u64, u64)]) -> Vec<Fixation> {
        runs.iter()
            .enumerate()
            .map(|(i, &(label, start, end))| Fixation {
                participant_id: "P01".into(),
                trial_id: "1".into(),
                aoi_label: label.into(),
                start_frame: start,
                end_frame: end,
                duration_frames: (end - start + 1) as u32,
                duration_ms: (end - start + 1) as f64 * 1000.0 / 30.0,
                sequence_index: i,
                segment: None,
            })
            .collect()
    }

    fn detector(mode: GapMode, max_gap_frames: u32) -> TripletDetector {
        TripletDetector::new(&TripletConfig {
            require_consecutive: mode,
            max_gap_frames,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_gap_beyond_tolerance_rejected() {
        // gaps (5, 0)
        let list = fixations(&[
            ("man_face", 0, 9),
            ("toy_present", 15, 20),
            ("woman_face", 21, 30),
        ]);
        assert!(detector(GapMode::GapTolerant, 2).detect(&list).is_empty());
    }

    #[test]
    fn test_gaps_within_tolerance_accepted() {
        // gaps (2, 1)
        let list = fixations(&[
            ("man_face", 0, 9),
            ("toy_present", 12, 20),
            ("woman_face", 22, 30),
        ]);
        let triplets = detector(GapMode::GapTolerant, 2).detect(&list);
        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].frame_gaps, [2, 1]);
        assert_eq!(triplets[0].pattern_index, 0);
        assert_eq!(triplets[0].pattern_matched, "man_face>toy_present>woman_face");
        assert_eq!(triplets[0].fixation_indices, [0, 1, 2]);
        assert_eq!((triplets[0].start_frame, triplets[0].end_frame), (0, 30));
    }

    #[test]
    fn test_gap_boundary() {
        // end 10, next start 13: gap 2
        let list = fixations(&[
            ("man_face", 0, 10),
            ("toy_present", 13, 20),
            ("woman_face", 21, 30),
        ]);
        assert_eq!(detector(GapMode::GapTolerant, 2).detect(&list).len(), 1);
        assert!(detector(GapMode::GapTolerant, 1).detect(&list).is_empty());
    }

    #[test]
    fn test_strict_mode() {
        let adjacent = fixations(&[
            ("woman_face", 0, 9),
            ("toy_present", 10, 20),
            ("man_face", 21, 30),
        ]);
        let triplets = detector(GapMode::Strict, 10).detect(&adjacent);
        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].pattern_index, 1);

        let one_gap = fixations(&[
            ("woman_face", 0, 9),
            ("toy_present", 11, 20),
            ("man_face", 21, 30),
        ]);
        assert!(detector(GapMode::Strict, 10).detect(&one_gap).is_empty());
    }

    #[test]
    fn test_toy_absent_substitution() {
        let list = fixations(&[
            ("man_face", 0, 9),
            ("toy_location", 10, 20),
            ("woman_face", 21, 30),
        ]);

        let present = TripletDetector::new(&TripletConfig::default()).unwrap();
        assert!(present.detect(&list).is_empty());

        let absent = TripletDetector::new(&TripletConfig::default().toy_absent()).unwrap();
        let triplets = absent.detect(&list);
        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].pattern_matched, "man_face>toy_present>woman_face");
        assert_eq!(triplets[0].aoi_labels[1], "toy_location");
    }

    #[test]
    fn test_mapping_cannot_create_repeat_match() {
        // raw labels distinct, but mapping collapses two of them
        let list = fixations(&[
            ("toy_present", 0, 9),
            ("toy_location", 10, 20),
            ("woman_face", 21, 30),
        ]);
        let absent = TripletDetector::new(&TripletConfig::default().toy_absent()).unwrap();
        assert!(absent.detect(&list).is_empty());
    }

    #[test]
    fn test_repeated_label_never_matches() {
        let list = fixations(&[
            ("man_face", 0, 9),
            ("toy_present", 10, 20),
            ("man_face", 21, 30),
        ]);
        assert!(TripletDetector::new(&TripletConfig::default())
            .unwrap()
            .detect(&list)
            .is_empty());
    }

    #[test]
    fn test_fewer_than_three_fixations() {
        let detector = TripletDetector::new(&TripletConfig::default()).unwrap();
        assert!(detector.detect(&[]).is_empty());
        assert!(detector
            .detect(&fixations(&[("man_face", 0, 9), ("toy_present", 10, 20)]))
            .is_empty());
    }

    #[test]
    fn test_overlapping_windows() {
        let list = fixations(&[
            ("man_face", 0, 9),
            ("toy_present", 10, 19),
            ("woman_face", 20, 29),
            ("toy_present", 30, 39),
            ("man_face", 40, 49),
        ]);
        let triplets = TripletDetector::new(&TripletConfig::default())
            .unwrap()
            .detect(&list);
        let indices: Vec<_> = triplets.iter().map(|t| t.fixation_indices).collect();
        assert_eq!(indices, vec![[0, 1, 2], [2, 3, 4]]);
    }

    #[test]
    fn test_invalid_pattern_blocks_construction() {
        let config = TripletConfig {
            valid_patterns: vec![vec!["man_face".into(), "toy_present".into()]],
            ..Default::default()
        };
        assert!(matches!(
            TripletDetector::new(&config),
            Err(TripletError::InvalidPattern { index: 0, .. })
        ));
    }
}
