//! Triplet configuration and pattern validation

use crate::TripletError;
use aoi_stream::normalize_label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How inter-fixation gaps are judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapMode {
    /// Every gap must be exactly zero frames
    Strict,
    /// Every gap must be at most `max_gap_frames`
    GapTolerant,
}

impl GapMode {
    pub fn accepts(&self, gap: i64, max_gap_frames: u32) -> bool {
        match self {
            GapMode::Strict => gap == 0,
            GapMode::GapTolerant => gap >= 0 && gap <= max_gap_frames as i64,
        }
    }
}

/// Triplet detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripletConfig {
    /// Ordered AOI label triples to look for
    pub valid_patterns: Vec<Vec<String>>,

    /// Largest gap (frames) allowed in gap-tolerant mode
    pub max_gap_frames: u32,

    /// Gap rule
    pub require_consecutive: GapMode,

    /// Toy-absent variants only: `pattern_label -> raw_label`, so a raw
    /// `toy_location` fixation is read as `toy_present` before matching
    pub toy_absent_mapping: Option<BTreeMap<String, String>>,
}

impl Default for TripletConfig {
    fn default() -> Self {
        Self {
            valid_patterns: vec![
                vec!["man_face".into(), "toy_present".into(), "woman_face".into()],
                vec!["woman_face".into(), "toy_present".into(), "man_face".into()],
            ],
            max_gap_frames: 3,
            require_consecutive: GapMode::GapTolerant,
            toy_absent_mapping: None,
        }
    }
}

impl TripletConfig {
    /// Toy-absent variant of this configuration
    pub fn toy_absent(mut self) -> Self {
        let mut mapping = BTreeMap::new();
        mapping.insert("toy_present".to_string(), "toy_location".to_string());
        self.toy_absent_mapping = Some(mapping);
        self
    }

    /// Validate patterns and mapping without building a detector
    pub fn validate(&self) -> Result<(), TripletError> {
        PatternSet::new(&self.valid_patterns)?;
        self.raw_to_pattern_labels()?;
        Ok(())
    }

    /// Invert the toy-absent mapping into `raw_label -> pattern_label`
    pub(crate) fn raw_to_pattern_labels(&self) -> Result<BTreeMap<String, String>, TripletError> {
        let mut inverted = BTreeMap::new();
        if let Some(mapping) = &self.toy_absent_mapping {
            for (pattern_label, raw_label) in mapping {
                if pattern_label.trim().is_empty() || raw_label.trim().is_empty() {
                    return Err(TripletError::InvalidMapping("blank label".into()));
                }
                for label in [pattern_label, raw_label] {
                    if let Some(expected) = unnormalized(label) {
                        return Err(TripletError::InvalidMapping(format!(
                            "`{}` can never match a composed label, write `{}`",
                            label, expected
                        )));
                    }
                }
                if let Some(previous) = inverted.insert(raw_label.clone(), pattern_label.clone()) {
                    return Err(TripletError::InvalidMapping(format!(
                        "`{}` is mapped from both `{}` and `{}`",
                        raw_label, previous, pattern_label
                    )));
                }
            }
        }
        Ok(inverted)
    }
}

/// Normalized form of `label` when it differs from `label`
fn unnormalized(label: &str) -> Option<String> {
    let normalized = normalize_label(label);
    (normalized != label).then_some(normalized)
}

/// One validated pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub index: usize,
    pub labels: [String; 3],
}

impl Pattern {
    /// Display form `a>b>c`
    pub fn name(&self) -> String {
        self.labels.join(">")
    }

    fn matches(&self, labels: [&str; 3]) -> bool {
        self.labels.iter().zip(labels).all(|(p, l)| p == l)
    }
}

/// Validated, ordered set of triplet patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Every entry must name exactly three distinct, non-blank labels in the
    /// lowercase underscore form that frame labels are composed in.
    ///
    /// Malformed entries are rejected here rather than normalized, so a
    /// configuration defect halts the run before any trial is processed.
    pub fn new(entries: &[Vec<String>]) -> Result<Self, TripletError> {
        if entries.is_empty() {
            return Err(TripletError::InvalidPattern {
                index: 0,
                reason: "no patterns configured".into(),
            });
        }

        let mut patterns = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let invalid = |reason: String| TripletError::InvalidPattern { index, reason };

            let labels: [String; 3] = entry
                .clone()
                .try_into()
                .map_err(|_| invalid(format!("expected 3 labels, got {}", entry.len())))?;

            if labels.iter().any(|l| l.trim().is_empty()) {
                return Err(invalid("blank label".into()));
            }
            if let Some((label, expected)) = labels
                .iter()
                .find_map(|l| unnormalized(l).map(|expected| (l, expected)))
            {
                return Err(invalid(format!(
                    "`{}` can never match a composed label, write `{}`",
                    label, expected
                )));
            }
            if labels[0] == labels[1] || labels[1] == labels[2] || labels[0] == labels[2] {
                return Err(invalid(format!("repeated label in {}", labels.join(">"))));
            }
            if !seen.insert(labels.clone()) {
                return Err(invalid(format!("duplicate of an earlier pattern {}", labels.join(">"))));
            }

            patterns.push(Pattern { index, labels });
        }

        Ok(Self { patterns })
    }

    /// First pattern equal to `labels`, in configured order
    pub fn find(&self, labels: [&str; 3]) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.matches(labels))
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
