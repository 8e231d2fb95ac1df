//! Ordered AOI Frame Stream for one participant-trial

use crate::composer::LabelComposer;
use crate::error::StreamError;
use crate::{ParticipantType, RawFrameRow, Segment, TrialKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest accepted frame index, so frame distances fit in an `i64`
pub const MAX_FRAME_INDEX: u64 = i64::MAX as u64;

/// One sampled gaze frame after label composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position within the trial as annotated (expected strictly increasing)
    pub frame_index: u64,
    /// Composed AOI label, possibly the off-screen sentinel
    pub aoi_label: String,
    /// Event segment, when annotated
    pub segment: Option<Segment>,
}

impl Frame {
    pub fn new(frame_index: u64, aoi_label: impl Into<String>) -> Self {
        Self {
            frame_index,
            aoi_label: aoi_label.into(),
            segment: None,
        }
    }
}

/// Per-trial attributes shared by every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMeta {
    pub key: TrialKey,
    pub condition: String,
    pub participant_type: ParticipantType,
    pub age_months: Option<f64>,
}

/// Ordered `(frame_index, aoi_label)` sequence for one participant-trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiFrameStream {
    meta: TrialMeta,
    frames: Vec<Frame>,
}

impl AoiFrameStream {
    /// Wrap already-normalized frames. Order is kept as given.
    pub fn new(meta: TrialMeta, frames: Vec<Frame>) -> Self {
        Self { meta, frames }
    }

    /// Normalize one trial's raw rows.
    ///
    /// Rows are never reordered or skipped; the first bad row fails the trial.
    /// Condition, participant type and age must agree on every row.
    pub fn from_rows(rows: &[RawFrameRow], composer: &LabelComposer) -> Result<Self, StreamError> {
        let first = rows.first().ok_or(StreamError::EmptyTrial)?;

        let participant_id = present(&first.participant_id).unwrap_or_default().to_string();
        let trial_id = present(&first.trial_id).unwrap_or_default().to_string();
        let ctx = RowContext {
            participant_id: &participant_id,
            trial_id: &trial_id,
        };

        let attributes = TrialAttributes::parse(&ctx, 0, first)?;

        let mut frames = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if let Some((field, value)) = row.undecodable.first() {
                return Err(ctx.invalid(row_idx, *field, value.as_str()));
            }

            let row_participant = ctx.require(row_idx, "participant_id", &row.participant_id)?;
            let row_trial = ctx.require(row_idx, "trial_id", &row.trial_id)?;
            if row_participant != participant_id || row_trial != trial_id {
                return Err(StreamError::MixedTrial {
                    participant_id: participant_id.clone(),
                    trial_id: trial_id.clone(),
                    row: row_idx,
                    found: TrialKey::new(row_participant, row_trial).to_string(),
                });
            }

            let frame_index = ctx.parse::<u64>(row_idx, "frame_index", &row.frame_index)?;
            if frame_index > MAX_FRAME_INDEX {
                return Err(ctx.invalid(row_idx, "frame_index", frame_index.to_string()));
            }
            let what = ctx.require(row_idx, "what", &row.what)?;
            let location = ctx.require(row_idx, "where", &row.location)?;
            let row_attributes = TrialAttributes::parse(&ctx, row_idx, row)?;
            attributes.expect_same(&ctx, row_idx, &row_attributes)?;

            let segment = match present(&row.segment) {
                Some(raw) => Some(ctx.parse_value::<Segment>(row_idx, "segment", raw)?),
                None => None,
            };

            frames.push(Frame {
                frame_index,
                aoi_label: composer.compose(what, location),
                segment,
            });
        }

        debug!(
            "Normalized {} frames for {}/{}",
            frames.len(),
            participant_id,
            trial_id
        );

        Ok(Self {
            meta: TrialMeta {
                key: TrialKey::new(participant_id, trial_id),
                condition: attributes.condition,
                participant_type: attributes.participant_type,
                age_months: attributes.age_months,
            },
            frames,
        })
    }

    pub fn meta(&self) -> &TrialMeta {
        &self.meta
    }

    pub fn key(&self) -> &TrialKey {
        &self.meta.key
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Per-trial attributes as read from one row
struct TrialAttributes {
    condition: String,
    participant_type: ParticipantType,
    age_months: Option<f64>,
}

impl TrialAttributes {
    fn parse(ctx: &RowContext<'_>, row_idx: usize, row: &RawFrameRow) -> Result<Self, StreamError> {
        let condition = ctx.require(row_idx, "condition", &row.condition)?.to_string();
        let participant_type = ctx.parse(row_idx, "participant_type", &row.participant_type)?;
        let age_months = match present(&row.age_months) {
            Some(raw) => {
                let age = ctx.parse_value::<f64>(row_idx, "age_months", raw)?;
                if !age.is_finite() || age < 0.0 {
                    return Err(ctx.invalid(row_idx, "age_months", raw));
                }
                Some(age)
            }
            None => None,
        };

        Ok(Self {
            condition,
            participant_type,
            age_months,
        })
    }

    fn expect_same(
        &self,
        ctx: &RowContext<'_>,
        row_idx: usize,
        other: &TrialAttributes,
    ) -> Result<(), StreamError> {
        if other.condition != self.condition {
            return Err(ctx.inconsistent(row_idx, "condition", &self.condition, &other.condition));
        }
        if other.participant_type != self.participant_type {
            return Err(ctx.inconsistent(
                row_idx,
                "participant_type",
                self.participant_type.as_str(),
                other.participant_type.as_str(),
            ));
        }
        if other.age_months != self.age_months {
            return Err(ctx.inconsistent(
                row_idx,
                "age_months",
                &describe_age(self.age_months),
                &describe_age(other.age_months),
            ));
        }
        Ok(())
    }
}

fn describe_age(age: Option<f64>) -> String {
    age.map(|a| a.to_string()).unwrap_or_default()
}

/// Trial identity used to annotate row-level errors
struct RowContext<'a> {
    participant_id: &'a str,
    trial_id: &'a str,
}

impl<'a> RowContext<'a> {
    fn require<'r>(
        &self,
        row: usize,
        field: &'static str,
        value: &'r Option<String>,
    ) -> Result<&'r str, StreamError> {
        present(value).ok_or_else(|| StreamError::MissingField {
            participant_id: self.participant_id.to_string(),
            trial_id: self.trial_id.to_string(),
            row,
            field,
        })
    }

    fn parse<T: std::str::FromStr>(
        &self,
        row: usize,
        field: &'static str,
        value: &Option<String>,
    ) -> Result<T, StreamError> {
        let raw = self.require(row, field, value)?;
        self.parse_value(row, field, raw)
    }

    fn parse_value<T: std::str::FromStr>(
        &self,
        row: usize,
        field: &'static str,
        raw: &str,
    ) -> Result<T, StreamError> {
        raw.parse::<T>().map_err(|_| self.invalid(row, field, raw))
    }

    fn invalid(&self, row: usize, field: &'static str, value: impl Into<String>) -> StreamError {
        StreamError::InvalidValue {
            participant_id: self.participant_id.to_string(),
            trial_id: self.trial_id.to_string(),
            row,
            field,
            value: value.into(),
        }
    }

    fn inconsistent(&self, row: usize, field: &'static str, expected: &str, found: &str) -> StreamError {
        StreamError::InconsistentValue {
            participant_id: self.participant_id.to_string(),
            trial_id: self.trial_id.to_string(),
            row,
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// A field counts as present only if it has non-whitespace content
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OFF_SCREEN;

    fn row(frame: &str, what: &str, location: &str) -> RawFrameRow {
        RawFrameRow {
            participant_id: Some("P01".into()),
            trial_id: Some("T1".into()),
            frame_index: Some(frame.into()),
            what: Some(what.into()),
            location: Some(location.into()),
            condition: Some("give".into()),
            segment: Some("interaction".into()),
            age_months: Some("11.5".into()),
            participant_type: Some("infant".into()),
            undecodable: Vec::new(),
        }
    }

    #[test]
    fn test_normalizes_rows_in_order() {
        let rows = vec![
            row("1", "man", "face"),
            row("2", "toy", "present"),
            row("3", "no", "signal"),
        ];
        let stream = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap();

        let labels: Vec<_> = stream.frames().iter().map(|f| f.aoi_label.as_str()).collect();
        assert_eq!(labels, vec!["man_face", "toy_present", OFF_SCREEN]);
        assert_eq!(stream.meta().condition, "give");
        assert_eq!(stream.meta().participant_type, ParticipantType::Infant);
        assert_eq!(stream.meta().age_months, Some(11.5));
        assert_eq!(stream.frames()[0].segment, Some(Segment::Interaction));
    }

    #[test]
    fn test_does_not_reorder() {
        let rows = vec![row("5", "man", "face"), row("2", "man", "face")];
        let stream = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap();
        let indices: Vec<_> = stream.frames().iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![5, 2]);
    }

    #[test]
    fn test_missing_field_fails_trial() {
        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].location = Some("   ".into());

        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert_eq!(
            err,
            StreamError::MissingField {
                participant_id: "P01".into(),
                trial_id: "T1".into(),
                row: 1,
                field: "where",
            }
        );
    }

    #[test]
    fn test_invalid_frame_index() {
        let rows = vec![row("one", "man", "face")];
        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_value");
    }

    #[test]
    fn test_mixed_trial_rows() {
        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].trial_id = Some("T2".into());
        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert_eq!(err.kind(), "mixed_trial");
    }

    #[test]
    fn test_optional_fields() {
        let mut rows = vec![row("1", "man", "face")];
        rows[0].segment = None;
        rows[0].age_months = None;
        let stream = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap();
        assert_eq!(stream.meta().age_months, None);
        assert_eq!(stream.frames()[0].segment, None);
    }

    #[test]
    fn test_undecodable_cell_fails_trial() {
        let mut rows = vec![row("1", "man", "face"), row("2", "m\u{FFFD}an", "face")];
        rows[1].undecodable = vec![("what", "m\u{FFFD}an".into())];

        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert_eq!(
            err,
            StreamError::InvalidValue {
                participant_id: "P01".into(),
                trial_id: "T1".into(),
                row: 1,
                field: "what",
                value: "m\u{FFFD}an".into(),
            }
        );
    }

    #[test]
    fn test_unparsable_age_on_later_row() {
        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].age_months = Some("abc".into());

        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidValue { row: 1, field: "age_months", .. }
        ));
    }

    #[test]
    fn test_condition_must_agree_across_rows() {
        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].condition = Some("hug".into());

        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert_eq!(err.kind(), "inconsistent_value");
        assert_eq!(
            err,
            StreamError::InconsistentValue {
                participant_id: "P01".into(),
                trial_id: "T1".into(),
                row: 1,
                field: "condition",
                expected: "give".into(),
                found: "hug".into(),
            }
        );
    }

    #[test]
    fn test_participant_type_and_age_must_agree() {
        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].participant_type = Some("adult".into());
        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InconsistentValue { field: "participant_type", .. }
        ));

        let mut rows = vec![row("1", "man", "face"), row("2", "man", "face")];
        rows[1].age_months = None;
        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InconsistentValue { field: "age_months", .. }
        ));
    }

    #[test]
    fn test_frame_index_above_signed_range() {
        let rows = vec![row("9223372036854775807", "man", "face")];
        assert!(AoiFrameStream::from_rows(&rows, &LabelComposer::default()).is_ok());

        let rows = vec![row("9223372036854775808", "man", "face")];
        let err = AoiFrameStream::from_rows(&rows, &LabelComposer::default()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidValue { field: "frame_index", .. }
        ));
    }

    #[test]
    fn test_empty_trial() {
        let err = AoiFrameStream::from_rows(&[], &LabelComposer::default()).unwrap_err();
        assert_eq!(err, StreamError::EmptyTrial);
    }
}
