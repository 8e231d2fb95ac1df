//! CSV Ingestion of Raw Frame Rows

use crate::error::ReaderError;
use crate::{RawFrameRow, TrialKey};
use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header names for each semantic field of the input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub participant_id: String,
    pub trial_id: String,
    pub frame_index: String,
    pub what: String,
    pub location: String,
    pub condition: String,
    pub participant_type: String,
    /// Optional in the input; absent column means no segment annotation
    pub segment: String,
    /// Optional in the input; absent column means unknown age
    pub age_months: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            participant_id: "participant_id".into(),
            trial_id: "trial_id".into(),
            frame_index: "frame_index".into(),
            what: "what".into(),
            location: "where".into(),
            condition: "condition".into(),
            participant_type: "participant_type".into(),
            segment: "segment".into(),
            age_months: "age_months".into(),
        }
    }
}

/// All raw rows of one participant-trial, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRows {
    pub key: TrialKey,
    pub rows: Vec<RawFrameRow>,
}

/// Resolved column positions for one header
struct ColumnIndex {
    participant_id: usize,
    trial_id: usize,
    frame_index: usize,
    what: usize,
    location: usize,
    condition: usize,
    participant_type: usize,
    segment: Option<usize>,
    age_months: Option<usize>,
}

impl ColumnIndex {
    fn resolve(columns: &ColumnMap, headers: &StringRecord) -> Result<Self, ReaderError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| ReaderError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            participant_id: required(&columns.participant_id)?,
            trial_id: required(&columns.trial_id)?,
            frame_index: required(&columns.frame_index)?,
            what: required(&columns.what)?,
            location: required(&columns.location)?,
            condition: required(&columns.condition)?,
            participant_type: required(&columns.participant_type)?,
            segment: position(&columns.segment),
            age_months: position(&columns.age_months),
        })
    }

    /// Cells that are not valid UTF-8 are kept as lossy text and flagged on
    /// the row, so only their trial fails.
    fn row(&self, record: &ByteRecord) -> RawFrameRow {
        let mut undecodable = Vec::new();
        let mut cell = |idx: Option<usize>, field: &'static str| -> Option<String> {
            let bytes = record.get(idx?)?;
            let text = match std::str::from_utf8(bytes) {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => {
                    let lossy = String::from_utf8_lossy(bytes);
                    undecodable.push((field, lossy.trim().to_string()));
                    lossy
                }
            };
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        };

        let row = RawFrameRow {
            participant_id: cell(Some(self.participant_id), "participant_id"),
            trial_id: cell(Some(self.trial_id), "trial_id"),
            frame_index: cell(Some(self.frame_index), "frame_index"),
            what: cell(Some(self.what), "what"),
            location: cell(Some(self.location), "where"),
            condition: cell(Some(self.condition), "condition"),
            participant_type: cell(Some(self.participant_type), "participant_type"),
            segment: cell(self.segment, "segment"),
            age_months: cell(self.age_months, "age_months"),
            undecodable: Vec::new(),
        };
        RawFrameRow { undecodable, ..row }
    }
}

/// Reads raw frame rows and groups them by participant-trial
pub struct CsvFrameReader {
    columns: ColumnMap,
}

impl CsvFrameReader {
    pub fn new(columns: ColumnMap) -> Self {
        Self { columns }
    }

    /// Read a CSV file from disk
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<TrialRows>, ReaderError> {
        let path = path.as_ref();
        info!("Reading frame table from {}", path.display());
        let file = std::fs::File::open(path)?;
        self.read_from(file)
    }

    /// Read CSV data from any reader.
    ///
    /// Trials come back in order of first appearance and rows keep their
    /// file order. Rows without an identifier are grouped under an empty id
    /// so the trial fails later with full context instead of vanishing.
    /// Rows with undecodable cells are grouped by their lossy ids the same
    /// way; only I/O failures abort the read.
    pub fn read_from<R: Read>(&self, input: R) -> Result<Vec<TrialRows>, ReaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let index = ColumnIndex::resolve(&self.columns, &headers)?;

        let mut trials: Vec<TrialRows> = Vec::new();
        let mut positions: HashMap<TrialKey, usize> = HashMap::new();
        let mut row_count = 0usize;

        for record in reader.byte_records() {
            let record = record?;
            let row = index.row(&record);
            let key = TrialKey::new(
                row.participant_id.clone().unwrap_or_default(),
                row.trial_id.clone().unwrap_or_default(),
            );

            let slot = *positions.entry(key.clone()).or_insert_with(|| {
                trials.push(TrialRows {
                    key,
                    rows: Vec::new(),
                });
                trials.len() - 1
            });
            trials[slot].rows.push(row);
            row_count += 1;
        }

        debug!("Grouped {} rows into {} trials", row_count, trials.len());
        Ok(trials)
    }
}

impl Default for CsvFrameReader {
    fn default() -> Self {
        Self::new(ColumnMap::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
participant_id,trial_id,frame_index,what,where,condition,participant_type,age_months
P01,1,1,man,face,give,infant,10
P01,1,2,man,face,give,infant,10
P02,1,1,toy,present,hug,adult,
P01,2,1,woman,face,give,infant,10
P01,1,3,toy,present,give,infant,10
";

    #[test]
    fn test_groups_by_trial_in_first_appearance_order() {
        let trials = CsvFrameReader::default().read_from(SAMPLE.as_bytes()).unwrap();

        let keys: Vec<_> = trials.iter().map(|t| t.key.to_string()).collect();
        assert_eq!(keys, vec!["P01/1", "P02/1", "P01/2"]);
        assert_eq!(trials[0].rows.len(), 3);
        assert_eq!(trials[0].rows[2].frame_index.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_cells_are_missing() {
        let trials = CsvFrameReader::default().read_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(trials[1].rows[0].age_months, None);
        assert_eq!(trials[1].rows[0].segment, None);
        assert_eq!(trials[1].rows[0].location.as_deref(), Some("present"));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "participant_id,trial_id,frame_index,what\nP01,1,1,man\n";
        let err = CsvFrameReader::default().read_from(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ReaderError::MissingColumn(ref c) if c == "where"));
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnMap {
            participant_id: "Participant".into(),
            trial_id: "Trial".into(),
            frame_index: "Frame".into(),
            what: "What".into(),
            location: "Where".into(),
            condition: "Cond".into(),
            participant_type: "Group".into(),
            ..Default::default()
        };
        let data = "Participant,Trial,Frame,What,Where,Cond,Group\nP9,4,7,man,face,give,adult\n";
        let trials = CsvFrameReader::new(columns).read_from(data.as_bytes()).unwrap();
        assert_eq!(trials[0].key, TrialKey::new("P9", "4"));
        assert_eq!(trials[0].rows[0].what.as_deref(), Some("man"));
    }

    #[test]
    fn test_invalid_utf8_cell_stays_with_its_trial() {
        let data: &[u8] = b"participant_id,trial_id,frame_index,what,where,condition,participant_type
P01,1,1,man,face,give,infant
P02,1,1,m\xFFan,face,hug,adult
P02,1,2,man,face,hug,adult
";

        let trials = CsvFrameReader::default().read_from(data).unwrap();
        let keys: Vec<_> = trials.iter().map(|t| t.key.to_string()).collect();
        assert_eq!(keys, vec!["P01/1", "P02/1"]);

        assert!(trials[0].rows[0].undecodable.is_empty());
        let bad = &trials[1].rows[0];
        assert_eq!(bad.undecodable, vec![("what", "m\u{FFFD}an".to_string())]);
        assert!(trials[1].rows[1].undecodable.is_empty());
    }
}
