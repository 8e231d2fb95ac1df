use aoi_stream::{ParticipantType, Segment, TrialKey, TrialMeta};
use fixation::Fixation;
use fixation_log::{FixationLog, TableWriter, FIXATIONS_FILE, TRIPLETS_FILE};
use std::collections::HashMap;
use tempfile::TempDir;
use transitions::TransitionExtractor;
use triplets::{TripletConfig, TripletDetector};

fn fixation(label: &str, start: u64, end: u64, index: usize) -> Fixation {
    Fixation {
        participant_id: "P07".into(),
        trial_id: "2".into(),
        aoi_label: label.into(),
        start_frame: start,
        end_frame: end,
        duration_frames: (end - start + 1) as u32,
        duration_ms: (end - start + 1) as f64 * 1000.0 / 30.0,
        sequence_index: index,
        segment: Some(Segment::Interaction),
    }
}

fn read_rows(path: &std::path::Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn exports_fixations_with_trial_metadata() {
    let meta = TrialMeta {
        key: TrialKey::new("P07", "2"),
        condition: "give".into(),
        participant_type: ParticipantType::Adult,
        age_months: None,
    };
    let fixations = vec![
        fixation("man_face", 1, 5, 0),
        fixation("toy_present", 6, 12, 1),
        fixation("woman_face", 14, 20, 2),
    ];

    let mut log = FixationLog::new();
    log.push_trial(&meta, fixations.clone()).unwrap();

    let dir = TempDir::new().unwrap();
    let writer = TableWriter::new(dir.path()).unwrap();

    let rows = read_rows(&writer.write_fixations(&log).unwrap());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["aoi_label"], "toy_present");
    assert_eq!(rows[1]["start_frame"], "6");
    assert_eq!(rows[1]["duration_frames"], "7");
    assert_eq!(rows[1]["condition"], "give");
    assert_eq!(rows[1]["segment"], "interaction");
    assert_eq!(rows[1]["participant_type"], "adult");
    assert_eq!(rows[1]["age_months"], "");

    let triplets = TripletDetector::new(&TripletConfig::default())
        .unwrap()
        .detect(&fixations);
    let path = writer
        .write_triplets(triplets.iter().map(|t| ("give", t)))
        .unwrap();
    assert!(path.ends_with(TRIPLETS_FILE));
    let rows = read_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["pattern_matched"], "man_face>toy_present>woman_face");
    assert_eq!(rows[0]["gap_1"], "0");
    assert_eq!(rows[0]["gap_2"], "1");

    let trial = TransitionExtractor::default().extract(&meta.key, &fixations);
    let rows = read_rows(&writer.write_transitions([&trial], 5).unwrap());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["from_aoi"], "man_face");
    assert_eq!(rows[0]["trial_eligible"], "false");
}

#[test]
fn empty_tables_keep_their_header() {
    let dir = TempDir::new().unwrap();
    let writer = TableWriter::new(dir.path()).unwrap();

    let path = writer.write_fixations(&FixationLog::new()).unwrap();
    assert!(path.ends_with(FIXATIONS_FILE));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("participant_id,trial_id,aoi_label,start_frame"));
    assert_eq!(text.lines().count(), 1);
}
