use super::*;

fn idx(values: &[u64]) -> Vec<FrameIndex> {
    values.iter().copied().map(FrameIndex).collect()
}

#[test]
fn orders_by_numeric_index() {
    let out = FrameSequencer::new(Some(3)).order(idx(&[2, 0, 1])).unwrap();
    assert_eq!(out, idx(&[0, 1, 2]));

    let out = FrameSequencer::new(None).order(idx(&[10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0])).unwrap();
    assert_eq!(out.len(), 11);
    assert_eq!(out[10], FrameIndex(10));
}

#[test]
fn gap_is_missing_frame() {
    let err = FrameSequencer::new(Some(3)).order(idx(&[0, 2])).unwrap_err();
    assert!(matches!(err, ReelError::MissingFrame { index: 1 }));

    let err = FrameSequencer::new(Some(3)).order(idx(&[0, 1])).unwrap_err();
    assert!(matches!(err, ReelError::MissingFrame { index: 2 }));

    let err = FrameSequencer::new(None).order(idx(&[1, 2])).unwrap_err();
    assert!(matches!(err, ReelError::MissingFrame { index: 0 }));
}

#[test]
fn repeated_index_is_duplicate_frame() {
    let err = FrameSequencer::new(Some(2)).order(idx(&[0, 0, 1])).unwrap_err();
    assert!(matches!(err, ReelError::DuplicateFrame { index: 0 }));
}

#[test]
fn index_beyond_declared_range_is_rejected() {
    let err = FrameSequencer::new(Some(2)).order(idx(&[0, 1, 2])).unwrap_err();
    assert!(matches!(err, ReelError::IndexOutOfRange { index: 2, len: 2 }));
}

#[test]
fn tagged_payloads_travel_with_their_index() {
    let items = vec![(FrameIndex(1), "b"), (FrameIndex(0), "a")];
    let out = FrameSequencer::new(Some(2)).order(items).unwrap();
    assert_eq!(out, vec![(FrameIndex(0), "a"), (FrameIndex(1), "b")]);
}

#[test]
fn scan_dir_parses_names_instead_of_trusting_listing_order() {
    let dir = tempfile::tempdir().unwrap();
    // Mixed padding: lexical order would put 10 before 9.
    for name in ["pv_9.png", "pv_10.png", "pv_000.png", "notes.txt", "other_001.png"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    for i in 1..9 {
        std::fs::write(dir.path().join(format!("pv_{i:03}.png")), b"x").unwrap();
    }

    let files = FrameSequencer::new(Some(11)).scan_dir(dir.path(), "pv").unwrap();
    let order: Vec<u64> = files.iter().map(|f| f.index.0).collect();
    assert_eq!(order, (0..11).collect::<Vec<_>>());
    assert!(files[10].path.ends_with("pv_10.png"));
}

#[test]
fn scan_dir_reports_duplicates_and_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["pv_000.png", "pv_0.png"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    assert!(matches!(
        FrameSequencer::new(None).scan_dir(dir.path(), "pv"),
        Err(ReelError::DuplicateFrame { index: 0 })
    ));

    let gone = dir.path().join("gone");
    assert!(matches!(
        FrameSequencer::new(None).scan_dir(&gone, "pv"),
        Err(ReelError::NotFound(_))
    ));
}
