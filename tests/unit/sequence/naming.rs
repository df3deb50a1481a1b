use super::*;

#[test]
fn width_covers_the_largest_index() {
    assert_eq!(FrameNaming::for_len("f", 1).unwrap().width(), 3);
    assert_eq!(FrameNaming::for_len("f", 1000).unwrap().width(), 3);
    assert_eq!(FrameNaming::for_len("f", 1001).unwrap().width(), 4);
    assert_eq!(FrameNaming::for_len("f", 123_456).unwrap().width(), 6);
}

#[test]
fn file_names_are_zero_padded() {
    let naming = FrameNaming::for_len("NGC7538_PV", 120).unwrap();
    assert_eq!(naming.file_name(FrameIndex(7)), "NGC7538_PV_007.png");
    assert_eq!(naming.file_name(FrameIndex(119)), "NGC7538_PV_119.png");
}

#[test]
fn lexical_order_matches_numeric_order() {
    let naming = FrameNaming::for_len("pv", 1500).unwrap();
    let mut names: Vec<_> = [1200u64, 3, 999, 10, 0]
        .into_iter()
        .map(|i| naming.file_name(FrameIndex(i)))
        .collect();
    names.sort();
    let parsed: Vec<_> = names.iter().map(|n| naming.parse(n).unwrap().0).collect();
    assert_eq!(parsed, vec![0, 3, 10, 999, 1200]);
}

#[test]
fn parse_accepts_any_width_and_rejects_foreign_names() {
    let naming = FrameNaming::for_len("pv", 10).unwrap();
    assert_eq!(naming.parse("pv_12.png"), Some(FrameIndex(12)));
    assert_eq!(naming.parse("pv_0012.png"), Some(FrameIndex(12)));
    assert_eq!(naming.parse("pv_.png"), None);
    assert_eq!(naming.parse("pv_1a.png"), None);
    assert_eq!(naming.parse("pv_001.jpg"), None);
    assert_eq!(naming.parse("other_001.png"), None);
    assert_eq!(naming.parse("pv001.png"), None);
}

#[test]
fn invalid_prefixes_are_rejected() {
    assert!(FrameNaming::new("", 3).is_err());
    assert!(FrameNaming::new("a/b", 3).is_err());
    assert!(FrameNaming::new("ok", 0).is_err());
}
