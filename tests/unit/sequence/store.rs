use super::*;

fn solid(index: u64, w: u32, h: u32, rgba: [u8; 4]) -> Frame {
    let data = rgba.repeat((w * h) as usize);
    Frame {
        index: FrameIndex(index),
        image: FrameRGBA::from_premul(w, h, data).unwrap(),
    }
}

#[test]
fn write_then_load_preserves_opaque_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let store = FrameStore::new(dir.path().join("frames"), FrameNaming::for_len("pv", 3).unwrap());

    let frame = solid(2, 4, 3, [10, 200, 30, 255]);
    let path = store.write(&frame).unwrap();
    assert!(path.ends_with("pv_002.png"));

    let back = store.load(FrameIndex(2)).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn premultiplied_alpha_survives_the_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FrameStore::new(dir.path(), FrameNaming::for_len("pv", 1).unwrap());
    let frame = solid(0, 2, 2, [64, 0, 0, 128]);
    store.write(&frame).unwrap();
    let back = store.load(FrameIndex(0)).unwrap();
    let px = back.image.pixel(0, 0).unwrap();
    assert_eq!(px[3], 128);
    assert!((i16::from(px[0]) - 64).abs() <= 1);
}

#[test]
fn scan_returns_frames_in_index_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = FrameStore::new(dir.path(), FrameNaming::for_len("pv", 3).unwrap());
    for i in [2u64, 0, 1] {
        store.write(&solid(i, 2, 2, [0, 0, 0, 255])).unwrap();
    }
    let files = store.scan(Some(3)).unwrap();
    let order: Vec<u64> = files.iter().map(|f| f.index.0).collect();
    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn missing_and_corrupt_frames_are_input_errors() {
    let dir = tempfile::tempdir().unwrap();
    let store = FrameStore::new(dir.path(), FrameNaming::for_len("pv", 3).unwrap());
    assert!(matches!(
        store.load(FrameIndex(1)),
        Err(ReelError::NotFound(_))
    ));

    std::fs::write(store.path_for(FrameIndex(0)), b"not a png").unwrap();
    let err = store.load(FrameIndex(0)).unwrap_err();
    assert!(matches!(err, ReelError::Parse(_)));
    assert!(err.is_input_error());
}
