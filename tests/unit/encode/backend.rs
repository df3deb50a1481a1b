use super::*;

fn cfg(w: u32, h: u32) -> StreamConfig {
    StreamConfig {
        path: PathBuf::from("out.mp4"),
        width: w,
        height: h,
        fps: Fps::default(),
    }
}

#[test]
fn stream_config_rejects_empty_geometry() {
    assert!(cfg(4, 4).validate().is_ok());
    assert!(matches!(
        cfg(0, 4).validate(),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn codec_parses_common_names() {
    assert_eq!("h264".parse::<VideoCodec>().unwrap(), VideoCodec::H264);
    assert_eq!("MP4V".parse::<VideoCodec>().unwrap(), VideoCodec::Mpeg4);
    assert!("vp9".parse::<VideoCodec>().is_err());
    assert_eq!(VideoCodec::Mpeg4.ffmpeg_args()[1], "mpeg4");
}

#[test]
fn in_memory_encoder_tracks_lifecycle() {
    let mut enc = InMemoryEncoder::new();
    let frame = FrameRGBA::from_premul(4, 4, vec![0; 64]).unwrap();
    assert!(enc.append(&frame).is_err());

    enc.open(&cfg(4, 4)).unwrap();
    enc.append(&frame).unwrap();
    enc.finalize().unwrap();
    assert!(enc.is_finalized());
    assert_eq!(enc.frames.len(), 1);
    assert!(enc.append(&frame).is_err());
}
