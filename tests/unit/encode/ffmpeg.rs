use super::*;
use crate::encode::assembler::assemble;
use crate::foundation::core::{Fps, FrameIndex};
use crate::render::backend::Frame;

#[test]
fn flatten_premul_composites_over_background() {
    let src = vec![
        0, 0, 0, 0, // transparent
        100, 50, 0, 255, // opaque
        64, 0, 0, 128, // half red, premultiplied
    ];
    let mut dst = vec![0u8; src.len()];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [255, 255, 255, 255]).unwrap();
    assert_eq!(&dst[0..4], &[255, 255, 255, 255]);
    assert_eq!(&dst[4..8], &[100, 50, 0, 255]);
    assert_eq!(&dst[8..12], &[191, 127, 127, 255]);
}

#[test]
fn flatten_straight_alpha_multiplies_first() {
    let src = vec![200, 0, 0, 0, 200, 0, 0, 128];
    let mut dst = vec![0u8; src.len()];
    flatten_to_opaque_rgba8(&mut dst, &src, false, [0, 0, 0, 255]).unwrap();
    assert_eq!(&dst[0..4], &[0, 0, 0, 255]);
    assert_eq!(&dst[4..8], &[100, 0, 0, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(matches!(
        flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], true, [0; 4]),
        Err(ReelError::Encoding(_))
    ));
}

#[test]
fn partial_path_appends_suffix() {
    assert_eq!(
        partial_path(Path::new("out/pv.mp4")),
        PathBuf::from("out/pv.mp4.partial")
    );
}

#[test]
fn append_before_open_is_an_encoding_error() {
    let mut enc = FfmpegEncoder::new(FfmpegEncoderOpts::default());
    let frame = FrameRGBA::from_premul(2, 2, vec![0; 16]).unwrap();
    assert!(matches!(enc.append(&frame), Err(ReelError::Encoding(_))));
    assert!(matches!(enc.finalize(), Err(ReelError::Encoding(_))));
}

#[test]
fn odd_sized_stream_encodes_to_mp4_when_ffmpeg_is_present() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("pv.mp4");
    let frames = (0..3).map(|i| {
        let shade = (i * 80) as u8;
        Ok(Frame {
            index: FrameIndex(i),
            image: FrameRGBA::from_premul(17, 9, [shade, 0, 0, 255].repeat(17 * 9)).unwrap(),
        })
    });
    let mut enc = FfmpegEncoder::new(FfmpegEncoderOpts {
        codec: VideoCodec::Mpeg4,
        ..FfmpegEncoderOpts::default()
    });
    let stream = assemble(frames, Fps::new(5, 1).unwrap(), &out, &mut enc).unwrap();

    assert_eq!(stream.frame_count, 3);
    assert!(out.exists());
    assert!(!partial_path(&out).exists());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn abort_leaves_only_the_partial_file() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pv.mp4");
    let mut enc = FfmpegEncoder::new(FfmpegEncoderOpts {
        codec: VideoCodec::Mpeg4,
        ..FfmpegEncoderOpts::default()
    });
    enc.open(&StreamConfig {
        path: out.clone(),
        width: 4,
        height: 4,
        fps: Fps::default(),
    })
    .unwrap();
    enc.append(&FrameRGBA::from_premul(4, 4, vec![255; 64]).unwrap())
        .unwrap();
    enc.abort().unwrap();
    assert!(!out.exists());
}
