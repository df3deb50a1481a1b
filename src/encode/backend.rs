use std::path::PathBuf;

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;

/// Geometry and rate of an output stream, fixed when the stream is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

impl StreamConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("stream width/height must be non-zero"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ReelError::validation("stream fps must be non-zero"));
        }
        Ok(())
    }
}

/// Video codec used for MP4 output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoCodec {
    /// libx264, widest player support.
    #[default]
    H264,
    /// MPEG-4 Part 2 (`mp4v`), no external codec library needed.
    Mpeg4,
}

impl VideoCodec {
    pub(crate) fn ffmpeg_args(self) -> &'static [&'static str] {
        match self {
            Self::H264 => &["-c:v", "libx264", "-pix_fmt", "yuv420p"],
            Self::Mpeg4 => &["-c:v", "mpeg4", "-q:v", "2", "-pix_fmt", "yuv420p"],
        }
    }
}

impl std::str::FromStr for VideoCodec {
    type Err = ReelError;

    fn from_str(s: &str) -> ReelResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "libx264" => Ok(Self::H264),
            "mpeg4" | "mp4v" => Ok(Self::Mpeg4),
            other => Err(ReelError::validation(format!(
                "unknown codec '{other}' (expected h264 or mpeg4)"
            ))),
        }
    }
}

/// Encoder contract consumed by the assembler.
///
/// Call order: `open` once, `append` per frame, then exactly one of `finalize` or `abort`.
/// Failures surface as `ReelError::Encoding`.
pub trait EncoderBackend: Send {
    fn open(&mut self, cfg: &StreamConfig) -> ReelResult<()>;
    fn append(&mut self, frame: &FrameRGBA) -> ReelResult<()>;
    fn finalize(&mut self) -> ReelResult<()>;
    /// Stop without sealing; whatever was written stays marked incomplete.
    fn abort(&mut self) -> ReelResult<()>;
}

/// Encoder that keeps frames in memory, for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<StreamConfig>,
    /// Frames in append order.
    pub frames: Vec<FrameRGBA>,
    finalized: bool,
    aborted: bool,
}

impl InMemoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&StreamConfig> {
        self.cfg.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl EncoderBackend for InMemoryEncoder {
    fn open(&mut self, cfg: &StreamConfig) -> ReelResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg.clone());
        self.frames.clear();
        self.finalized = false;
        self.aborted = false;
        Ok(())
    }

    fn append(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        if self.cfg.is_none() || self.finalized || self.aborted {
            return Err(ReelError::encoding("in-memory encoder is not open"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finalize(&mut self) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encoding("in-memory encoder is not open"));
        }
        self.finalized = true;
        Ok(())
    }

    fn abort(&mut self) -> ReelResult<()> {
        self.aborted = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/backend.rs"]
mod tests;
