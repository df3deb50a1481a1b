use std::path::{Path, PathBuf};

use crate::encode::backend::{EncoderBackend, StreamConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::Frame;

/// Summary of a sealed video stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoStream {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub frame_count: u64,
}

impl VideoStream {
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frame_count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Unopened,
    Opened { width: u32, height: u32 },
    Finalized,
}

/// Appends frames to an encoder strictly in index order.
///
/// The first frame fixes the stream geometry; it must carry index 0, and every following frame
/// the previous index plus one. Once [`VideoAssembler::finalize`] or [`VideoAssembler::abort`]
/// has run, the stream is closed.
pub struct VideoAssembler<'e> {
    encoder: &'e mut dyn EncoderBackend,
    path: PathBuf,
    fps: Fps,
    state: State,
    next: u64,
}

impl<'e> VideoAssembler<'e> {
    pub fn new(encoder: &'e mut dyn EncoderBackend, path: impl Into<PathBuf>, fps: Fps) -> Self {
        Self {
            encoder,
            path: path.into(),
            fps,
            state: State::Unopened,
            next: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_appended(&self) -> u64 {
        self.next
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Finalized
    }

    pub fn append(&mut self, frame: &Frame) -> ReelResult<()> {
        let index = frame.index.0;
        let (w, h) = frame.image.dimensions();

        match self.state {
            State::Finalized => return Err(ReelError::StreamClosed),
            State::Unopened => {
                check_order(index, self.next)?;
                self.encoder.open(&StreamConfig {
                    path: self.path.clone(),
                    width: w,
                    height: h,
                    fps: self.fps,
                })?;
                self.state = State::Opened {
                    width: w,
                    height: h,
                };
            }
            State::Opened { width, height } => {
                check_order(index, self.next)?;
                if (w, h) != (width, height) {
                    return Err(ReelError::DimensionMismatch {
                        index,
                        expected: (width, height),
                        got: (w, h),
                    });
                }
            }
        }

        self.encoder.append(&frame.image)?;
        self.next += 1;
        Ok(())
    }

    /// Seal the stream. Fails with `EmptyInput` when nothing was appended.
    pub fn finalize(&mut self) -> ReelResult<VideoStream> {
        let (width, height) = match self.state {
            State::Finalized => return Err(ReelError::StreamClosed),
            State::Unopened => return Err(ReelError::EmptyInput),
            State::Opened { width, height } => (width, height),
        };
        self.encoder.finalize()?;
        self.state = State::Finalized;

        tracing::info!(
            path = %self.path.display(),
            frames = self.next,
            width,
            height,
            "video stream finalized"
        );
        Ok(VideoStream {
            path: self.path.clone(),
            width,
            height,
            fps: self.fps,
            frame_count: self.next,
        })
    }

    /// Close the stream without sealing it. A no-op once closed.
    pub fn abort(&mut self) -> ReelResult<()> {
        let was_open = matches!(self.state, State::Opened { .. });
        self.state = State::Finalized;
        if was_open {
            tracing::warn!(frames = self.next, "video stream aborted");
            self.encoder.abort()?;
        }
        Ok(())
    }
}

fn check_order(index: u64, next: u64) -> ReelResult<()> {
    if index < next {
        Err(ReelError::DuplicateFrame { index })
    } else if index > next {
        Err(ReelError::MissingFrame { index: next })
    } else {
        Ok(())
    }
}

/// Encode an ordered frame sequence into one stream at `path`.
///
/// Any failure aborts the stream before the error is returned.
pub fn assemble<I>(
    frames: I,
    fps: Fps,
    path: impl Into<PathBuf>,
    encoder: &mut dyn EncoderBackend,
) -> ReelResult<VideoStream>
where
    I: IntoIterator<Item = ReelResult<Frame>>,
{
    let mut assembler = VideoAssembler::new(encoder, path, fps);
    let res = frames
        .into_iter()
        .try_for_each(|frame| assembler.append(&frame?))
        .and_then(|()| assembler.finalize());
    if res.is_err()
        && let Err(e) = assembler.abort()
    {
        tracing::warn!(error = %e, "failed to abort video stream");
    }
    res
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assembler.rs"]
mod tests;
