use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{Frame, FrameRGBA};
use crate::sequence::naming::FrameNaming;
use crate::sequence::sequencer::{FrameFile, FrameSequencer};

/// Directory of persisted frames, one PNG per index.
///
/// This is the hand-off between decoupled stages: a render process writes, an assembly
/// process reads back through [`FrameSequencer`].
#[derive(Clone, Debug)]
pub struct FrameStore {
    dir: PathBuf,
    naming: FrameNaming,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>, naming: FrameNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    /// Path the frame with `index` is stored at.
    pub fn path_for(&self, index: FrameIndex) -> PathBuf {
        self.dir.join(self.naming.file_name(index))
    }

    /// Write `frame` as PNG, creating the directory on first use.
    pub fn write(&self, frame: &Frame) -> ReelResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create frame directory '{}'", self.dir.display()))?;
        let path = self.path_for(frame.index);
        let straight = to_straight_rgba(&frame.image);
        image::save_buffer_with_format(
            &path,
            &straight,
            frame.image.width,
            frame.image.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        tracing::debug!(index = frame.index.0, path = %path.display(), "persisted frame");
        Ok(path)
    }

    /// Read back the frame stored for `index`.
    pub fn load(&self, index: FrameIndex) -> ReelResult<Frame> {
        load_frame_file(&FrameFile {
            index,
            path: self.path_for(index),
        })
    }

    /// Every stored frame, ordered and checked for gaps and duplicates.
    pub fn scan(&self, expected: Option<u64>) -> ReelResult<Vec<FrameFile>> {
        FrameSequencer::new(expected).scan_dir(&self.dir, self.naming.prefix())
    }
}

/// Decode a persisted frame into premultiplied RGBA8.
pub fn load_frame_file(file: &FrameFile) -> ReelResult<Frame> {
    if !file.path.exists() {
        return Err(ReelError::NotFound(file.path.clone()));
    }
    let img = image::open(&file.path)
        .map_err(|e| ReelError::parse(format!("decode '{}': {e}", file.path.display())))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let mut data = img.into_raw();
    premultiply_in_place(&mut data);
    Ok(Frame {
        index: file.index,
        image: FrameRGBA::from_premul(width, height, data)?,
    })
}

fn to_straight_rgba(frame: &FrameRGBA) -> Vec<u8> {
    let mut out = frame.data.clone();
    if !frame.premultiplied {
        return out;
    }
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}

fn premultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/store.rs"]
mod tests;
