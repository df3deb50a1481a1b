use std::path::{Path, PathBuf};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::Frame;
use crate::sequence::naming::parse_frame_name;

/// Anything that carries a frame index.
pub trait FrameTagged {
    fn frame_index(&self) -> FrameIndex;
}

impl FrameTagged for Frame {
    fn frame_index(&self) -> FrameIndex {
        self.index
    }
}

impl FrameTagged for FrameIndex {
    fn frame_index(&self) -> FrameIndex {
        *self
    }
}

impl<T> FrameTagged for (FrameIndex, T) {
    fn frame_index(&self) -> FrameIndex {
        self.0
    }
}

/// A persisted frame found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameFile {
    pub index: FrameIndex,
    pub path: PathBuf,
}

impl FrameTagged for FrameFile {
    fn frame_index(&self) -> FrameIndex {
        self.index
    }
}

/// Orders frames by their numeric index and enforces a gap-free, duplicate-free `[0, X)`.
///
/// Input order (completion order, directory listing order) is never trusted.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSequencer {
    expected: Option<u64>,
}

impl FrameSequencer {
    /// `expected` is the declared frame count `X`. When `None`, `X` is taken as the largest
    /// index plus one.
    pub fn new(expected: Option<u64>) -> Self {
        Self { expected }
    }

    /// Sort `items` by index and check completeness.
    pub fn order<T: FrameTagged>(&self, mut items: Vec<T>) -> ReelResult<Vec<T>> {
        items.sort_by_key(|item| item.frame_index());

        let mut prev: Option<u64> = None;
        for (pos, item) in items.iter().enumerate() {
            let index = item.frame_index().0;
            if prev == Some(index) {
                return Err(ReelError::DuplicateFrame { index });
            }
            if let Some(len) = self.expected
                && index >= len
            {
                return Err(ReelError::IndexOutOfRange { index, len });
            }
            if index != pos as u64 {
                return Err(ReelError::MissingFrame { index: pos as u64 });
            }
            prev = Some(index);
        }

        if let Some(len) = self.expected
            && (items.len() as u64) < len
        {
            return Err(ReelError::MissingFrame {
                index: items.len() as u64,
            });
        }
        Ok(items)
    }

    /// List `dir`, keep files named `"<prefix>_<digits>.png"` and order them numerically.
    #[tracing::instrument(skip(self), fields(dir = %dir.display()))]
    pub fn scan_dir(&self, dir: &Path, prefix: &str) -> ReelResult<Vec<FrameFile>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::NotFound(dir.to_path_buf()));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("list frame directory '{}'", dir.display()))
                    .into());
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                anyhow::Error::new(e).context(format!("list frame directory '{}'", dir.display()))
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(index) = parse_frame_name(prefix, name) {
                files.push(FrameFile {
                    index,
                    path: entry.path(),
                });
            }
        }
        tracing::debug!(found = files.len(), "scanned frame directory");
        self.order(files)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/sequencer.rs"]
mod tests;
