use crate::foundation::core::{FrameIndex, decimal_digits};
use crate::foundation::error::{ReelError, ReelResult};

/// Smallest zero-padding width ever used for frame file names.
pub const MIN_INDEX_WIDTH: usize = 3;

const EXTENSION: &str = ".png";

/// Stable `"<prefix>_<index zero-padded>.png"` naming for persisted frames.
///
/// With `width` at least the digit count of `len - 1`, lexical and numeric order of the names
/// coincide. Readers never rely on that: [`FrameNaming::parse`] recovers the number itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameNaming {
    prefix: String,
    width: usize,
}

impl FrameNaming {
    /// Naming with an explicit padding width.
    pub fn new(prefix: impl Into<String>, width: usize) -> ReelResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ReelError::validation("frame prefix must be non-empty"));
        }
        if prefix.contains(['/', '\\']) {
            return Err(ReelError::validation(format!(
                "frame prefix '{prefix}' must not contain path separators"
            )));
        }
        if width == 0 {
            return Err(ReelError::validation("frame index width must be >= 1"));
        }
        Ok(Self { prefix, width })
    }

    /// Naming wide enough for indices `0..len`, never narrower than three digits.
    pub fn for_len(prefix: impl Into<String>, len: u64) -> ReelResult<Self> {
        let width = decimal_digits(len.saturating_sub(1)).max(MIN_INDEX_WIDTH);
        Self::new(prefix, width)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// File name for `index`.
    pub fn file_name(&self, index: FrameIndex) -> String {
        format!(
            "{}_{:0width$}{EXTENSION}",
            self.prefix,
            index.0,
            width = self.width
        )
    }

    /// Index encoded in `name`, or `None` when the name is not one of ours.
    ///
    /// Any digit count is accepted so frames written with a different width still sort
    /// correctly.
    pub fn parse(&self, name: &str) -> Option<FrameIndex> {
        parse_frame_name(&self.prefix, name)
    }
}

/// Parse `"<prefix>_<digits>.png"` into its numeric index.
pub fn parse_frame_name(prefix: &str, name: &str) -> Option<FrameIndex> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(EXTENSION)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(FrameIndex)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/naming.rs"]
mod tests;
