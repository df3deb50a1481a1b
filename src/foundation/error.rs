use std::path::PathBuf;

/// Convenience result type used across pvreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by every pipeline stage.
///
/// All errors are fatal to the current run. Variants that concern a single frame carry its
/// index so callers can report exactly where a run stopped.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// The input file does not exist or cannot be opened.
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input file exists but is malformed or truncated.
    #[error("parse error: {0}")]
    Parse(String),

    /// Cube dimensionality or shape invariant violated.
    #[error("shape error: {0}")]
    Shape(String),

    /// A slice index outside `[0, len)` was requested.
    #[error("slice index {index} out of range [0, {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Number of valid indices.
        len: u64,
    },

    /// A frame index in the declared range has no frame.
    #[error("missing frame {index}")]
    MissingFrame {
        /// First index without a frame.
        index: u64,
    },

    /// A frame index was supplied more than once.
    #[error("duplicate frame {index}")]
    DuplicateFrame {
        /// Index seen twice.
        index: u64,
    },

    /// The rendering backend failed.
    #[error("render error: {0}")]
    Render(String),

    /// The video encoder failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A frame does not match the geometry fixed by the first frame of the stream.
    #[error(
        "dimension mismatch at frame {index}: got {}x{}, expected {}x{}",
        .got.0, .got.1, .expected.0, .expected.1
    )]
    DimensionMismatch {
        /// Offending frame index.
        index: u64,
        /// `(width, height)` fixed by the first frame.
        expected: (u32, u32),
        /// `(width, height)` of the offending frame.
        got: (u32, u32),
    },

    /// Append or finalize attempted on a sealed stream.
    #[error("video stream is already finalized")]
    StreamClosed,

    /// No frames were supplied to the assembler.
    #[error("no frames to assemble")]
    EmptyInput,

    /// The run was aborted between slices; the output stream is incomplete.
    #[error("run aborted after {completed} frames")]
    Aborted {
        /// Frames rendered before the abort was observed.
        completed: u64,
    },

    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ReelError::Shape`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for the input error class (missing, unreadable or malformed file).
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Parse(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
