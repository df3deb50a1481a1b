//! pvreel turns a spectral data cube into a position-velocity movie.
//!
//! A `(V, Y, X)` cube is reduced once to a moment-0 reference map. Every slice along the last
//! axis is then rendered as a two-panel frame (reference map with a crosscut marker, plus the
//! position-velocity cut), and the frames are encoded in index order into one MP4.
//!
//! - Load a [`Cube`] through a [`CubeSource`] such as [`FitsSource`]
//! - Build a [`Pipeline`] with a [`DisplayConfig`]
//! - Render single frames, persist them to a [`FrameStore`], or stream every frame into an
//!   [`EncoderBackend`] through [`Pipeline::render_all`]
#![forbid(unsafe_code)]

mod config;
mod cube;
mod encode;
mod foundation;
mod pipeline;
mod render;
mod sequence;

pub use crate::config::{
    DisplayConfig, INDEX_PLACEHOLDER, MAX_CANVAS_EDGE, MarkerStyle, PanelStyle,
};
pub use crate::cube::fits::{
    CubeSource, FitsHeader, FitsSource, HeaderValue, InMemorySource, load_fits, read_primary_hdu,
};
pub use crate::cube::model::{AxisWcs, CoordinateMap, Cube};
pub use crate::cube::reduce::{ReferenceMap, reduce};
pub use crate::foundation::core::{ColorScale, Fps, FrameIndex};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::encode::assembler::{VideoAssembler, VideoStream, assemble};
pub use crate::encode::backend::{EncoderBackend, InMemoryEncoder, StreamConfig, VideoCodec};
pub use crate::encode::ffmpeg::{
    FfmpegEncoder, FfmpegEncoderOpts, is_ffmpeg_on_path, partial_path,
};
pub use crate::pipeline::{AbortFlag, Pipeline, PipelineOpts, RunReport};
pub use crate::render::backend::{
    Aspect, CpuBackendOpts, FigureSpec, Frame, FrameRGBA, PanelSpec, RenderBackend,
};
pub use crate::render::colormap::Colormap;
pub use crate::render::cpu::CpuBackend;
pub use crate::render::layout::{PanelLayout, figure_layout};
pub use crate::render::slice::{render_slice, slice_figure};
pub use crate::sequence::naming::{FrameNaming, MIN_INDEX_WIDTH, parse_frame_name};
pub use crate::sequence::reorder::ReorderBuffer;
pub use crate::sequence::sequencer::{FrameFile, FrameSequencer, FrameTagged};
pub use crate::sequence::store::{FrameStore, load_frame_file};
