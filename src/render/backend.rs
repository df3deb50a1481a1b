use std::sync::Arc;

use ndarray::ArrayView2;

use crate::config::MarkerStyle;
use crate::cube::model::AxisWcs;
use crate::foundation::core::{ColorScale, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::colormap::Colormap;

/// A rendered raster as RGBA8 bytes, row-major, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Wrap premultiplied pixel bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| ReelError::render("frame size overflows"))?;
        if data.len() != expected {
            return Err(ReelError::render(format!(
                "frame buffer holds {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel at `(x, y)`, `y = 0` being the top row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// One composed frame tagged with its slice index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub index: FrameIndex,
    pub image: FrameRGBA,
}

/// How a panel's image fills its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aspect {
    /// Square data pixels, letterboxed inside the cell.
    #[default]
    Equal,
    /// Stretch to fill the cell.
    Auto,
}

/// One heatmap panel with its colorbar and labels.
///
/// Row 0 of `data` is drawn at the bottom of the image (lower-left origin).
#[derive(Clone, Debug)]
pub struct PanelSpec<'a> {
    pub data: ArrayView2<'a, f32>,
    pub color_scale: ColorScale,
    pub colormap: Colormap,
    pub aspect: Aspect,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    /// Data column highlighted by a vertical dashed line through its centre.
    pub marker_column: Option<usize>,
    /// World mapping for column tick labels. Pixel numbers are shown when absent.
    pub x_axis: Option<&'a AxisWcs>,
    /// World mapping for row tick labels.
    pub y_axis: Option<&'a AxisWcs>,
}

/// Layout specification handed to a [`RenderBackend`]: panels side by side in equal cells.
#[derive(Clone, Debug)]
pub struct FigureSpec<'a> {
    pub width: u32,
    pub height: u32,
    /// Straight RGBA8; also used for NaN samples.
    pub background: [u8; 4],
    /// Straight RGBA8 for outlines, ticks and text.
    pub foreground: [u8; 4],
    pub font_size: f32,
    pub marker: MarkerStyle,
    pub panels: Vec<PanelSpec<'a>>,
}

/// Settings needed to build an equivalent backend on a worker thread.
#[derive(Clone, Debug, Default)]
pub struct CpuBackendOpts {
    /// Font file bytes used for titles and labels.
    pub font: Option<Arc<Vec<u8>>>,
}

/// Backend contract for rasterizing a [`FigureSpec`].
///
/// The output size must equal `(figure.width, figure.height)` for every call.
pub trait RenderBackend {
    /// Rasterize one figure.
    fn render(&mut self, figure: &FigureSpec<'_>) -> ReelResult<FrameRGBA>;

    /// Settings for per-worker backends in parallel runs. `None` when the backend cannot be
    /// replicated.
    fn worker_opts(&self) -> Option<CpuBackendOpts> {
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
