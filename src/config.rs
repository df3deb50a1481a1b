//! Display configuration passed explicitly into slice rendering.
//!
//! Every field has a default, so a JSON file only needs the keys it overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{ColorScale, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::colormap::Colormap;

/// Largest canvas edge the raster backend accepts.
pub const MAX_CANVAS_EDGE: u32 = u16::MAX as u32;

/// Placeholder replaced by the frame index in panel titles.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Fixed visualization parameters for one run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    /// Figure background, straight RGBA8.
    pub background: [u8; 4],
    /// Colour used for text, outlines and ticks, straight RGBA8.
    pub foreground: [u8; 4],
    /// TrueType/OpenType font used for titles and labels. Text is skipped when unset.
    pub font_path: Option<PathBuf>,
    /// Base font size in pixels; titles use 1.2x.
    pub font_size: f32,
    /// Moment map panel (left).
    pub reference: PanelStyle,
    /// Position-velocity panel (right).
    pub slice: PanelStyle,
    /// Crosscut marker drawn on the reference panel.
    pub marker: MarkerStyle,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1640,
            height: 640,
            background: [255, 255, 255, 255],
            foreground: [0, 0, 0, 255],
            font_path: None,
            font_size: 14.0,
            reference: PanelStyle {
                color_scale: ColorScale {
                    min: 0.0,
                    max: 1000.0,
                },
                colormap: Colormap::Viridis,
                title: "Moment 0 Map - Red Crosscut".to_string(),
                x_label: "Right Ascension".to_string(),
                y_label: "Declination".to_string(),
                colorbar_label: String::new(),
            },
            slice: PanelStyle {
                color_scale: ColorScale {
                    min: 0.0,
                    max: 10.0,
                },
                colormap: Colormap::Viridis,
                title: format!("PV Diagram - Vertical Cut {INDEX_PLACEHOLDER}"),
                x_label: "Declination".to_string(),
                y_label: "Velocity".to_string(),
                colorbar_label: "Intensity".to_string(),
            },
            marker: MarkerStyle::default(),
        }
    }
}

impl DisplayConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read display config '{}'", path.display()))
                    .into());
            }
        };
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse display config '{}'", path.display()))
            .map_err(|e| ReelError::parse(format!("{e:#}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check canvas bounds, colour scales and marker geometry.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        if self.width > MAX_CANVAS_EDGE || self.height > MAX_CANVAS_EDGE {
            return Err(ReelError::validation(format!(
                "canvas {}x{} exceeds the {MAX_CANVAS_EDGE} pixel limit",
                self.width, self.height
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ReelError::validation("font_size must be finite and > 0"));
        }
        self.reference
            .color_scale
            .validate()
            .map_err(|e| ReelError::validation(format!("reference panel: {e}")))?;
        self.slice
            .color_scale
            .validate()
            .map_err(|e| ReelError::validation(format!("slice panel: {e}")))?;
        self.marker.validate()
    }

    /// Read the configured font file, if any.
    pub fn load_font(&self) -> ReelResult<Option<Vec<u8>>> {
        let Some(path) = self.font_path.as_ref() else {
            return Ok(None);
        };
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReelError::NotFound(path.clone()))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read font '{}'", path.display()))
                .into()),
        }
    }
}

/// Per-panel appearance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelStyle {
    /// Declarative display bounds; data outside is clipped.
    pub color_scale: ColorScale,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default)]
    pub colorbar_label: String,
}

impl PanelStyle {
    /// Title with `{index}` replaced by the frame index.
    pub fn title_for(&self, index: FrameIndex) -> String {
        self.title.replace(INDEX_PLACEHOLDER, &index.to_string())
    }
}

/// Dashed vertical line marking the current slice on the reference map.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerStyle {
    /// Straight RGBA8.
    pub color: [u8; 4],
    /// Line width in pixels.
    pub width: f32,
    /// Dash length in pixels. Zero draws a solid line.
    pub dash: f32,
    /// Gap between dashes in pixels.
    pub gap: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            width: 2.0,
            dash: 7.4,
            gap: 3.2,
        }
    }
}

impl MarkerStyle {
    fn validate(&self) -> ReelResult<()> {
        let finite = self.width.is_finite() && self.dash.is_finite() && self.gap.is_finite();
        if !finite || self.width <= 0.0 || self.dash < 0.0 || self.gap < 0.0 {
            return Err(ReelError::validation(
                "marker width must be > 0 and dash/gap must be >= 0",
            ));
        }
        if self.dash > 0.0 && self.gap == 0.0 {
            return Err(ReelError::validation("dashed marker needs a non-zero gap"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
