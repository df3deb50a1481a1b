//! Pixel geometry for a 1xN figure of heatmap panels.
//!
//! Geometry depends only on the canvas, the font size and each panel's data shape, never on
//! whether text can be drawn, so frames of one run always line up.

use kurbo::Rect;

use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::Aspect;

/// Regions of one panel cell. All rectangles are snapped to whole pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelLayout {
    /// The whole cell assigned to the panel.
    pub cell: Rect,
    /// Heatmap area.
    pub image: Rect,
    /// Colorbar strip, same height as `image`.
    pub colorbar: Rect,
}

/// Band sizes derived from the font size.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Bands {
    pub(crate) top: f64,
    pub(crate) bottom: f64,
    pub(crate) left: f64,
    pub(crate) colorbar_gap: f64,
    pub(crate) colorbar_width: f64,
    pub(crate) right: f64,
    pub(crate) tick_len: f64,
}

impl Bands {
    pub(crate) fn for_font(font_size: f32) -> Self {
        let f = f64::from(font_size.max(1.0));
        Self {
            top: (f * 2.6).ceil(),
            bottom: (f * 3.6).ceil(),
            left: (f * 5.4).ceil(),
            colorbar_gap: (f * 1.2).ceil(),
            colorbar_width: (f * 1.4).ceil().max(8.0),
            right: (f * 5.0).ceil(),
            tick_len: (f * 0.4).ceil().max(3.0),
        }
    }
}

/// Split `width x height` into equal cells and place each panel's image and colorbar.
///
/// `shapes` holds `(rows, cols)` of each panel's data.
pub fn figure_layout(
    width: u32,
    height: u32,
    font_size: f32,
    panels: &[(Aspect, (usize, usize))],
) -> ReelResult<Vec<PanelLayout>> {
    if panels.is_empty() {
        return Err(ReelError::render("figure has no panels"));
    }
    let bands = Bands::for_font(font_size);
    let n = panels.len() as f64;
    let cell_w = f64::from(width) / n;

    let mut out = Vec::with_capacity(panels.len());
    for (i, &(aspect, (rows, cols))) in panels.iter().enumerate() {
        if rows == 0 || cols == 0 {
            return Err(ReelError::render(format!("panel {i} has empty data")));
        }
        let cell = Rect::new(
            (i as f64 * cell_w).round(),
            0.0,
            ((i + 1) as f64 * cell_w).round(),
            f64::from(height),
        );

        let avail = Rect::new(
            cell.x0 + bands.left,
            cell.y0 + bands.top,
            cell.x1 - bands.colorbar_gap - bands.colorbar_width - bands.right,
            cell.y1 - bands.bottom,
        );
        if avail.width() < 1.0 || avail.height() < 1.0 {
            return Err(ReelError::render(format!(
                "canvas {width}x{height} is too small for {} panel(s) at font size {font_size}",
                panels.len()
            )));
        }

        let image = match aspect {
            Aspect::Auto => avail,
            Aspect::Equal => fit_equal(avail, rows as f64, cols as f64),
        };
        let image = snap(image);
        let cb_x0 = image.x1 + bands.colorbar_gap;
        let colorbar = snap(Rect::new(
            cb_x0,
            image.y0,
            cb_x0 + bands.colorbar_width,
            image.y1,
        ));

        out.push(PanelLayout {
            cell,
            image,
            colorbar,
        });
    }
    Ok(out)
}

fn fit_equal(avail: Rect, rows: f64, cols: f64) -> Rect {
    let scale = (avail.width() / cols).min(avail.height() / rows);
    let w = (cols * scale).max(1.0);
    let h = (rows * scale).max(1.0);
    let x0 = avail.x0 + (avail.width() - w) / 2.0;
    let y0 = avail.y0 + (avail.height() - h) / 2.0;
    Rect::new(x0, y0, x0 + w, y0 + h)
}

fn snap(r: Rect) -> Rect {
    let x0 = r.x0.round();
    let y0 = r.y0.round();
    Rect::new(x0, y0, r.x1.round().max(x0 + 1.0), r.y1.round().max(y0 + 1.0))
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
