use ndarray::ArrayView2;

use crate::config::DisplayConfig;
use crate::cube::model::{CoordinateMap, Cube};
use crate::cube::reduce::ReferenceMap;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{Aspect, FigureSpec, Frame, PanelSpec, RenderBackend};

/// Build the two-panel figure for slice `index`: the reference map with a crosscut marker at
/// column `index`, and the position-velocity cut `cube[:, :, index]`.
pub fn slice_figure<'a>(
    cube: &'a Cube,
    reference: &'a ReferenceMap,
    coords: &'a CoordinateMap,
    index: FrameIndex,
    display: &DisplayConfig,
) -> ReelResult<FigureSpec<'a>> {
    let (_, ny, nx) = cube.shape();
    if reference.dim() != (ny, nx) {
        return Err(ReelError::shape(format!(
            "reference map shape {:?} does not match cube spatial shape ({ny}, {nx})",
            reference.dim()
        )));
    }
    let slice: ArrayView2<'a, f32> = cube.slice(index)?;

    let reference_panel = PanelSpec {
        data: reference.view(),
        color_scale: display.reference.color_scale,
        colormap: display.reference.colormap,
        aspect: Aspect::Equal,
        title: display.reference.title_for(index),
        x_label: display.reference.x_label.clone(),
        y_label: display.reference.y_label.clone(),
        colorbar_label: display.reference.colorbar_label.clone(),
        marker_column: Some(index.as_usize()),
        x_axis: Some(&coords.x),
        y_axis: Some(&coords.y),
    };
    // Slice rows are spectral channels, columns run along declination.
    let slice_panel = PanelSpec {
        data: slice,
        color_scale: display.slice.color_scale,
        colormap: display.slice.colormap,
        aspect: Aspect::Auto,
        title: display.slice.title_for(index),
        x_label: display.slice.x_label.clone(),
        y_label: display.slice.y_label.clone(),
        colorbar_label: display.slice.colorbar_label.clone(),
        marker_column: None,
        x_axis: Some(&coords.y),
        y_axis: Some(&coords.spectral),
    };

    Ok(FigureSpec {
        width: display.width,
        height: display.height,
        background: display.background,
        foreground: display.foreground,
        font_size: display.font_size,
        marker: display.marker,
        panels: vec![reference_panel, slice_panel],
    })
}

/// Render one composite frame.
///
/// Fails with `IndexOutOfRange` before touching the backend when `index >= X`; backend
/// failures propagate unchanged.
#[tracing::instrument(skip_all, fields(index = index.0))]
pub fn render_slice(
    cube: &Cube,
    reference: &ReferenceMap,
    coords: &CoordinateMap,
    index: FrameIndex,
    display: &DisplayConfig,
    backend: &mut dyn RenderBackend,
) -> ReelResult<Frame> {
    let figure = slice_figure(cube, reference, coords, index, display)?;
    let image = backend.render(&figure)?;
    if image.dimensions() != (display.width, display.height) {
        return Err(ReelError::render(format!(
            "backend returned {}x{} for a {}x{} figure",
            image.width, image.height, display.width, display.height
        )));
    }
    tracing::debug!(index = index.0, "rendered frame");
    Ok(Frame { index, image })
}

#[cfg(test)]
#[path = "../../tests/unit/render/slice.rs"]
mod tests;
