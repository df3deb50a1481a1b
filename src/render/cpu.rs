use std::f64::consts::FRAC_PI_2;

use ndarray::ArrayView2;

use crate::cube::model::AxisWcs;
use crate::foundation::core::ColorScale;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{CpuBackendOpts, FigureSpec, FrameRGBA, PanelSpec, RenderBackend};
use crate::render::colormap::Colormap;
use crate::render::layout::{Bands, PanelLayout, figure_layout};
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};

const MAX_TICKS: usize = 5;
const COLORBAR_TICKS: usize = 5;
const TEXT_PAD: f64 = 2.0;

/// CPU rasterizer built on `vello_cpu`.
///
/// Heatmaps and colorbars are written straight into the pixmap (nearest-neighbour, no
/// resampling seams); outlines, ticks, the slice marker and text go through a
/// `vello_cpu::RenderContext` composited on top.
pub struct CpuBackend {
    opts: CpuBackendOpts,
    text: Option<TextLayoutEngine>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self {
            opts: CpuBackendOpts::default(),
            text: None,
            ctx: None,
        }
    }
}

impl CpuBackend {
    /// Build a backend; fails only if the configured font cannot be registered.
    pub fn new(opts: CpuBackendOpts) -> ReelResult<Self> {
        let text = match opts.font.as_deref() {
            Some(bytes) => Some(TextLayoutEngine::new(bytes)?),
            None => None,
        };
        Ok(Self {
            opts,
            text,
            ctx: None,
        })
    }

    /// Whether titles and labels are drawn.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    fn take_ctx(&mut self, width: u16, height: u16) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx
    }

    fn draw_panel_vectors(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        figure: &FigureSpec<'_>,
        panel: &PanelSpec<'_>,
        layout: &PanelLayout,
    ) -> ReelResult<()> {
        let bands = Bands::for_font(figure.font_size);
        let img = layout.image;
        let cb = layout.colorbar;
        let (rows, cols) = panel.data.dim();
        let fg = figure.foreground;

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color(fg));
        outline(ctx, img);
        outline(ctx, cb);

        let x_ticks = tick_indices(cols, MAX_TICKS);
        let y_ticks = tick_indices(rows, MAX_TICKS);
        for &c in &x_ticks {
            let x = column_center(img, cols, c);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x - 0.5,
                img.y1,
                x + 0.5,
                img.y1 + bands.tick_len,
            ));
        }
        for &r in &y_ticks {
            let y = row_center(img, rows, r);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                img.x0 - bands.tick_len,
                y - 0.5,
                img.x0,
                y + 0.5,
            ));
        }
        let cb_values = colorbar_values(panel.color_scale);
        for (k, _) in cb_values.iter().enumerate() {
            let y = colorbar_tick_y(cb, k);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                cb.x1,
                y - 0.5,
                cb.x1 + bands.tick_len,
                y + 0.5,
            ));
        }

        if let Some(col) = panel.marker_column {
            if col >= cols {
                return Err(ReelError::render(format!(
                    "marker column {col} outside panel with {cols} columns"
                )));
            }
            let m = figure.marker;
            ctx.set_paint(color(m.color));
            let x = column_center(img, cols, col);
            let half = f64::from(m.width) / 2.0;
            if m.dash <= 0.0 {
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    x - half,
                    img.y0,
                    x + half,
                    img.y1,
                ));
            } else {
                let dash = f64::from(m.dash);
                let step = dash + f64::from(m.gap);
                let mut y = img.y1;
                while y > img.y0 {
                    let top = (y - dash).max(img.y0);
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x - half, top, x + half, y));
                    y -= step;
                }
            }
        }

        let Some(engine) = self.text.as_mut() else {
            return Ok(());
        };
        let brush = TextBrushRgba8::from(fg);
        let base = figure.font_size;
        let small = base * 0.85;

        if !panel.title.is_empty() {
            let layout_t = engine.layout_line(&panel.title, base * 1.2, brush)?;
            let (w, h) = layout_size(&layout_t);
            let x = (img.x0 + img.x1) / 2.0 - w / 2.0;
            let y = layout.cell.y0 + ((bands.top - h) / 2.0).max(0.0);
            draw_layout(ctx, engine.font(), &layout_t, translate(x, y));
        }

        let label_top = img.y1 + bands.tick_len + TEXT_PAD;
        let mut tick_label_h = 0.0f64;
        for &c in &x_ticks {
            let text = tick_label(panel.x_axis, c);
            let l = engine.layout_line(&text, small, brush)?;
            let (w, h) = layout_size(&l);
            tick_label_h = tick_label_h.max(h);
            let x = column_center(img, cols, c) - w / 2.0;
            draw_layout(ctx, engine.font(), &l, translate(x, label_top));
        }
        for &r in &y_ticks {
            let text = tick_label(panel.y_axis, r);
            let l = engine.layout_line(&text, small, brush)?;
            let (w, h) = layout_size(&l);
            let x = img.x0 - bands.tick_len - TEXT_PAD - w;
            let y = row_center(img, rows, r) - h / 2.0;
            draw_layout(ctx, engine.font(), &l, translate(x, y));
        }
        for (k, v) in cb_values.iter().enumerate() {
            let l = engine.layout_line(&format_scale_value(*v), small, brush)?;
            let (_, h) = layout_size(&l);
            let x = cb.x1 + bands.tick_len + TEXT_PAD;
            let y = colorbar_tick_y(cb, k) - h / 2.0;
            draw_layout(ctx, engine.font(), &l, translate(x, y));
        }

        if !panel.x_label.is_empty() {
            let l = engine.layout_line(&axis_label(&panel.x_label, panel.x_axis), base, brush)?;
            let (w, _) = layout_size(&l);
            let x = (img.x0 + img.x1) / 2.0 - w / 2.0;
            let y = label_top + tick_label_h + TEXT_PAD;
            draw_layout(ctx, engine.font(), &l, translate(x, y));
        }
        if !panel.y_label.is_empty() {
            let l = engine.layout_line(&axis_label(&panel.y_label, panel.y_axis), base, brush)?;
            let (w, _) = layout_size(&l);
            let x = layout.cell.x0 + TEXT_PAD;
            let y = (img.y0 + img.y1) / 2.0 + w / 2.0;
            draw_layout(ctx, engine.font(), &l, translate(x, y) * rotate_up());
        }
        if !panel.colorbar_label.is_empty() {
            let l = engine.layout_line(&panel.colorbar_label, base, brush)?;
            let (w, h) = layout_size(&l);
            let x = layout.cell.x1 - h - TEXT_PAD;
            let y = (cb.y0 + cb.y1) / 2.0 + w / 2.0;
            draw_layout(ctx, engine.font(), &l, translate(x, y) * rotate_up());
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    fn render(&mut self, figure: &FigureSpec<'_>) -> ReelResult<FrameRGBA> {
        let width = u16::try_from(figure.width)
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(|| ReelError::render(format!("invalid frame width {}", figure.width)))?;
        let height = u16::try_from(figure.height)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| ReelError::render(format!("invalid frame height {}", figure.height)))?;

        let shapes: Vec<_> = figure
            .panels
            .iter()
            .map(|p| (p.aspect, p.data.dim()))
            .collect();
        let layouts = figure_layout(figure.width, figure.height, figure.font_size, &shapes)?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        let bg = premul_rgba8(figure.background);
        clear_pixmap(&mut pixmap, bg);

        let stride = usize::from(width);
        for (panel, layout) in figure.panels.iter().zip(&layouts) {
            let buf = pixmap.data_as_u8_slice_mut();
            blit_heatmap(
                buf,
                stride,
                layout.image,
                panel.data,
                panel.color_scale,
                panel.colormap,
                bg,
            );
            blit_colorbar(buf, stride, layout.colorbar, panel.colormap);
        }

        // `vello_cpu` renders into a fresh buffer, so vectors go to a transparent overlay that
        // is composited over the rasters afterwards.
        let mut ctx = self.take_ctx(width, height);
        let mut drawn = Ok(());
        for (panel, layout) in figure.panels.iter().zip(&layouts) {
            drawn = self.draw_panel_vectors(&mut ctx, figure, panel, layout);
            if drawn.is_err() {
                break;
            }
        }
        if drawn.is_ok() {
            let mut overlay = vello_cpu::Pixmap::new(width, height);
            overlay.data_as_u8_slice_mut().fill(0);
            ctx.flush();
            ctx.render_to_pixmap(&mut overlay);
            drawn = premul_over_in_place(pixmap.data_as_u8_slice_mut(), overlay.data_as_u8_slice());
        }
        self.ctx = Some(ctx);
        drawn?;

        FrameRGBA::from_premul(
            figure.width,
            figure.height,
            pixmap.data_as_u8_slice().to_vec(),
        )
    }

    fn worker_opts(&self) -> Option<CpuBackendOpts> {
        Some(self.opts.clone())
    }
}

fn blit_heatmap(
    buf: &mut [u8],
    stride: usize,
    rect: kurbo::Rect,
    data: ArrayView2<'_, f32>,
    scale: ColorScale,
    cmap: Colormap,
    nan_rgba: [u8; 4],
) {
    let lut = cmap.lut();
    let (rows, cols) = data.dim();
    let (x0, y0, w, h) = pixel_bounds(rect);
    if rows == 0 || cols == 0 {
        return;
    }
    let canvas_h = buf.len() / 4 / stride.max(1);

    for py in 0..h {
        let y = y0 + py;
        if y >= canvas_h {
            break;
        }
        // Lower-left origin: the top screen row shows the last data row.
        let r = rows - 1 - ((py * rows) / h).min(rows - 1);
        for px in 0..w {
            let x = x0 + px;
            if x >= stride {
                break;
            }
            let c = ((px * cols) / w).min(cols - 1);
            let v = data[[r, c]];
            let rgba = if v.is_nan() {
                nan_rgba
            } else {
                let t = scale.normalize(v);
                let [r8, g8, b8] = lut[(t * 255.0).round() as usize];
                [r8, g8, b8, 255]
            };
            let i = (y * stride + x) * 4;
            buf[i..i + 4].copy_from_slice(&rgba);
        }
    }
}

fn blit_colorbar(buf: &mut [u8], stride: usize, rect: kurbo::Rect, cmap: Colormap) {
    let (x0, y0, w, h) = pixel_bounds(rect);
    let canvas_h = buf.len() / 4 / stride.max(1);
    for py in 0..h {
        let y = y0 + py;
        if y >= canvas_h {
            break;
        }
        let t = 1.0 - (py as f32 + 0.5) / h as f32;
        let [r, g, b] = cmap.sample(t);
        for px in 0..w {
            let x = x0 + px;
            if x >= stride {
                break;
            }
            let i = (y * stride + x) * 4;
            buf[i..i + 4].copy_from_slice(&[r, g, b, 255]);
        }
    }
}

fn pixel_bounds(rect: kurbo::Rect) -> (usize, usize, usize, usize) {
    let x0 = rect.x0.max(0.0) as usize;
    let y0 = rect.y0.max(0.0) as usize;
    let w = (rect.x1 - rect.x0).max(0.0) as usize;
    let h = (rect.y1 - rect.y0).max(0.0) as usize;
    (x0, y0, w, h)
}

/// Evenly spread data indices for at most `max` ticks.
pub(crate) fn tick_indices(n: usize, max: usize) -> Vec<usize> {
    if n <= max {
        return (0..n).collect();
    }
    let mut out: Vec<usize> = (0..max).map(|k| k * (n - 1) / (max - 1)).collect();
    out.dedup();
    out
}

fn column_center(img: kurbo::Rect, cols: usize, c: usize) -> f64 {
    img.x0 + (c as f64 + 0.5) / cols as f64 * img.width()
}

fn row_center(img: kurbo::Rect, rows: usize, r: usize) -> f64 {
    img.y1 - (r as f64 + 0.5) / rows as f64 * img.height()
}

fn colorbar_values(scale: ColorScale) -> Vec<f32> {
    (0..COLORBAR_TICKS)
        .map(|k| scale.min + (scale.max - scale.min) * k as f32 / (COLORBAR_TICKS - 1) as f32)
        .collect()
}

fn colorbar_tick_y(cb: kurbo::Rect, k: usize) -> f64 {
    cb.y1 - k as f64 / (COLORBAR_TICKS - 1) as f64 * cb.height()
}

fn tick_label(axis: Option<&AxisWcs>, index: usize) -> String {
    match axis {
        Some(a) => a.format_world(a.world(index as f64)),
        None => index.to_string(),
    }
}

fn axis_label(label: &str, axis: Option<&AxisWcs>) -> String {
    match axis.map(AxisWcs::display_unit) {
        Some(unit) if !unit.is_empty() => format!("{label} [{unit}]"),
        _ => label.to_string(),
    }
}

/// Colorbar tick text: integers without decimals, others with two.
pub(crate) fn format_scale_value(v: f32) -> String {
    if (v - v.round()).abs() < 1e-6 && v.abs() < 1e7 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.2}")
    }
}

fn layout_size(layout: &parley::Layout<TextBrushRgba8>) -> (f64, f64) {
    (f64::from(layout.width()), f64::from(layout.height()))
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
    transform: vello_cpu::kurbo::Affine,
) {
    ctx.set_transform(transform);
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn outline(ctx: &mut vello_cpu::RenderContext, r: kurbo::Rect) {
    let edges = [
        (r.x0 - 1.0, r.y0 - 1.0, r.x1 + 1.0, r.y0),
        (r.x0 - 1.0, r.y1, r.x1 + 1.0, r.y1 + 1.0),
        (r.x0 - 1.0, r.y0, r.x0, r.y1),
        (r.x1, r.y0, r.x1 + 1.0, r.y1),
    ];
    for (x0, y0, x1, y1) in edges {
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, y0, x1, y1));
    }
}

fn translate(x: f64, y: f64) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::translate((x.round(), y.round()))
}

fn rotate_up() -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::rotate(-FRAC_PI_2)
}

fn color(rgba: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - sa;
        for c in 0..4 {
            let dc = (u16::from(d[c]) * inv + 127) / 255;
            d[c] = (u16::from(s[c]) + dc).min(255) as u8;
        }
    }
    Ok(())
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
