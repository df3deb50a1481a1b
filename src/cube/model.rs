use ndarray::{Array3, ArrayD, ArrayView2, ArrayViewD, Axis, Ix3};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};

/// Spectral data cube with fixed axis order `(V, Y, X)`: spectral, declination, right ascension.
///
/// Immutable once constructed. Every extent is at least 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    data: Array3<f32>,
}

impl Cube {
    /// Wrap a dynamic-dimension array, enforcing exactly three non-empty axes.
    pub fn new(data: ArrayD<f32>) -> ReelResult<Self> {
        if data.ndim() != 3 {
            return Err(ReelError::shape(format!(
                "cube must have exactly 3 dimensions (V, Y, X), got {} with shape {:?}",
                data.ndim(),
                data.shape()
            )));
        }
        if data.shape().contains(&0) {
            return Err(ReelError::shape(format!(
                "cube axes must be non-empty, got shape {:?}",
                data.shape()
            )));
        }
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|e| ReelError::shape(e.to_string()))?;
        Ok(Self { data })
    }

    /// Wrap a 3-D array directly.
    pub fn from_array(data: Array3<f32>) -> ReelResult<Self> {
        Self::new(data.into_dyn())
    }

    /// `(V, Y, X)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of spectral channels.
    pub fn spectral_len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Number of frames a run over this cube produces (`X`).
    pub fn slice_count(&self) -> u64 {
        self.data.len_of(Axis(2)) as u64
    }

    /// Borrow the underlying array.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Dynamic-dimension view, as consumed by [`crate::reduce`].
    pub fn view_dyn(&self) -> ArrayViewD<'_, f32> {
        self.data.view().into_dyn()
    }

    /// Position-velocity cut `cube[:, :, index]` with shape `(V, Y)`.
    pub fn slice(&self, index: FrameIndex) -> ReelResult<ArrayView2<'_, f32>> {
        let len = self.slice_count();
        if index.0 >= len {
            return Err(ReelError::IndexOutOfRange {
                index: index.0,
                len,
            });
        }
        Ok(self.data.index_axis(Axis(2), index.as_usize()))
    }
}

/// Linear world-coordinate description of one cube axis.
///
/// `world(p) = crval + cdelt * (p + 1 - crpix)` for a 0-based pixel `p`, following the
/// 1-based FITS reference pixel convention.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisWcs {
    /// Axis type, e.g. `RA---TAN`, `DEC--TAN`, `VRAD`.
    pub ctype: String,
    /// Unit string, e.g. `deg`, `m/s`.
    pub cunit: String,
    /// 1-based reference pixel.
    pub crpix: f64,
    /// World value at the reference pixel.
    pub crval: f64,
    /// World increment per pixel.
    pub cdelt: f64,
}

impl AxisWcs {
    /// Identity mapping (world value equals the 1-based pixel number).
    pub fn pixel(name: impl Into<String>) -> Self {
        Self {
            ctype: name.into(),
            cunit: String::new(),
            crpix: 1.0,
            crval: 0.0,
            cdelt: 1.0,
        }
    }

    /// World coordinate at a (possibly fractional) 0-based pixel position.
    pub fn world(&self, pixel: f64) -> f64 {
        self.crval + self.cdelt * (pixel + 1.0 - self.crpix)
    }

    /// Short tick label for a world value, scaled to a readable unit.
    pub fn format_world(&self, world: f64) -> String {
        match self.cunit.trim() {
            "m/s" | "M/S" => format!("{:.1}", world / 1000.0),
            "deg" | "DEG" | "" if self.is_celestial() => format!("{world:.3}"),
            _ => format!("{world:.2}"),
        }
    }

    /// Unit shown next to an axis label.
    pub fn display_unit(&self) -> &str {
        match self.cunit.trim() {
            "m/s" | "M/S" => "km/s",
            u => u,
        }
    }

    fn is_celestial(&self) -> bool {
        let t = self.ctype.to_ascii_uppercase();
        t.starts_with("RA") || t.starts_with("DEC") || t.starts_with("GLON") || t.starts_with("GLAT")
    }
}

/// Pixel-to-world mapping for a cube, one axis per cube dimension in `(V, Y, X)` order.
///
/// Consumed only for axis labelling; never mutated by the pipeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CoordinateMap {
    /// Spectral axis (FITS axis 3).
    pub spectral: AxisWcs,
    /// First spatial axis, declination (FITS axis 2).
    pub y: AxisWcs,
    /// Second spatial axis, right ascension (FITS axis 1).
    pub x: AxisWcs,
}

impl Default for CoordinateMap {
    fn default() -> Self {
        Self {
            spectral: AxisWcs::pixel("CHANNEL"),
            y: AxisWcs::pixel("PIXEL-Y"),
            x: AxisWcs::pixel("PIXEL-X"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cube/model.rs"]
mod tests;
