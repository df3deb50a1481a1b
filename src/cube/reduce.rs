use ndarray::{Array2, ArrayViewD, Axis, Ix2};

use crate::foundation::error::{ReelError, ReelResult};

/// Spectral-axis sum of a cube, shape `(Y, X)`. Computed once per run and shared read-only.
pub type ReferenceMap = Array2<f32>;

/// Collapse a `(V, Y, X)` cube along the spectral axis into its reference map.
///
/// Pure and deterministic: each output cell is the plain sum of the `V` samples at that
/// spatial location, so NaN samples propagate.
#[tracing::instrument(skip(cube), fields(shape = ?cube.shape()))]
pub fn reduce(cube: ArrayViewD<'_, f32>) -> ReelResult<ReferenceMap> {
    if cube.ndim() != 3 {
        return Err(ReelError::shape(format!(
            "reduction expects a 3-D cube (V, Y, X), got {} dimension(s)",
            cube.ndim()
        )));
    }
    if cube.len_of(Axis(0)) == 0 {
        return Err(ReelError::shape(
            "reduction expects at least one spectral channel",
        ));
    }

    cube.sum_axis(Axis(0))
        .into_dimensionality::<Ix2>()
        .map_err(|e| ReelError::shape(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/cube/reduce.rs"]
mod tests;
