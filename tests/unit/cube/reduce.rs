use super::*;
use ndarray::{Array, Array3, ArrayD, IxDyn};

#[test]
fn cube_of_ones_sums_to_spectral_length() {
    let cube = Array3::<f32>::ones((7, 4, 6)).into_dyn();
    let map = reduce(cube.view()).unwrap();
    assert_eq!(map.dim(), (4, 6));
    assert!(map.iter().all(|&v| v == 7.0));
}

#[test]
fn sum_matches_per_cell_spectral_sum() {
    let cube = Array::from_shape_fn((4, 5, 3), |(v, y, x)| (v * 15 + y * 3 + x) as f32);
    let map = reduce(cube.view().into_dyn()).unwrap();
    assert_eq!(map.dim(), (5, 3));
    for y in 0..5 {
        for x in 0..3 {
            let expected: f32 = (0..4).map(|v| cube[[v, y, x]]).sum();
            assert_eq!(map[[y, x]], expected);
        }
    }
}

#[test]
fn fewer_than_three_dimensions_is_a_shape_error() {
    let flat = ArrayD::<f32>::zeros(IxDyn(&[5, 3]));
    assert!(matches!(reduce(flat.view()), Err(ReelError::Shape(_))));

    let line = ArrayD::<f32>::zeros(IxDyn(&[5]));
    assert!(matches!(reduce(line.view()), Err(ReelError::Shape(_))));
}

#[test]
fn zero_spectral_channels_is_a_shape_error() {
    let cube = ArrayD::<f32>::zeros(IxDyn(&[0, 2, 2]));
    assert!(matches!(reduce(cube.view()), Err(ReelError::Shape(_))));
}

#[test]
fn nan_propagates_through_the_sum() {
    let mut cube = Array3::<f32>::ones((3, 2, 2));
    cube[[1, 0, 1]] = f32::NAN;
    let map = reduce(cube.view().into_dyn()).unwrap();
    assert!(map[[0, 1]].is_nan());
    assert_eq!(map[[1, 1]], 3.0);
}

#[test]
fn reduction_is_idempotent() {
    let cube = Array::from_shape_fn((3, 4, 5), |(v, y, x)| ((v + 1) * (y + 2) * (x + 3)) as f32);
    let a = reduce(cube.view().into_dyn()).unwrap();
    let b = reduce(cube.view().into_dyn()).unwrap();
    assert_eq!(a, b);
}
