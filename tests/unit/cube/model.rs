use super::*;
use ndarray::{Array, IxDyn};

fn ramp(v: usize, y: usize, x: usize) -> Cube {
    let data = Array::from_shape_fn((v, y, x), |(k, j, i)| (k * 100 + j * 10 + i) as f32);
    Cube::from_array(data).unwrap()
}

#[test]
fn new_rejects_wrong_dimensionality() {
    let two_d = ArrayD::<f32>::zeros(IxDyn(&[4, 5]));
    assert!(matches!(Cube::new(two_d), Err(ReelError::Shape(_))));

    let four_d = ArrayD::<f32>::zeros(IxDyn(&[1, 4, 5, 3]));
    assert!(matches!(Cube::new(four_d), Err(ReelError::Shape(_))));
}

#[test]
fn new_rejects_empty_axes() {
    let empty = ArrayD::<f32>::zeros(IxDyn(&[4, 0, 3]));
    assert!(matches!(Cube::new(empty), Err(ReelError::Shape(_))));
}

#[test]
fn slice_extracts_last_axis_cut() {
    let cube = ramp(4, 5, 3);
    assert_eq!(cube.shape(), (4, 5, 3));
    assert_eq!(cube.slice_count(), 3);

    let s = cube.slice(FrameIndex(2)).unwrap();
    assert_eq!(s.dim(), (4, 5));
    assert_eq!(s[[0, 0]], 2.0);
    assert_eq!(s[[3, 4]], 342.0);
}

#[test]
fn slice_out_of_range_is_reported() {
    let cube = ramp(2, 2, 3);
    match cube.slice(FrameIndex(3)) {
        Err(ReelError::IndexOutOfRange { index, len }) => {
            assert_eq!(index, 3);
            assert_eq!(len, 3);
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn axis_world_uses_one_based_reference_pixel() {
    let axis = AxisWcs {
        ctype: "RA---TAN".to_string(),
        cunit: "deg".to_string(),
        crpix: 3.0,
        crval: 348.0,
        cdelt: -0.5,
    };
    // Pixel 2 (0-based) is the reference pixel.
    assert_eq!(axis.world(2.0), 348.0);
    assert_eq!(axis.world(0.0), 349.0);
    assert_eq!(axis.format_world(348.0), "348.000");
}

#[test]
fn velocity_axis_displays_km_per_s() {
    let axis = AxisWcs {
        ctype: "VRAD".to_string(),
        cunit: "m/s".to_string(),
        crpix: 1.0,
        crval: -60000.0,
        cdelt: 500.0,
    };
    assert_eq!(axis.display_unit(), "km/s");
    assert_eq!(axis.format_world(axis.world(0.0)), "-60.0");
}

#[test]
fn default_coordinate_map_is_pixel_identity() {
    let map = CoordinateMap::default();
    assert_eq!(map.x.world(0.0), 1.0);
    assert_eq!(map.y.world(4.0), 5.0);
}
