use super::*;
use crate::cube::reduce::reduce;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::CpuBackend;
use ndarray::Array3;

fn small_display() -> DisplayConfig {
    DisplayConfig {
        width: 480,
        height: 200,
        font_size: 8.0,
        ..DisplayConfig::default()
    }
}

fn ramp_cube() -> Cube {
    Cube::from_array(Array3::from_shape_fn((4, 5, 3), |(v, y, x)| {
        (v + 2 * y + 3 * x) as f32
    }))
    .unwrap()
}

#[test]
fn figure_pairs_reference_and_pv_cut() {
    let cube = ramp_cube();
    let reference = reduce(cube.view_dyn()).unwrap();
    let coords = CoordinateMap::default();
    let display = small_display();

    let fig = slice_figure(&cube, &reference, &coords, FrameIndex(1), &display).unwrap();
    assert_eq!(fig.panels.len(), 2);
    assert_eq!(fig.panels[0].data.dim(), (5, 3));
    assert_eq!(fig.panels[0].marker_column, Some(1));
    assert_eq!(fig.panels[0].aspect, Aspect::Equal);
    assert_eq!(fig.panels[1].data.dim(), (4, 5));
    assert_eq!(fig.panels[1].data[[2, 3]], (2 + 2 * 3 + 3) as f32);
    assert_eq!(fig.panels[1].aspect, Aspect::Auto);
    assert_eq!(fig.panels[1].title, "PV Diagram - Vertical Cut 1");
    assert_eq!(fig.panels[0].color_scale, display.reference.color_scale);
    assert_eq!(fig.panels[1].color_scale, display.slice.color_scale);
}

#[test]
fn out_of_range_index_fails_before_rendering() {
    struct Panicking;
    impl RenderBackend for Panicking {
        fn render(&mut self, _figure: &FigureSpec<'_>) -> ReelResult<FrameRGBA> {
            panic!("backend must not be reached");
        }
    }

    let cube = ramp_cube();
    let reference = reduce(cube.view_dyn()).unwrap();
    let err = render_slice(
        &cube,
        &reference,
        &CoordinateMap::default(),
        FrameIndex(3),
        &small_display(),
        &mut Panicking,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::IndexOutOfRange { index: 3, len: 3 }));
}

#[test]
fn mismatched_reference_map_is_a_shape_error() {
    let cube = ramp_cube();
    let wrong = ReferenceMap::zeros((3, 5));
    assert!(matches!(
        slice_figure(
            &cube,
            &wrong,
            &CoordinateMap::default(),
            FrameIndex(0),
            &small_display()
        ),
        Err(ReelError::Shape(_))
    ));
}

#[test]
fn backend_errors_propagate() {
    struct Failing;
    impl RenderBackend for Failing {
        fn render(&mut self, _figure: &FigureSpec<'_>) -> ReelResult<FrameRGBA> {
            Err(ReelError::render("out of ink"))
        }
    }
    let cube = ramp_cube();
    let reference = reduce(cube.view_dyn()).unwrap();
    let err = render_slice(
        &cube,
        &reference,
        &CoordinateMap::default(),
        FrameIndex(0),
        &small_display(),
        &mut Failing,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Render(ref m) if m == "out of ink"));
}

#[test]
fn every_frame_of_a_run_has_the_same_geometry() {
    let cube = ramp_cube();
    let reference = reduce(cube.view_dyn()).unwrap();
    let coords = CoordinateMap::default();
    let display = small_display();
    let mut backend = CpuBackend::default();

    let frames: Vec<_> = (0..cube.slice_count())
        .map(|i| {
            render_slice(&cube, &reference, &coords, FrameIndex(i), &display, &mut backend)
                .unwrap()
        })
        .collect();
    for (i, f) in frames.iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
        assert_eq!(f.image.dimensions(), (480, 200));
    }
    assert_ne!(frames[0].image.data, frames[1].image.data);
}
