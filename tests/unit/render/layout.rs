use super::*;

#[test]
fn two_panels_get_equal_side_by_side_cells() {
    let layouts = figure_layout(
        1000,
        400,
        10.0,
        &[(Aspect::Equal, (50, 50)), (Aspect::Auto, (80, 50))],
    )
    .unwrap();
    assert_eq!(layouts.len(), 2);
    assert_eq!(layouts[0].cell, Rect::new(0.0, 0.0, 500.0, 400.0));
    assert_eq!(layouts[1].cell, Rect::new(500.0, 0.0, 1000.0, 400.0));
    assert_eq!(layouts[0].cell.area(), layouts[1].cell.area());

    for l in &layouts {
        assert!(l.image.x0 >= l.cell.x0 && l.colorbar.x1 <= l.cell.x1);
        assert!(l.image.y0 >= 0.0 && l.image.y1 <= 400.0);
        assert!(l.colorbar.x0 > l.image.x1);
        assert_eq!(l.colorbar.y0, l.image.y0);
        assert_eq!(l.colorbar.y1, l.image.y1);
    }
}

#[test]
fn equal_aspect_keeps_square_pixels() {
    let layouts = figure_layout(1200, 600, 12.0, &[(Aspect::Equal, (20, 40))]).unwrap();
    let img = layouts[0].image;
    let ratio = img.width() / img.height();
    assert!((ratio - 2.0).abs() < 0.05, "ratio {ratio}");
}

#[test]
fn auto_aspect_fills_the_available_area() {
    let eq = figure_layout(1200, 600, 12.0, &[(Aspect::Equal, (200, 10))]).unwrap();
    let auto = figure_layout(1200, 600, 12.0, &[(Aspect::Auto, (200, 10))]).unwrap();
    assert!(auto[0].image.width() > eq[0].image.width());
    assert_eq!(auto[0].image.height(), eq[0].image.height());
}

#[test]
fn rects_are_pixel_aligned() {
    let layouts = figure_layout(777, 333, 11.0, &[(Aspect::Equal, (7, 13)), (Aspect::Auto, (5, 3))])
        .unwrap();
    for l in layouts {
        for v in [l.image.x0, l.image.y0, l.image.x1, l.image.y1] {
            assert_eq!(v, v.round());
        }
    }
}

#[test]
fn tiny_canvas_and_empty_figure_are_render_errors() {
    assert!(matches!(
        figure_layout(40, 40, 14.0, &[(Aspect::Auto, (3, 3))]),
        Err(ReelError::Render(_))
    ));
    assert!(matches!(
        figure_layout(400, 400, 14.0, &[]),
        Err(ReelError::Render(_))
    ));
}
