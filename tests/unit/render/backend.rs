use super::*;

#[test]
fn from_premul_checks_buffer_length() {
    assert!(FrameRGBA::from_premul(2, 2, vec![0; 16]).is_ok());
    assert!(matches!(
        FrameRGBA::from_premul(2, 2, vec![0; 15]),
        Err(ReelError::Render(_))
    ));
}

#[test]
fn pixel_reads_row_major_top_first() {
    let mut data = vec![0u8; 3 * 2 * 4];
    let i = (1 * 3 + 2) * 4;
    data[i..i + 4].copy_from_slice(&[1, 2, 3, 255]);
    let frame = FrameRGBA::from_premul(3, 2, data).unwrap();
    assert_eq!(frame.dimensions(), (3, 2));
    assert_eq!(frame.pixel(2, 1), Some([1, 2, 3, 255]));
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(3, 0), None);
}

#[test]
fn default_backend_has_no_worker_opts() {
    struct Fixed;
    impl RenderBackend for Fixed {
        fn render(&mut self, figure: &FigureSpec<'_>) -> ReelResult<FrameRGBA> {
            FrameRGBA::from_premul(
                figure.width,
                figure.height,
                vec![0; (figure.width * figure.height * 4) as usize],
            )
        }
    }
    assert!(Fixed.worker_opts().is_none());
}
