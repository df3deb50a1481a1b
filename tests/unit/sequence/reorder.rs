use super::*;

fn drain<T>(buf: &mut ReorderBuffer<T>) -> Vec<(u64, T)> {
    std::iter::from_fn(|| buf.pop_ready())
        .map(|(i, t)| (i.0, t))
        .collect()
}

#[test]
fn releases_in_index_order_regardless_of_arrival() {
    let mut buf = ReorderBuffer::new(0, 4);
    buf.insert(FrameIndex(2), "c").unwrap();
    buf.insert(FrameIndex(1), "b").unwrap();
    assert!(drain(&mut buf).is_empty());
    assert_eq!(buf.pending_len(), 2);

    buf.insert(FrameIndex(0), "a").unwrap();
    assert_eq!(drain(&mut buf), vec![(0, "a"), (1, "b"), (2, "c")]);
    assert_eq!(buf.next_index(), FrameIndex(3));
    assert!(!buf.is_complete());

    buf.insert(FrameIndex(3), "d").unwrap();
    assert_eq!(drain(&mut buf), vec![(3, "d")]);
    assert!(buf.is_complete());
    buf.finish().unwrap();
}

#[test]
fn duplicates_are_rejected_before_and_after_release() {
    let mut buf = ReorderBuffer::new(0, 3);
    buf.insert(FrameIndex(1), 1).unwrap();
    assert!(matches!(
        buf.insert(FrameIndex(1), 1),
        Err(ReelError::DuplicateFrame { index: 1 })
    ));

    buf.insert(FrameIndex(0), 0).unwrap();
    drain(&mut buf);
    assert!(matches!(
        buf.insert(FrameIndex(0), 0),
        Err(ReelError::DuplicateFrame { index: 0 })
    ));
}

#[test]
fn out_of_range_and_gaps_are_reported() {
    let mut buf = ReorderBuffer::new(0, 3);
    assert!(matches!(
        buf.insert(FrameIndex(3), ()),
        Err(ReelError::IndexOutOfRange { index: 3, len: 3 })
    ));

    buf.insert(FrameIndex(0), ()).unwrap();
    buf.insert(FrameIndex(2), ()).unwrap();
    drain(&mut buf);
    assert!(matches!(buf.finish(), Err(ReelError::MissingFrame { index: 1 })));
}
