use ov_ring::Ring;

#[test]
fn jitter_like_usage_keeps_three_newest_frames() {
    let mut ring: Ring<u32> = Ring::new(3);
    for seq in 0..10u32 {
        ring.insert(seq);
    }
    let mut drained = Vec::new();
    while let Some(seq) = ring.pop() {
        drained.push(seq);
    }
    assert_eq!(drained, vec![7, 8, 9]);
    assert_eq!(ring.stats().inserted, 10);
    assert_eq!(ring.stats().dropped, 7);
}

#[test]
fn capacity_zero_rounds_up_to_one() {
    let mut ring: Ring<u8> = Ring::new(0);
    assert_eq!(ring.capacity(), 1);
    assert!(ring.insert(1).is_none());
    assert_eq!(ring.insert(2), Some(1));
}
