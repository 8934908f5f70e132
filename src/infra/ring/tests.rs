//! Byte ring tests: ordering across wrap-around, overflow, flush.
use super::*;

fn drain<const N: usize>(ring: &mut ByteRing<N>) -> ([u8; 64], usize) {
    let mut out = [0u8; 64];
    let mut total = 0;
    while let Some(byte) = ring.read_byte() {
        out[total] = byte;
        total += 1;
    }
    (out, total)
}

#[test]
/// Concatenated reads return the concatenated writes, in order.
fn test_fifo_ordering_across_writes() {
    let mut ring = ByteRing::<16>::new();
    assert_eq!(ring.write(&[1, 2, 3]), 3);
    assert_eq!(ring.write(&[4, 5]), 2);
    assert_eq!(ring.write(&[6, 7, 8, 9]), 4);
    assert_eq!(ring.available(), 9);

    let mut first = [0u8; 4];
    assert_eq!(ring.read(&mut first), 4);
    assert_eq!(first, [1, 2, 3, 4]);

    let (rest, len) = drain(&mut ring);
    assert_eq!(&rest[..len], &[5, 6, 7, 8, 9]);
    assert!(ring.is_empty());
}

#[test]
/// Writes and reads stay ordered when the storage wraps around.
fn test_wrap_around() {
    let mut ring = ByteRing::<8>::new();
    ring.write(&[0, 1, 2, 3, 4, 5]);
    let mut sink = [0u8; 5];
    ring.read(&mut sink);

    // head = 5, one byte left; this write wraps past the end.
    assert_eq!(ring.write(&[6, 7, 8, 9, 10, 11]), 6);
    assert_eq!(ring.available(), 7);

    let mut out = [0u8; 7];
    assert_eq!(ring.read(&mut out), 7);
    assert_eq!(out, [5, 6, 7, 8, 9, 10, 11]);
}

#[test]
/// Overflow drops the newest bytes and never exceeds capacity.
fn test_overflow_drops_newest() {
    let mut ring = ByteRing::<4>::new();
    assert_eq!(ring.write(&[1, 2, 3]), 3);
    assert_eq!(ring.write(&[4, 5, 6]), 1);
    assert_eq!(ring.available(), 4);
    assert_eq!(ring.write(&[7]), 0);
    assert_eq!(ring.available(), ring.capacity());

    let (out, len) = drain(&mut ring);
    assert_eq!(&out[..len], &[1, 2, 3, 4]);
}

#[test]
/// Reading more than available only returns what is buffered.
fn test_read_is_bounded_by_available() {
    let mut ring = ByteRing::<8>::new();
    ring.write(&[9, 8]);
    let mut out = [0u8; 6];
    assert_eq!(ring.read(&mut out), 2);
    assert_eq!(&out[..2], &[9, 8]);
    assert_eq!(ring.read_byte(), None);
}

#[test]
/// Flush discards everything and the ring is reusable.
fn test_flush() {
    let mut ring = ByteRing::<8>::new();
    ring.write(&[1, 2, 3, 4, 5]);
    ring.flush();
    assert_eq!(ring.available(), 0);
    assert_eq!(ring.free(), 8);

    ring.write(&[42]);
    assert_eq!(ring.read_byte(), Some(42));
}
