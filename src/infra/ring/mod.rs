//! Bounded circular byte buffer accumulating raw datagram bytes until the
//! packet decoder consumes them.
//!
//! Overflow policy: drop newest. A write that does not fit stores the prefix
//! that fits and discards the rest; bytes already buffered are never
//! overwritten. There is no backpressure towards the producer, the caller only
//! learns how many bytes were accepted.

/// Fixed-capacity byte ring owning its storage.
#[derive(Debug, Clone)]
pub struct ByteRing<const N: usize> {
    buffer: [u8; N],
    /// Index of the oldest unread byte.
    head: usize,
    /// Number of unread bytes.
    len: usize,
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty ring.
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Total number of bytes the ring can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of unread bytes.
    #[inline]
    pub fn available(&self) -> usize {
        self.len
    }

    /// Remaining free space.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `data`, returning how many bytes were stored.
    ///
    /// Bytes beyond the free space are dropped.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        if accepted == 0 {
            return 0;
        }

        let tail = (self.head + self.len) % N;
        // Copy in at most two runs: up to the end of storage, then from index 0.
        let first = accepted.min(N - tail);
        self.buffer[tail..tail + first].copy_from_slice(&data[..first]);
        let second = accepted - first;
        if second > 0 {
            self.buffer[..second].copy_from_slice(&data[first..accepted]);
        }

        self.len += accepted;
        accepted
    }

    /// Consume up to `out.len()` bytes in FIFO order, returning the count copied.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        if count == 0 {
            return 0;
        }

        let first = count.min(N - self.head);
        out[..first].copy_from_slice(&self.buffer[self.head..self.head + first]);
        let second = count - first;
        if second > 0 {
            out[first..count].copy_from_slice(&self.buffer[..second]);
        }

        self.head = (self.head + count) % N;
        self.len -= count;
        count
    }

    /// Consume a single byte.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let byte = self.buffer[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Discard every buffered byte.
    pub fn flush(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
