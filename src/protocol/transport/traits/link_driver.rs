//! Capability set binding the packet protocol to a concrete byte source and sink.

/// Byte-oriented driver used by the packet decoder (pull side) and the packet
/// builder (push side).
///
/// Implemented once per transport; `read` is only called after `available`
/// reported data and never blocks.
pub trait LinkDriver {
    /// Number of inbound bytes ready to be read.
    fn available(&self) -> usize;
    /// Drop every buffered inbound byte.
    fn flush(&mut self);
    /// Consume the next inbound byte.
    fn read(&mut self) -> Option<u8>;
    /// Emit one encoded packet in a single call; returns the bytes accepted.
    fn write(&mut self, data: &[u8]) -> usize;
}
