//! Consumer side of the tunnel: the CAN-bus-facing layer receiving decoded
//! frames and egress accounting.
use crate::protocol::transport::can_frame::ReceivedFrame;

/// Callbacks invoked from the datagram and tick entry points.
pub trait LinkListener {
    /// A batch of frames was decoded from the remote adapter.
    fn frames_received(&mut self, frames: &[ReceivedFrame]);

    /// `count` frames left the pending queue during the last tick.
    fn frames_written(&mut self, count: usize) {
        let _ = count;
    }
}
