//! Minimal abstraction for the datagram socket linking the host to the remote
//! adapter. The tunnel never binds or connects anything itself.
use core::future::Future;
use core::net::SocketAddr;

/// Fire-and-forget datagram emission.
pub trait DatagramTransport {
    type Error: core::fmt::Debug;
    /// Queue `data` as one datagram towards `peer`.
    ///
    /// Returns the number of bytes actually queued; a short count is tolerated
    /// by the caller. Must not block.
    fn send_to(&mut self, peer: SocketAddr, data: &[u8]) -> Result<usize, Self::Error>;
}

/// Datagram socket able to wait for inbound traffic, used by the async runner.
pub trait DatagramSocket: DatagramTransport {
    /// Wait for the next datagram, returning its length and sender.
    fn recv_from<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = Result<(usize, SocketAddr), Self::Error>> + 'a;
}
