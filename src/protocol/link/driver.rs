//! [`LinkDriver`] binding the tunnel's byte ring (inbound) to its datagram
//! transport (outbound).
use core::net::SocketAddr;

use crate::infra::ring::ByteRing;
use crate::protocol::transport::traits::{
    datagram_transport::DatagramTransport, link_driver::LinkDriver,
};

/// Short-lived driver borrowed for one entry-point invocation.
pub struct RingLink<'r, T: DatagramTransport, const N: usize> {
    ring: &'r mut ByteRing<N>,
    transport: &'r mut T,
    peer: SocketAddr,
    send_errors: u32,
    short_writes: u32,
}

impl<'r, T: DatagramTransport, const N: usize> RingLink<'r, T, N> {
    pub fn new(ring: &'r mut ByteRing<N>, transport: &'r mut T, peer: SocketAddr) -> Self {
        Self {
            ring,
            transport,
            peer,
            send_errors: 0,
            short_writes: 0,
        }
    }

    /// Sends rejected by the transport during this borrow.
    pub fn send_errors(&self) -> u32 {
        self.send_errors
    }

    /// Sends the transport accepted only partially during this borrow.
    pub fn short_writes(&self) -> u32 {
        self.short_writes
    }
}

impl<T: DatagramTransport, const N: usize> LinkDriver for RingLink<'_, T, N> {
    fn available(&self) -> usize {
        self.ring.available()
    }

    fn flush(&mut self) {
        self.ring.flush();
    }

    fn read(&mut self) -> Option<u8> {
        self.ring.read_byte()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        match self.transport.send_to(self.peer, data) {
            Ok(queued) => {
                if queued < data.len() {
                    self.short_writes = self.short_writes.wrapping_add(1);
                }
                queued
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Datagram send failed ({} bytes)", data.len());
                self.send_errors = self.send_errors.wrapping_add(1);
                0
            }
        }
    }
}
