//! Test doubles simulating the datagram link, the adapter and the timer during
//! integration tests.
#![allow(dead_code)]

use core::net::{IpAddr, Ipv4Addr, SocketAddr};

use korri_can_udp::infra::codec::frame::{decode_frame, encode_frame};
use korri_can_udp::protocol::transport::{
    can_frame::{CanFrame, ReceivedFrame},
    packet::{builder::encode_packet, PacketType},
    traits::{
        datagram_transport::{DatagramSocket, DatagramTransport},
        link_listener::LinkListener,
        link_timer::LinkTimer,
    },
    CAN_MSG_LEN, MAX_PACKET_LEN,
};
use tokio::sync::mpsc;

/// Address of the simulated CAN-to-Ethernet adapter.
pub fn adapter_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)), 20_001)
}

/// Address of the host running the tunnel.
pub fn host_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)), 20_000)
}

/// Some unrelated sender on the same network.
pub fn stranger_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 66)), 20_001)
}

//==================================================================================SOCKET
/// In-memory datagram endpoint; datagrams keep their boundaries.
pub struct MemorySocket {
    local: SocketAddr,
    outbox: mpsc::UnboundedSender<(SocketAddr, Vec<u8>)>,
    inbox: mpsc::UnboundedReceiver<(SocketAddr, Vec<u8>)>,
}

impl MemorySocket {
    /// Construct two interconnected endpoints (host ↔ adapter).
    pub fn create_pair(host: SocketAddr, adapter: SocketAddr) -> (Self, Self) {
        let (host_tx, adapter_rx) = mpsc::unbounded_channel();
        let (adapter_tx, host_rx) = mpsc::unbounded_channel();

        let host_socket = Self {
            local: host,
            outbox: host_tx,
            inbox: host_rx,
        };
        let adapter_socket = Self {
            local: adapter,
            outbox: adapter_tx,
            inbox: adapter_rx,
        };
        (host_socket, adapter_socket)
    }

    /// Next datagram, waiting for it.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbox.recv().await.map(|(_, data)| data)
    }

    /// Next datagram if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.inbox.try_recv().ok().map(|(_, data)| data)
    }

    /// Every queued datagram.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Send raw bytes as one datagram.
    pub fn send(&self, data: &[u8]) {
        self.outbox
            .send((self.local, data.to_vec()))
            .expect("peer endpoint dropped");
    }
}

impl DatagramTransport for MemorySocket {
    type Error = ();

    fn send_to(&mut self, _peer: SocketAddr, data: &[u8]) -> Result<usize, Self::Error> {
        self.outbox
            .send((self.local, data.to_vec()))
            .map_err(|_| ())?;
        Ok(data.len())
    }
}

impl DatagramSocket for MemorySocket {
    async fn recv_from<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> Result<(usize, SocketAddr), Self::Error> {
        let (from, data) = self.inbox.recv().await.ok_or(())?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok((len, from))
    }
}

//==================================================================================ADAPTER_SIDE
/// Encode a packet the way the adapter puts it on the wire.
pub fn adapter_packet(kind: PacketType, payload: &[u8]) -> Vec<u8> {
    let mut buffer = [0u8; MAX_PACKET_LEN];
    let len = encode_packet(kind, payload, &mut buffer).expect("payload fits in a packet");
    buffer[..len].to_vec()
}

/// CAN data packet carrying `frame`.
pub fn can_packet(frame: &CanFrame) -> Vec<u8> {
    adapter_packet(PacketType::CanData, &encode_frame(frame))
}

/// Ping reply; `None` sends an empty reply.
pub fn ping_reply(status: Option<u8>) -> Vec<u8> {
    match status {
        Some(status) => adapter_packet(PacketType::Ping, &[status]),
        None => adapter_packet(PacketType::Ping, &[]),
    }
}

/// Packet type tag of a datagram sent by the tunnel.
pub fn packet_tag(datagram: &[u8]) -> u8 {
    datagram[1]
}

/// Decode the CAN frame carried by a CAN data packet sent by the tunnel.
pub fn frame_in(datagram: &[u8]) -> CanFrame {
    assert_eq!(packet_tag(datagram), PacketType::CAN_DATA);
    let mut message = [0u8; CAN_MSG_LEN];
    message.copy_from_slice(&datagram[3..3 + CAN_MSG_LEN]);
    decode_frame(&message)
}

//==================================================================================LISTENER
/// Listener recording everything the tunnel reports.
#[derive(Default)]
pub struct FrameLog {
    pub frames: Vec<ReceivedFrame>,
    pub written: usize,
}

impl LinkListener for FrameLog {
    fn frames_received(&mut self, frames: &[ReceivedFrame]) {
        self.frames.extend_from_slice(frames);
    }

    fn frames_written(&mut self, count: usize) {
        self.written += count;
    }
}

//==================================================================================TIMER
/// Timer based on `tokio::time` to drive the runner in tests.
pub struct TokioTimer {
    origin: tokio::time::Instant,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl LinkTimer for TokioTimer {
    fn now(&self) -> embassy_time::Instant {
        embassy_time::Instant::from_micros(self.origin.elapsed().as_micros() as u64)
    }

    async fn delay_until<'a>(&'a mut self, deadline: embassy_time::Instant) {
        let target = self.origin + std::time::Duration::from_micros(deadline.as_micros());
        tokio::time::sleep_until(target).await;
    }
}
