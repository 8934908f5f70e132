//! # UDP bridge example
//!
//! Host-side tunnel towards a CAN-to-Ethernet adapter using a tokio
//! `UdpSocket`. Every received frame is printed; a counter frame is queued
//! once per second.
//!
//! ## Run
//! ```bash
//! # local bind address, then adapter address
//! cargo run --example udp_bridge -- 0.0.0.0:20000 192.168.1.10:20001
//! ```

use std::io;
use std::net::SocketAddr;

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embedded_can::StandardId;
use tokio::net::UdpSocket;
use tokio::time::{interval, Duration};

// ============================================================================
// korri-can-udp imports
// ============================================================================

use korri_can_udp::{
    infra::ring::ByteRing,
    protocol::{
        link::{
            config::TunnelConfig,
            health::LinkStatusCell,
            supervisor::{TunnelSupervisor, TunnelSupervisorParts},
            CanTunnel,
        },
        transport::{
            can_frame::{CanFrame, ReceivedFrame},
            traits::{
                datagram_transport::{DatagramSocket, DatagramTransport},
                link_timer::LinkTimer,
            },
        },
    },
};

// ============================================================================
// Transport implementation over tokio
// ============================================================================

pub struct UdpLink {
    socket: UdpSocket,
}

impl DatagramTransport for UdpLink {
    type Error = io::Error;

    fn send_to(&mut self, peer: SocketAddr, data: &[u8]) -> Result<usize, Self::Error> {
        // Never waits: a full socket buffer surfaces as `WouldBlock`.
        self.socket.try_send_to(data, peer)
    }
}

impl DatagramSocket for UdpLink {
    async fn recv_from<'a>(&'a mut self, buf: &'a mut [u8]) -> Result<(usize, SocketAddr), Self::Error> {
        self.socket.recv_from(buf).await
    }
}

// ============================================================================
// Timer implementation over tokio
// ============================================================================

pub struct HostTimer {
    origin: tokio::time::Instant,
}

impl LinkTimer for HostTimer {
    fn now(&self) -> embassy_time::Instant {
        embassy_time::Instant::from_micros(self.origin.elapsed().as_micros() as u64)
    }

    async fn delay_until<'a>(&'a mut self, deadline: embassy_time::Instant) {
        tokio::time::sleep_until(self.origin + Duration::from_micros(deadline.as_micros())).await;
    }
}

// ============================================================================
// Main application
// ============================================================================

const RING: usize = 64 * 1024;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let local: SocketAddr = args.next().as_deref().unwrap_or("0.0.0.0:20000").parse()?;
    let peer: SocketAddr = args.next().as_deref().unwrap_or("192.168.1.10:20001").parse()?;

    println!("=== korri-can-udp bridge {local} <-> {peer} ===");

    let link = UdpLink {
        socket: UdpSocket::bind(local).await?,
    };
    let timer = HostTimer {
        origin: tokio::time::Instant::now(),
    };

    // Boxed to keep the ring off the stack.
    let mut ring = Box::new(ByteRing::<RING>::new());
    let pending = Channel::<NoopRawMutex, CanFrame, 256>::new();
    let received = Channel::<NoopRawMutex, ReceivedFrame, 256>::new();
    let status = LinkStatusCell::new();

    let tunnel = CanTunnel::new(
        link,
        peer,
        TunnelConfig::default(),
        &mut ring,
        &pending,
        &status,
    );
    let supervisor = TunnelSupervisor::open(tunnel, timer, Some(&received))
        .map_err(|err| format!("{err:?}"))?;
    let TunnelSupervisorParts {
        handle,
        frames,
        mut runner,
    } = supervisor.into_parts();
    let mut frames = frames.ok_or("frame channel missing")?;

    let id = StandardId::new(0x100).ok_or("invalid id")?;
    let producer = async {
        let mut ticker = interval(Duration::from_secs(1));
        let mut counter = 0u32;
        loop {
            ticker.tick().await;
            if let Some(frame) = CanFrame::data_frame(id, &counter.to_be_bytes()) {
                handle.send_frame(frame).await;
            }
            println!("link state: {:?}", handle.link_state());
            counter = counter.wrapping_add(1);
        }
    };

    let consumer = async {
        loop {
            let received = frames.recv().await;
            println!(
                "+{:>8} us  id={:#x} {:?} {:02X?}",
                received.timestamp.as_micros(),
                received.frame.raw_id(),
                received.frame.kind,
                received.frame.payload()
            );
        }
    };

    tokio::select! {
        result = runner.drive() => result.map_err(|err| format!("{err:?}"))?,
        _ = producer => {}
        _ = consumer => {}
    }

    println!("stats: {:?}", runner.stats());
    Ok(())
}
