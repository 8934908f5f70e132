//! The assembled tunnel: inbound datagrams flow through the byte ring and
//! packet decoder to the listener; outbound frames wait in the pending queue
//! until the egress tick sends them. Heartbeats ride on the same tick.
//!
//! [`CanTunnel`] exposes two entry points, [`CanTunnel::on_datagram`] and
//! [`CanTunnel::on_tick`], which the host must never invoke concurrently. The
//! async [`supervisor`] guarantees this by driving both from a single task.
use core::net::SocketAddr;

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use embassy_time::{Duration, Instant};

use crate::error::TunnelError;
use crate::infra::codec::frame::decode_frame;
use crate::infra::ring::ByteRing;
use crate::protocol::transport::{
    can_frame::{CanFrame, ReceivedFrame},
    packet::{decoder::PacketDecoder, Packet, PacketType},
    traits::{datagram_transport::DatagramTransport, link_listener::LinkListener},
    CAN_MSG_LEN,
};

pub mod config;
pub mod driver;
pub mod egress;
pub mod health;
pub mod stats;
pub mod supervisor;

use config::TunnelConfig;
use driver::RingLink;
use egress::EgressScheduler;
use health::{LinkHealthMonitor, LinkState, LinkStatusCell};
use stats::LinkStats;

/// One tunnel towards one remote adapter.
///
/// Buffers are provided by the caller: the byte ring (large, usually in a
/// `static`), the pending frame channel and the shared status cell.
pub struct CanTunnel<'a, T, M, const RING: usize, const QUEUE: usize>
where
    T: DatagramTransport,
    M: RawMutex,
{
    transport: T,
    peer: SocketAddr,
    config: TunnelConfig,
    ring: &'a mut ByteRing<RING>,
    decoder: PacketDecoder,
    egress: EgressScheduler<'a, M, QUEUE>,
    health: LinkHealthMonitor<'a>,
    /// Arrival instant of the first frame since `open()`.
    time_origin: Option<Instant>,
    stats: LinkStats,
    is_open: bool,
}

impl<'a, T, M, const RING: usize, const QUEUE: usize> CanTunnel<'a, T, M, RING, QUEUE>
where
    T: DatagramTransport,
    M: RawMutex,
{
    /// Assemble a closed tunnel.
    pub fn new(
        transport: T,
        peer: SocketAddr,
        config: TunnelConfig,
        ring: &'a mut ByteRing<RING>,
        pending: &'a Channel<M, CanFrame, QUEUE>,
        status: &'a LinkStatusCell,
    ) -> Self {
        Self {
            transport,
            peer,
            config,
            ring,
            decoder: PacketDecoder::new(),
            egress: EgressScheduler::new(pending, config.budget_bytes()),
            health: LinkHealthMonitor::new(status, config.heartbeat_ticks()),
            time_origin: None,
            stats: LinkStats::default(),
            is_open: false,
        }
    }

    //==================================================================================Lifecycle
    /// Start the link: state `Unknown`, heartbeat counter at zero, and a first
    /// ping so the adapter's status arrives without waiting a full window.
    pub fn open(&mut self) -> Result<(), TunnelError> {
        if self.is_open {
            return Err(TunnelError::AlreadyOpen);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Opening CAN tunnel");

        self.discard_buffers();
        self.health.reset();
        self.is_open = true;

        let mut link = RingLink::new(&mut *self.ring, &mut self.transport, self.peer);
        self.health.send_ping(&mut link);
        self.stats.pings_sent = self.stats.pings_sent.wrapping_add(1);
        self.stats.send_errors = self.stats.send_errors.wrapping_add(link.send_errors());
        self.stats.short_writes = self.stats.short_writes.wrapping_add(link.short_writes());
        Ok(())
    }

    /// Stop the link and discard all buffered state: ring bytes, partial
    /// packet, pending frames, health classification and time origin.
    pub fn close(&mut self) -> Result<(), TunnelError> {
        if !self.is_open {
            return Err(TunnelError::NotOpen);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Closing CAN tunnel");

        self.is_open = false;
        self.discard_buffers();
        self.health.reset();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    //==================================================================================Application side
    /// Queue a frame for transmission on a later tick.
    pub fn enqueue(&self, frame: CanFrame) -> Result<(), TunnelError> {
        if !self.is_open {
            return Err(TunnelError::NotOpen);
        }
        self.egress.enqueue(frame)
    }

    /// Current classification of the remote controller.
    pub fn link_state(&self) -> LinkState {
        self.health.state()
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            resyncs: self.decoder.resyncs(),
            noise_bytes: self.decoder.discarded(),
            ..self.stats
        }
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Frames waiting in the pending queue.
    pub fn pending_frames(&self) -> usize {
        self.egress.pending()
    }

    /// Unparsed bytes in the ring.
    pub fn buffered_bytes(&self) -> usize {
        self.ring.available()
    }

    pub fn pending_channel(&self) -> &'a Channel<M, CanFrame, QUEUE> {
        self.egress.channel()
    }

    pub fn status_cell(&self) -> &'a LinkStatusCell {
        self.health.status_cell()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    //==================================================================================Entry points
    /// Feed one datagram received at `now` from `from`.
    ///
    /// Datagrams from other senders are discarded. Returns the number of CAN
    /// frames delivered to `listener`.
    pub fn on_datagram<L: LinkListener>(
        &mut self,
        now: Instant,
        from: SocketAddr,
        data: &[u8],
        listener: &mut L,
    ) -> usize {
        if !self.is_open {
            return 0;
        }
        if from != self.peer {
            #[cfg(feature = "defmt")]
            defmt::debug!("Dropping datagram from unexpected peer");
            self.stats.datagrams_rejected = self.stats.datagrams_rejected.wrapping_add(1);
            return 0;
        }
        self.stats.datagrams_accepted = self.stats.datagrams_accepted.wrapping_add(1);

        let accepted = self.ring.write(data);
        if accepted < data.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Byte ring full, dropped {} bytes", data.len() - accepted);
            self.stats.bytes_dropped = self
                .stats
                .bytes_dropped
                .wrapping_add((data.len() - accepted) as u32);
        }

        let mut delivered = 0;
        let mut link = RingLink::new(&mut *self.ring, &mut self.transport, self.peer);
        while let Some(packet) = self.decoder.poll(&mut link) {
            self.stats.packets_decoded = self.stats.packets_decoded.wrapping_add(1);
            delivered += dispatch(
                packet,
                now,
                &mut self.health,
                &mut self.time_origin,
                &mut self.stats,
                listener,
            );
        }
        delivered
    }

    /// Egress timer expiry: drain the pending queue within the tick budget and
    /// run the heartbeat checkpoint when due.
    pub fn on_tick<L: LinkListener>(&mut self, listener: &mut L) {
        if !self.is_open {
            return;
        }

        let mut link = RingLink::new(&mut *self.ring, &mut self.transport, self.peer);
        let report = self.egress.drain(&mut link);
        if report.frames > 0 {
            self.stats.frames_sent = self.stats.frames_sent.wrapping_add(report.frames as u32);
            listener.frames_written(report.frames);
        }

        if self.health.on_tick(&mut link).is_some() {
            self.stats.pings_sent = self.stats.pings_sent.wrapping_add(1);
        }
        self.stats.send_errors = self.stats.send_errors.wrapping_add(link.send_errors());
        self.stats.short_writes = self.stats.short_writes.wrapping_add(link.short_writes());
    }

    //==================================================================================Helpers
    fn discard_buffers(&mut self) {
        self.ring.flush();
        self.decoder.reset();
        self.egress.clear();
        self.time_origin = None;
    }
}

/// Route one decoded packet. Returns the number of frames delivered.
fn dispatch<L: LinkListener>(
    packet: Packet,
    now: Instant,
    health: &mut LinkHealthMonitor<'_>,
    time_origin: &mut Option<Instant>,
    stats: &mut LinkStats,
    listener: &mut L,
) -> usize {
    match packet.kind {
        PacketType::CanData => {
            let Ok(message) = <&[u8; CAN_MSG_LEN]>::try_from(packet.payload()) else {
                #[cfg(feature = "defmt")]
                defmt::debug!("Malformed CAN data packet ({} bytes)", packet.len);
                stats.packets_malformed = stats.packets_malformed.wrapping_add(1);
                return 0;
            };

            let origin = *time_origin.get_or_insert(now);
            let timestamp = now
                .checked_duration_since(origin)
                .unwrap_or(Duration::from_ticks(0));
            let received = ReceivedFrame {
                frame: decode_frame(message),
                timestamp,
            };

            listener.frames_received(core::slice::from_ref(&received));
            stats.frames_received = stats.frames_received.wrapping_add(1);
            1
        }
        PacketType::Ping => {
            health.on_ping_reply(packet.payload());
            stats.ping_replies = stats.ping_replies.wrapping_add(1);
            0
        }
    }
}
