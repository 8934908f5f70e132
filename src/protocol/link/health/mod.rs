//! Heartbeat-based link supervision: periodic pings towards the adapter and a
//! coarse classification of the remote CAN controller from the status byte
//! carried by ping replies.
//!
//! The classification is re-evaluated continuously; there is no terminal state.
use core::sync::atomic::{AtomicU8, Ordering};

use crate::protocol::transport::{
    packet::{
        builder::{send_packet, SendReport},
        PacketType,
    },
    traits::link_driver::LinkDriver,
};

//==================================================================================STATUS_BITS
/// Controller reports no error.
pub const CAN_ERR_NONE: u8 = 0x00;
/// Error-passive (not classified on its own).
pub const CAN_ERR_PASSIVE: u8 = 0x01;
/// Error counters above the warning limit.
pub const CAN_ERR_WARNING: u8 = 0x02;
/// Controller went bus-off.
pub const CAN_ERR_BUS_OFF: u8 = 0x04;
/// Bus fault (not classified on its own).
pub const CAN_ERR_BUS_FAULT: u8 = 0x08;

//==================================================================================LINK_STATE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Health of the remote CAN controller as seen through the tunnel.
pub enum LinkState {
    /// No reply yet, or the last heartbeat window went unanswered.
    Unknown = 0,
    /// Status byte reported no error.
    Good = 1,
    /// Warning bit set.
    Warning = 2,
    /// Bus-off bit set (wins over warning).
    BusOff = 3,
    /// Reply present but no recognised bit.
    Error = 4,
}

impl LinkState {
    /// Classify a ping-reply status byte. First match wins:
    /// zero, then bus-off, then warning, otherwise error.
    pub const fn from_status(status: u8) -> Self {
        if status == CAN_ERR_NONE {
            LinkState::Good
        } else if status & CAN_ERR_BUS_OFF != 0 {
            LinkState::BusOff
        } else if status & CAN_ERR_WARNING != 0 {
            LinkState::Warning
        } else {
            LinkState::Error
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkState::Good,
            2 => LinkState::Warning,
            3 => LinkState::BusOff,
            4 => LinkState::Error,
            _ => LinkState::Unknown,
        }
    }
}

//==================================================================================STATUS_CELL
/// Shared, lock-free view of the current [`LinkState`].
///
/// One cell per link, allocated by the caller (typically in a `static`) so any
/// task can poll the status while the tunnel runs elsewhere.
#[derive(Debug)]
pub struct LinkStatusCell(AtomicU8);

impl Default for LinkStatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStatusCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(LinkState::Unknown as u8))
    }

    pub fn get(&self) -> LinkState {
        LinkState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LinkState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

//==================================================================================MONITOR
/// Heartbeat state machine.
#[derive(Debug)]
pub struct LinkHealthMonitor<'a> {
    status: &'a LinkStatusCell,
    /// A reply arrived since the last checkpoint.
    reply_seen: bool,
    tick_count: u32,
    /// Ticks elapsed in the current window, `0..heartbeat_ticks`.
    window_ticks: u32,
    heartbeat_ticks: u32,
}

impl<'a> LinkHealthMonitor<'a> {
    /// `heartbeat_ticks` must be non-zero (enforced by the config builder).
    pub fn new(status: &'a LinkStatusCell, heartbeat_ticks: u32) -> Self {
        Self {
            status,
            reply_seen: false,
            tick_count: 0,
            window_ticks: 0,
            heartbeat_ticks: heartbeat_ticks.max(1),
        }
    }

    pub fn state(&self) -> LinkState {
        self.status.get()
    }

    /// Shared cell this monitor publishes into.
    pub fn status_cell(&self) -> &'a LinkStatusCell {
        self.status
    }

    pub fn reply_seen(&self) -> bool {
        self.reply_seen
    }

    /// Ticks since `open()`; wraps and plays no part in the cadence.
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    /// Back to `Unknown` with a fresh tick counter.
    pub fn reset(&mut self) {
        self.reply_seen = false;
        self.tick_count = 0;
        self.window_ticks = 0;
        self.transition(LinkState::Unknown);
    }

    /// Emit a heartbeat request (empty ping).
    pub fn send_ping<D: LinkDriver>(&mut self, driver: &mut D) -> SendReport {
        #[cfg(feature = "defmt")]
        defmt::trace!("Sending heartbeat ping");

        // An empty payload always fits in a packet.
        send_packet(driver, PacketType::Ping, &[]).unwrap_or(SendReport {
            encoded: 0,
            written: 0,
        })
    }

    /// Record a ping reply and classify its status byte.
    ///
    /// A reply without status byte proves liveness but leaves the state as is.
    pub fn on_ping_reply(&mut self, payload: &[u8]) -> LinkState {
        self.reply_seen = true;
        if let Some(status) = payload.first() {
            self.transition(LinkState::from_status(*status));
        }
        self.state()
    }

    /// Advance the tick counter. Every `heartbeat_ticks` ticks, fall back to
    /// `Unknown` when no reply was seen in the window, clear the flag and send
    /// a new ping. Returns the ping report on checkpoint ticks.
    pub fn on_tick<D: LinkDriver>(&mut self, driver: &mut D) -> Option<SendReport> {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.window_ticks += 1;
        if self.window_ticks < self.heartbeat_ticks {
            return None;
        }
        self.window_ticks = 0;

        if !self.reply_seen {
            #[cfg(feature = "defmt")]
            if self.state() != LinkState::Unknown {
                defmt::warn!("Heartbeat missed, link state reset to Unknown");
            }
            self.transition(LinkState::Unknown);
        }
        self.reply_seen = false;
        Some(self.send_ping(driver))
    }

    fn transition(&self, next: LinkState) {
        #[cfg(feature = "defmt")]
        {
            let previous = self.status.get();
            if previous != next {
                defmt::info!("Link state {} -> {}", previous, next);
            }
        }
        self.status.set(next);
    }
}
