//! Rate-limited egress: drains the pending frame queue once per tick, one CAN
//! frame per packet, within a per-tick byte budget derived from the bandwidth
//! ceiling.
//!
//! The budget is enforced on cumulative encoded bytes: a frame is sent only if
//! its packet still fits in what is left of the tick's budget. Frames that do
//! not fit stay queued, in order, for the next tick.
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};

use crate::error::TunnelError;
use crate::infra::codec::frame::encode_frame;
use crate::protocol::transport::{
    can_frame::CanFrame,
    packet::{builder::send_packet, PacketType},
    traits::link_driver::LinkDriver,
    CAN_PACKET_LEN,
};

/// Outcome of one drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EgressReport {
    /// Frames taken from the queue and handed to the driver.
    pub frames: usize,
    /// Encoded bytes charged against the budget.
    pub bytes: usize,
    /// Writes the driver accepted only partially.
    pub short_writes: usize,
}

/// FIFO pending queue plus the per-tick budget.
pub struct EgressScheduler<'a, M: RawMutex, const QUEUE: usize> {
    pending: &'a Channel<M, CanFrame, QUEUE>,
    budget_bytes: usize,
}

impl<'a, M: RawMutex, const QUEUE: usize> EgressScheduler<'a, M, QUEUE> {
    pub fn new(pending: &'a Channel<M, CanFrame, QUEUE>, budget_bytes: usize) -> Self {
        Self {
            pending,
            budget_bytes,
        }
    }

    /// Channel backing the pending queue; producers may hold its sender.
    pub fn channel(&self) -> &'a Channel<M, CanFrame, QUEUE> {
        self.pending
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    /// Queue a frame for a later tick.
    pub fn enqueue(&self, frame: CanFrame) -> Result<(), TunnelError> {
        self.pending
            .try_send(frame)
            .map_err(|_| TunnelError::QueueFull)
    }

    /// Frames waiting for transmission.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop every queued frame.
    pub fn clear(&self) {
        while self.pending.try_receive().is_ok() {}
    }

    /// Send queued frames in FIFO order until the queue is empty or the next
    /// packet would exceed the tick budget.
    pub fn drain<D: LinkDriver>(&mut self, driver: &mut D) -> EgressReport {
        let mut report = EgressReport::default();

        while report.bytes + CAN_PACKET_LEN <= self.budget_bytes {
            let Ok(frame) = self.pending.try_receive() else {
                break;
            };

            let payload = encode_frame(&frame);
            // A CAN message always fits in one packet.
            if let Ok(sent) = send_packet(driver, PacketType::CanData, &payload) {
                report.frames += 1;
                report.bytes += sent.encoded;
                if sent.is_short() {
                    report.short_writes += 1;
                }
            }
        }

        #[cfg(feature = "defmt")]
        if report.frames > 0 {
            defmt::trace!(
                "Egress tick: {} frames, {} bytes, {} still pending",
                report.frames,
                report.bytes,
                self.pending()
            );
        }

        report
    }
}
