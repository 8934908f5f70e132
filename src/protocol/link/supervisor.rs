//! Async supervisor built on top of [`CanTunnel`].
//!
//! A single runner task owns the tunnel and serializes its two entry points:
//! it waits on the socket and on the egress deadline at the same time, and
//! handles whichever completes first. Around it the supervisor offers:
//!
//! * a transmission handle ([`TunnelHandle`]) to queue outgoing frames from
//!   any task;
//! * an optional frame receiver ([`TunnelFrames`]) to pull decoded traffic.
//!
//! Channels are allocated by the firmware and borrowed by the supervisor;
//! nothing is allocated by the library.
use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Channel, Receiver, Sender},
};
use embassy_time::Instant;
use futures_util::{future::select, future::Either, pin_mut};

use crate::error::{TunnelError, TunnelRunError};
use crate::protocol::link::{
    health::{LinkState, LinkStatusCell},
    stats::LinkStats,
    CanTunnel,
};
use crate::protocol::transport::{
    can_frame::{CanFrame, ReceivedFrame},
    traits::{
        datagram_transport::DatagramSocket, link_listener::LinkListener, link_timer::LinkTimer,
    },
    MAX_DATAGRAM_LEN,
};

//==================================================================================SERVICE
/// Supervisor assembling the runner, the handle and the frame receiver.
pub struct TunnelSupervisor<'a, S, Tm, M, const RING: usize, const QUEUE: usize, const FRAMES: usize>
where
    S: DatagramSocket,
    Tm: LinkTimer,
    M: RawMutex,
{
    tunnel: CanTunnel<'a, S, M, RING, QUEUE>,
    timer: Tm,
    frame_channel: Option<&'a Channel<M, ReceivedFrame, FRAMES>>,
}

impl<'a, S, Tm, M, const RING: usize, const QUEUE: usize, const FRAMES: usize>
    TunnelSupervisor<'a, S, Tm, M, RING, QUEUE, FRAMES>
where
    S: DatagramSocket,
    Tm: LinkTimer,
    M: RawMutex,
{
    /// Wrap a tunnel, opening it when needed.
    pub fn open(
        mut tunnel: CanTunnel<'a, S, M, RING, QUEUE>,
        timer: Tm,
        frame_channel: Option<&'a Channel<M, ReceivedFrame, FRAMES>>,
    ) -> Result<Self, TunnelError> {
        if !tunnel.is_open() {
            tunnel.open()?;
        }
        Ok(Self {
            tunnel,
            timer,
            frame_channel,
        })
    }

    /// Split into handle/receiver/runner components.
    pub fn into_parts(self) -> TunnelSupervisorParts<'a, S, Tm, M, RING, QUEUE, FRAMES> {
        let handle = TunnelHandle {
            sender: self.tunnel.pending_channel().sender(),
            status: self.tunnel.status_cell(),
        };
        let frames = self.frame_channel.map(|channel| TunnelFrames {
            receiver: channel.receiver(),
        });
        TunnelSupervisorParts {
            handle,
            frames,
            runner: TunnelRunner {
                tunnel: self.tunnel,
                timer: self.timer,
                forwarder: FrameForwarder {
                    channel: self.frame_channel,
                    dropped: 0,
                },
            },
        }
    }
}

/// Bundle returned by [`TunnelSupervisor::into_parts`].
pub struct TunnelSupervisorParts<
    'a,
    S,
    Tm,
    M,
    const RING: usize,
    const QUEUE: usize,
    const FRAMES: usize,
> where
    S: DatagramSocket,
    Tm: LinkTimer,
    M: RawMutex,
{
    pub handle: TunnelHandle<'a, M, QUEUE>,
    pub frames: Option<TunnelFrames<'a, M, FRAMES>>,
    pub runner: TunnelRunner<'a, S, Tm, M, RING, QUEUE, FRAMES>,
}

//==================================================================================RUNNER
/// Runner that drives the tunnel loop.
pub struct TunnelRunner<'a, S, Tm, M, const RING: usize, const QUEUE: usize, const FRAMES: usize>
where
    S: DatagramSocket,
    Tm: LinkTimer,
    M: RawMutex,
{
    tunnel: CanTunnel<'a, S, M, RING, QUEUE>,
    timer: Tm,
    forwarder: FrameForwarder<'a, M, FRAMES>,
}

enum Event<E> {
    Datagram(Result<(usize, core::net::SocketAddr), E>),
    Tick,
}

impl<'a, S, Tm, M, const RING: usize, const QUEUE: usize, const FRAMES: usize>
    TunnelRunner<'a, S, Tm, M, RING, QUEUE, FRAMES>
where
    S: DatagramSocket,
    Tm: LinkTimer,
    M: RawMutex,
{
    /// Run until the socket fails. Ticks are scheduled on absolute deadlines;
    /// when the runner falls behind by more than one period it realigns on
    /// the current instant instead of bursting the missed ticks.
    ///
    /// Dropping the returned future stops the loop without losing state, so
    /// the runner can be driven again or closed afterwards.
    pub async fn drive(&mut self) -> Result<(), TunnelRunError<S::Error>> {
        if !self.tunnel.is_open() {
            return Err(TunnelRunError::Closed);
        }

        let period = self.tunnel.config().tick_interval();
        let mut buffer = [0u8; MAX_DATAGRAM_LEN];
        let mut next_tick = self.timer.now() + period;

        loop {
            let event = {
                let recv_future = self.tunnel.transport_mut().recv_from(&mut buffer);
                let tick_future = self.timer.delay_until(next_tick);
                pin_mut!(recv_future);
                pin_mut!(tick_future);

                match select(recv_future, tick_future).await {
                    Either::Left((result, _pending_tick)) => Event::Datagram(result),
                    Either::Right(((), _pending_recv)) => Event::Tick,
                }
            };

            match event {
                Event::Datagram(Ok((len, from))) => {
                    let now = self.timer.now();
                    let len = len.min(buffer.len());
                    self.tunnel
                        .on_datagram(now, from, &buffer[..len], &mut self.forwarder);
                }
                Event::Datagram(Err(err)) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Tunnel socket failed, stopping runner");
                    return Err(TunnelRunError::Receive(err));
                }
                Event::Tick => {
                    self.tunnel.on_tick(&mut self.forwarder);
                    next_tick = next_deadline(next_tick, period, self.timer.now());
                }
            }
        }
    }

    /// Close the underlying tunnel, discarding everything it buffered.
    pub fn close(&mut self) -> Result<(), TunnelError> {
        self.tunnel.close()
    }

    pub fn tunnel(&self) -> &CanTunnel<'a, S, M, RING, QUEUE> {
        &self.tunnel
    }

    pub fn tunnel_mut(&mut self) -> &mut CanTunnel<'a, S, M, RING, QUEUE> {
        &mut self.tunnel
    }

    pub fn stats(&self) -> LinkStats {
        self.tunnel.stats()
    }

    /// Decoded frames lost because the frame channel was full.
    pub fn dropped_frames(&self) -> u32 {
        self.forwarder.dropped
    }
}

/// Deadline following `previous`, skipping ahead when `now` is already past it.
fn next_deadline(
    previous: Instant,
    period: embassy_time::Duration,
    now: Instant,
) -> Instant {
    let next = previous + period;
    if next <= now {
        now + period
    } else {
        next
    }
}

/// Listener pushing decoded frames into the optional frame channel.
struct FrameForwarder<'a, M: RawMutex, const FRAMES: usize> {
    channel: Option<&'a Channel<M, ReceivedFrame, FRAMES>>,
    dropped: u32,
}

impl<M: RawMutex, const FRAMES: usize> LinkListener for FrameForwarder<'_, M, FRAMES> {
    fn frames_received(&mut self, frames: &[ReceivedFrame]) {
        let Some(channel) = self.channel else {
            return;
        };
        for frame in frames {
            if channel.try_send(*frame).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("Frame channel full, dropping frame {=u32:#x}", frame.frame.raw_id());
                self.dropped = self.dropped.wrapping_add(1);
            }
        }
    }
}

//==================================================================================HANDLES
/// Transmission handle, cheap to copy into producer tasks.
pub struct TunnelHandle<'a, M: RawMutex, const QUEUE: usize> {
    sender: Sender<'a, M, CanFrame, QUEUE>,
    status: &'a LinkStatusCell,
}

impl<M: RawMutex, const QUEUE: usize> Clone for TunnelHandle<'_, M, QUEUE> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, const QUEUE: usize> Copy for TunnelHandle<'_, M, QUEUE> {}

impl<'a, M: RawMutex, const QUEUE: usize> TunnelHandle<'a, M, QUEUE> {
    /// Queue a frame, waiting for room in the pending queue.
    pub async fn send_frame(&self, frame: CanFrame) {
        self.sender.send(frame).await;
    }

    /// Queue a frame without waiting.
    pub fn try_send_frame(&self, frame: CanFrame) -> Result<(), TunnelError> {
        self.sender
            .try_send(frame)
            .map_err(|_| TunnelError::QueueFull)
    }

    /// Latest classification published by the runner.
    pub fn link_state(&self) -> LinkState {
        self.status.get()
    }
}

/// Receiver returning frames decoded by the runner.
pub struct TunnelFrames<'a, M: RawMutex, const FRAMES: usize> {
    receiver: Receiver<'a, M, ReceivedFrame, FRAMES>,
}

impl<'a, M: RawMutex, const FRAMES: usize> TunnelFrames<'a, M, FRAMES> {
    pub async fn recv(&mut self) -> ReceivedFrame {
        self.receiver.receive().await
    }

    pub fn try_recv(&mut self) -> Option<ReceivedFrame> {
        self.receiver.try_receive().ok()
    }
}
