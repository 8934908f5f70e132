//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (configuration, lifecycle
//! preconditions, packet encoding, runner failures).
//!
//! Link degradation is not an error: it is reported through
//! [`LinkState`](crate::protocol::link::health::LinkState).
use thiserror_no_std::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised while validating a [`TunnelConfig`](crate::protocol::link::config::TunnelConfig).
pub enum ConfigError {
    /// The egress timer cannot fire every 0 ms.
    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,
    /// A heartbeat period of 0 ticks would divide by zero.
    #[error("Heartbeat period must be at least one tick")]
    ZeroHeartbeat,
    /// No bandwidth means no frame could ever leave the queue.
    #[error("Bandwidth must be greater than zero")]
    ZeroBandwidth,
    /// One tick must be able to carry at least one CAN data packet.
    #[error("Tick budget of {budget} bytes is below one packet ({packet} bytes)")]
    BudgetBelowPacket { budget: usize, packet: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Precondition failures reported by [`CanTunnel`](crate::protocol::link::CanTunnel).
pub enum TunnelError {
    /// The tunnel is closed; open it first.
    #[error("Tunnel is not open")]
    NotOpen,
    /// `open()` was called twice.
    #[error("Tunnel is already open")]
    AlreadyOpen,
    /// The pending queue has no room left for another frame.
    #[error("Pending frame queue is full")]
    QueueFull,
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Issues encountered while framing a packet.
pub enum PacketError {
    /// Payload does not fit in a single packet.
    #[error("Packet payload too large -> len: {len}, max: {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

#[derive(Error, Debug)]
/// Fatal errors returned by the async [`TunnelRunner`](crate::protocol::link::supervisor::TunnelRunner).
pub enum TunnelRunError<E: core::fmt::Debug> {
    /// The socket itself failed while waiting for datagrams.
    #[error("Socket receive error: {0:?}")]
    Receive(E),
    /// The tunnel was closed while the runner was driving it.
    #[error("Tunnel closed")]
    Closed,
}
