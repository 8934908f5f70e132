//! Tunnel transport layer: CAN frame representation, packet framing over the
//! datagram byte stream, and collaborator traits (transport, driver, timer,
//! listener).
//!
//! ## Wire and sizing constants
//!
//! These constants fix the packet layout exchanged with the remote
//! CAN-to-Ethernet adapter and the default sizing of the host-side buffers.

pub mod can_frame;
pub mod packet;
pub mod traits;

/// Start-of-packet marker. The decoder resynchronizes on this byte.
pub const STX: u8 = 0x02;

/// End-of-packet marker.
pub const ETX: u8 = 0x03;

/// Framing bytes surrounding a payload: `STX`, type, length, checksum, `ETX`.
pub const PACKET_OVERHEAD: usize = 5;

/// Largest payload accepted inside one packet.
///
/// CAN data packets use [`CAN_MSG_LEN`] bytes and ping replies a single status
/// byte, so anything above this bound is treated as corruption.
pub const MAX_PACKET_PAYLOAD: usize = 32;

/// Largest complete packet on the wire.
pub const MAX_PACKET_LEN: usize = MAX_PACKET_PAYLOAD + PACKET_OVERHEAD;

/// Size of the fixed CAN message encoding carried by a CAN data packet:
/// identifier (4), id type (1), frame type (1), length (1), data (8).
pub const CAN_MSG_LEN: usize = 15;

/// Bytes put on the wire by one CAN data packet.
pub const CAN_PACKET_LEN: usize = CAN_MSG_LEN + PACKET_OVERHEAD;

/// Classic CAN payload limit. FD payloads are not supported.
pub const MAX_CAN_DATA: usize = 8;

/// Default byte ring capacity (512 KiB).
///
/// Sized to absorb datagram bursts between two parse passes; a tunnel of this
/// size should live in a `static` rather than on the stack.
pub const DEFAULT_RING_CAPACITY: usize = 512 * 1024;

/// Default egress timer period (ms).
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 50;

/// Default sustained bandwidth ceiling towards the adapter (bytes/s).
///
/// At the default tick this yields a budget of 1920 bytes per tick.
pub const DEFAULT_BANDWIDTH_BYTES_PER_SEC: u32 = 38_400;

/// Default heartbeat period, in ticks (10 × 50 ms ≈ 500 ms).
pub const DEFAULT_HEARTBEAT_TICKS: u32 = 10;

/// Receive buffer size used by the async runner for one datagram.
///
/// Matches a typical Ethernet MTU; larger datagrams are truncated by the
/// socket and the lost tail is handled like any other stream corruption.
pub const MAX_DATAGRAM_LEN: usize = 1500;
