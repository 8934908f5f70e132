//! Framed packets exchanged with the remote adapter over the datagram stream.
//!
//! ```text
//! | STX | type | len | payload[len] | checksum | ETX |
//! ```
//!
//! `checksum` is the XOR of `type`, `len` and every payload byte. A packet may
//! straddle datagrams; the [`decoder`] reassembles it from the byte ring.
use crate::error::PacketError;
use crate::protocol::transport::MAX_PACKET_PAYLOAD;

pub mod builder;
pub mod decoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Packet type tag.
pub enum PacketType {
    /// Payload is one fixed-size CAN message encoding.
    CanData,
    /// Heartbeat: empty when sent by the host, one status byte in replies.
    Ping,
}

impl PacketType {
    /// Tag of a CAN data packet.
    pub const CAN_DATA: u8 = 0x01;
    /// Tag of a ping packet.
    pub const PING: u8 = 0x04;

    /// Parse a tag; unknown values are rejected.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            Self::CAN_DATA => Some(PacketType::CanData),
            Self::PING => Some(PacketType::Ping),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            PacketType::CanData => Self::CAN_DATA,
            PacketType::Ping => Self::PING,
        }
    }
}

/// One decoded packet. Transient: lives only between decode and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    pub payload: [u8; MAX_PACKET_PAYLOAD],
    /// Number of valid payload bytes.
    pub len: usize,
}

impl Packet {
    /// Copy `payload` into a new packet.
    pub fn new(kind: PacketType, payload: &[u8]) -> Result<Self, PacketError> {
        if payload.len() > MAX_PACKET_PAYLOAD {
            return Err(PacketError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PACKET_PAYLOAD,
            });
        }
        let mut buffer = [0u8; MAX_PACKET_PAYLOAD];
        buffer[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            kind,
            payload: buffer,
            len: payload.len(),
        })
    }

    /// Valid payload bytes, bounded by the payload buffer.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len.min(MAX_PACKET_PAYLOAD)]
    }
}

/// XOR checksum over the type tag, length byte and payload.
pub(crate) fn checksum(kind: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(kind ^ payload.len() as u8, |acc, byte| acc ^ byte)
}

#[cfg(test)]
pub(crate) mod mock;
