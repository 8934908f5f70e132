//! Packet serializer: frames a payload and hands the bytes to the link driver
//! in a single write.
use crate::error::PacketError;
use crate::protocol::transport::{
    packet::{checksum, PacketType},
    traits::link_driver::LinkDriver,
    ETX, MAX_PACKET_LEN, MAX_PACKET_PAYLOAD, PACKET_OVERHEAD, STX,
};

/// Serialize a packet into `out`, returning the encoded length.
pub fn encode_packet(
    kind: PacketType,
    payload: &[u8],
    out: &mut [u8; MAX_PACKET_LEN],
) -> Result<usize, PacketError> {
    let len = payload.len();
    if len > MAX_PACKET_PAYLOAD {
        return Err(PacketError::PayloadTooLarge {
            len,
            max: MAX_PACKET_PAYLOAD,
        });
    }

    let tag = kind.as_u8();
    out[0] = STX;
    out[1] = tag;
    out[2] = len as u8;
    out[3..3 + len].copy_from_slice(payload);
    out[3 + len] = checksum(tag, payload);
    out[4 + len] = ETX;

    Ok(len + PACKET_OVERHEAD)
}

/// Outcome of [`send_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Bytes of the encoded packet.
    pub encoded: usize,
    /// Bytes the driver accepted (may be short).
    pub written: usize,
}

impl SendReport {
    #[inline]
    pub fn is_short(&self) -> bool {
        self.written < self.encoded
    }
}

/// Encode a packet and emit it through `driver` in one atomic write.
///
/// Delivery is not guaranteed: the datagram may still be lost on the link.
pub fn send_packet<D: LinkDriver>(
    driver: &mut D,
    kind: PacketType,
    payload: &[u8],
) -> Result<SendReport, PacketError> {
    let mut buffer = [0u8; MAX_PACKET_LEN];
    let encoded = encode_packet(kind, payload, &mut buffer)?;
    let written = driver.write(&buffer[..encoded]);

    #[cfg(feature = "defmt")]
    if written < encoded {
        defmt::warn!("Short write: {} of {} bytes", written, encoded);
    }

    Ok(SendReport { encoded, written })
}
