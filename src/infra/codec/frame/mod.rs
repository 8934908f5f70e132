//! Fixed-size CAN message encoding carried inside CAN data packets.
//!
//! Layout (15 bytes, little-endian identifier):
//!
//! ```text
//! | id (u32 LE) | id type | frame type | length | data[8] |
//! |   0..4      |    4    |     5      |   6    |  7..15  |
//! ```
//!
//! Frame types follow the adapter firmware: `0` data, bit 0 remote,
//! `2` error. The mapping narrows in one direction: the wire cannot express
//! anything beyond these three kinds, and an unknown tag decodes as data
//! (or remote when bit 0 is set).
use crate::protocol::transport::{
    can_frame::{id_from_raw, CanFrame, FrameKind},
    CAN_MSG_LEN, MAX_CAN_DATA,
};
use embedded_can::Id;

/// Standard 11-bit identifier tag.
pub const ID_TYPE_STD: u8 = 0x00;
/// Extended 29-bit identifier tag.
pub const ID_TYPE_EXT: u8 = 0x01;

/// Data frame tag.
pub const FRAME_TYPE_DATA: u8 = 0x00;
/// Remote request tag (tested as a bit on decode).
pub const FRAME_TYPE_REMOTE: u8 = 0x01;
/// Error frame tag (tested for equality on decode).
pub const FRAME_TYPE_ERROR: u8 = 0x02;

/// Encode a frame into its fixed 15-byte wire representation.
///
/// Bytes past `len` in the data field are zeroed. The FD flag does not exist
/// in this encoding.
pub fn encode_frame(frame: &CanFrame) -> [u8; CAN_MSG_LEN] {
    let mut out = [0u8; CAN_MSG_LEN];
    out[0..4].copy_from_slice(&frame.raw_id().to_le_bytes());
    out[4] = match frame.id {
        Id::Standard(_) => ID_TYPE_STD,
        Id::Extended(_) => ID_TYPE_EXT,
    };
    out[5] = match frame.kind {
        FrameKind::Error => FRAME_TYPE_ERROR,
        FrameKind::Remote => FRAME_TYPE_REMOTE,
        FrameKind::Data => FRAME_TYPE_DATA,
    };
    let len = frame.len.min(MAX_CAN_DATA);
    out[6] = len as u8;
    out[7..7 + len].copy_from_slice(&frame.data[..len]);
    out
}

/// Decode the fixed 15-byte wire representation.
///
/// Total: the embedded length is clamped to eight bytes and identifiers are
/// masked to the width of their tag.
pub fn decode_frame(bytes: &[u8; CAN_MSG_LEN]) -> CanFrame {
    let raw_id = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let id = id_from_raw(raw_id, bytes[4] == ID_TYPE_EXT);

    let frame_type = bytes[5];
    let kind = if frame_type == FRAME_TYPE_ERROR {
        FrameKind::Error
    } else if frame_type & FRAME_TYPE_REMOTE != 0 {
        FrameKind::Remote
    } else {
        FrameKind::Data
    };

    let len = (bytes[6] as usize).min(MAX_CAN_DATA);
    let mut data = [0u8; MAX_CAN_DATA];
    data[..len].copy_from_slice(&bytes[7..7 + len]);

    CanFrame {
        id,
        kind,
        data,
        len,
    }
}
