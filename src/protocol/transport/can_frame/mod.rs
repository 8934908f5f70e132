//! In-memory representation of a classic CAN frame as carried by the tunnel.
use embassy_time::Duration;
use embedded_can::{ExtendedId, Id, StandardId};

use crate::protocol::transport::MAX_CAN_DATA;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Nature of a CAN frame.
pub enum FrameKind {
    /// Regular data frame.
    Data,
    /// Remote transmission request; `len` carries the requested DLC.
    Remote,
    /// Error frame reported by the controller.
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// CAN frame exchanged with the application and the remote adapter.
pub struct CanFrame {
    /// Standard (11-bit) or extended (29-bit) identifier.
    pub id: Id,
    /// Data, remote or error frame.
    pub kind: FrameKind,
    /// Payload buffer. Classic CAN frames never carry more than eight bytes.
    pub data: [u8; MAX_CAN_DATA],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a data frame. Returns `None` when `data` exceeds eight bytes.
    pub fn data_frame(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::with_kind(id, FrameKind::Data, data)
    }

    /// Build an error frame carrying the controller's error payload.
    pub fn error_frame(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::with_kind(id, FrameKind::Error, data)
    }

    /// Build a frame of any kind. Returns `None` when `data` exceeds eight bytes.
    pub fn with_kind(id: impl Into<Id>, kind: FrameKind, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_CAN_DATA {
            return None;
        }
        let mut buffer = [0u8; MAX_CAN_DATA];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            kind,
            data: buffer,
            len: data.len(),
        })
    }

    /// Raw identifier value without the standard/extended tag.
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }

    /// Valid payload bytes. A `len` above eight is read as eight.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(MAX_CAN_DATA)]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::data_frame(id, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_CAN_DATA {
            return None;
        }
        Some(Self {
            id: id.into(),
            kind: FrameKind::Remote,
            data: [0; MAX_CAN_DATA],
            len: dlc,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.kind == FrameKind::Remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Frame decoded from the remote adapter, stamped on arrival.
pub struct ReceivedFrame {
    pub frame: CanFrame,
    /// Elapsed time since the first frame received after `open()`.
    pub timestamp: Duration,
}

/// Rebuild an identifier from its raw value and tag, masking bits the tag
/// cannot hold (11 bits standard, 29 bits extended).
pub fn id_from_raw(raw: u32, extended: bool) -> Id {
    if extended {
        // Masked to 29 bits: always in range.
        Id::Extended(ExtendedId::new(raw & ExtendedId::MAX.as_raw()).unwrap_or(ExtendedId::ZERO))
    } else {
        let raw = (raw & StandardId::MAX.as_raw() as u32) as u16;
        Id::Standard(StandardId::new(raw).unwrap_or(StandardId::ZERO))
    }
}
