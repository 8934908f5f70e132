//! Pull-based packet decoder: reads bytes from a [`LinkDriver`] until one
//! complete packet is framed, resynchronizing on the next `STX` whenever the
//! candidate turns out to be corrupt.
use crate::protocol::transport::{
    packet::{checksum, Packet, PacketType},
    traits::link_driver::LinkDriver,
    ETX, MAX_PACKET_LEN, MAX_PACKET_PAYLOAD, PACKET_OVERHEAD, STX,
};

//==================================================================================Enums and Structs
/// State of the bytes currently held as a packet candidate.
#[derive(Debug, PartialEq, Eq)]
enum Candidate {
    /// More bytes are needed.
    Incomplete,
    /// A full, valid packet spanning `consumed` bytes.
    Complete { packet: Packet, consumed: usize },
    /// The candidate cannot be a packet.
    Corrupt,
}

/// Incremental decoder. Bytes pulled from the driver are kept until they form
/// a packet or are discarded as noise.
#[derive(Debug, Clone)]
pub struct PacketDecoder {
    buffer: [u8; MAX_PACKET_LEN],
    filled: usize,
    resyncs: u32,
    discarded: u32,
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_PACKET_LEN],
            filled: 0,
            resyncs: 0,
            discarded: 0,
        }
    }

    //==================================================================================Process Functions
    /// Pull bytes from `driver` until one packet is complete.
    ///
    /// Returns `None` once the driver runs dry without completing a packet;
    /// partial bytes stay buffered for the next call. Corrupt candidates are
    /// dropped up to the next `STX` and decoding resumes from there.
    pub fn poll<D: LinkDriver>(&mut self, driver: &mut D) -> Option<Packet> {
        loop {
            match self.check() {
                Candidate::Complete { packet, consumed } => {
                    self.consume(consumed);
                    return Some(packet);
                }
                Candidate::Corrupt => {
                    self.resync();
                    continue;
                }
                Candidate::Incomplete => {}
            }

            if driver.available() == 0 {
                return None;
            }
            let byte = driver.read()?;
            self.buffer[self.filled] = byte;
            self.filled += 1;
        }
    }

    /// Forget the current candidate.
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// Bytes held in the current candidate.
    #[inline]
    pub fn pending(&self) -> usize {
        self.filled
    }

    /// Corrupt candidates abandoned after a valid `STX`.
    #[inline]
    pub fn resyncs(&self) -> u32 {
        self.resyncs
    }

    /// Bytes thrown away as noise.
    #[inline]
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    //==================================================================================Helpers
    fn check(&self) -> Candidate {
        if self.filled == 0 {
            return Candidate::Incomplete;
        }
        if self.buffer[0] != STX {
            return Candidate::Corrupt;
        }
        if self.filled < 2 {
            return Candidate::Incomplete;
        }
        let Some(kind) = PacketType::from_u8(self.buffer[1]) else {
            return Candidate::Corrupt;
        };
        if self.filled < 3 {
            return Candidate::Incomplete;
        }
        let len = self.buffer[2] as usize;
        if len > MAX_PACKET_PAYLOAD {
            return Candidate::Corrupt;
        }

        let total = len + PACKET_OVERHEAD;
        if self.filled < total {
            return Candidate::Incomplete;
        }

        let payload = &self.buffer[3..3 + len];
        if self.buffer[3 + len] != checksum(self.buffer[1], payload)
            || self.buffer[4 + len] != ETX
        {
            return Candidate::Corrupt;
        }

        match Packet::new(kind, payload) {
            Ok(packet) => Candidate::Complete {
                packet,
                consumed: total,
            },
            Err(_) => Candidate::Corrupt,
        }
    }

    /// Drop `count` leading bytes, keeping whatever follows.
    fn consume(&mut self, count: usize) {
        self.buffer.copy_within(count..self.filled, 0);
        self.filled -= count;
    }

    /// Skip the leading byte and realign on the next `STX` already buffered.
    fn resync(&mut self) {
        if self.buffer[0] == STX {
            self.resyncs = self.resyncs.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("Corrupt packet candidate ({} bytes), resynchronizing", self.filled);
        }

        let skip = self.buffer[1..self.filled]
            .iter()
            .position(|byte| *byte == STX)
            .map_or(self.filled, |offset| offset + 1);

        self.discarded = self.discarded.wrapping_add(skip as u32);
        self.consume(skip);
    }
}
