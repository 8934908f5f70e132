//! In-memory `LinkDriver` for unit tests.
use crate::protocol::transport::traits::link_driver::LinkDriver;
use std::collections::VecDeque;
use std::vec::Vec;

#[derive(Default)]
pub(crate) struct MemoryDriver {
    pub inbound: VecDeque<u8>,
    pub sent: Vec<Vec<u8>>,
    /// Caps the byte count accepted per write to simulate short writes.
    pub write_limit: Option<usize>,
}

impl MemoryDriver {
    pub fn with_inbound(bytes: &[u8]) -> Self {
        Self {
            inbound: bytes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }
}

impl LinkDriver for MemoryDriver {
    fn available(&self) -> usize {
        self.inbound.len()
    }

    fn flush(&mut self) {
        self.inbound.clear();
    }

    fn read(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.sent.push(data.to_vec());
        self.write_limit.map_or(data.len(), |limit| limit.min(data.len()))
    }
}
