//! Infrastructure building blocks: the inbound byte ring and the CAN message codec.
pub mod codec;
pub mod ring;
