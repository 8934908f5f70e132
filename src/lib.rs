//! `korri-can-udp` library: a `no_std` tunnel carrying classic CAN frames over
//! a UDP datagram link to a remote CAN-to-Ethernet adapter. The crate exposes
//! the infrastructure modules (byte ring, frame codec), the transport layer
//! (packet framing, collaborator traits) and the assembled link (egress
//! scheduling, heartbeat supervision, async runner).
#![cfg_attr(not(test), no_std)]
//==================================================================================
/// Configuration, lifecycle, framing and runner errors.
pub mod error;
/// Byte ring buffering the inbound stream and the fixed CAN message codec.
pub mod infra;
/// Packet transport and the assembled tunnel.
pub mod protocol;
//==================================================================================
