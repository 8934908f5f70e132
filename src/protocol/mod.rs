//! Tunnel protocol: packet transport over the datagram byte stream and the
//! link layer built on top of it (egress budget, heartbeat, supervisor).
pub mod link;
pub mod transport;
