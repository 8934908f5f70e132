//! Collaborator traits used by the tunnel (datagram transport, byte driver,
//! frame consumer, timer).
pub mod datagram_transport;
pub mod link_driver;
pub mod link_listener;
pub mod link_timer;
