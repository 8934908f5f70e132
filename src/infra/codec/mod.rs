//! Binary codecs used by the tunnel.
pub mod frame;
