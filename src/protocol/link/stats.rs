//! Counters describing what the tunnel absorbed instead of reporting as errors.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Datagrams from the configured peer, fed to the ring.
    pub datagrams_accepted: u32,
    /// Datagrams from any other sender, discarded.
    pub datagrams_rejected: u32,
    /// Inbound bytes lost because the ring was full.
    pub bytes_dropped: u32,
    /// Packets framed successfully.
    pub packets_decoded: u32,
    /// Corrupt packet candidates abandoned by the decoder.
    pub resyncs: u32,
    /// Bytes skipped as noise while resynchronizing.
    pub noise_bytes: u32,
    /// Well-framed packets whose payload did not match their type.
    pub packets_malformed: u32,
    /// CAN frames delivered to the listener.
    pub frames_received: u32,
    /// CAN frames handed to the transport.
    pub frames_sent: u32,
    /// Heartbeat pings sent (including the one sent on open).
    pub pings_sent: u32,
    /// Ping replies received.
    pub ping_replies: u32,
    /// Transport sends that failed outright.
    pub send_errors: u32,
    /// Transport sends that queued fewer bytes than requested.
    pub short_writes: u32,
}
