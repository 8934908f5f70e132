//! Tunnel configuration: egress tick period, bandwidth ceiling and heartbeat
//! cadence, validated through a fluent builder.
use embassy_time::Duration;

use crate::error::ConfigError;
use crate::protocol::transport::{
    CAN_PACKET_LEN, DEFAULT_BANDWIDTH_BYTES_PER_SEC, DEFAULT_HEARTBEAT_TICKS,
    DEFAULT_TICK_INTERVAL_MS,
};

/// Validated tunnel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelConfig {
    tick_interval_ms: u32,
    bandwidth_bytes_per_sec: u32,
    heartbeat_ticks: u32,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            bandwidth_bytes_per_sec: DEFAULT_BANDWIDTH_BYTES_PER_SEC,
            heartbeat_ticks: DEFAULT_HEARTBEAT_TICKS,
        }
    }
}

impl TunnelConfig {
    /// Builder pre-loaded with the defaults (50 ms, 38400 B/s, 10 ticks).
    pub fn builder() -> TunnelConfigBuilder {
        TunnelConfigBuilder::new()
    }

    /// Egress timer period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms as u64)
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.tick_interval_ms
    }

    pub fn bandwidth_bytes_per_sec(&self) -> u32 {
        self.bandwidth_bytes_per_sec
    }

    /// Ticks between two heartbeat checkpoints.
    pub fn heartbeat_ticks(&self) -> u32 {
        self.heartbeat_ticks
    }

    /// Bytes the egress scheduler may put on the wire per tick.
    pub fn budget_bytes(&self) -> usize {
        budget_bytes(self.bandwidth_bytes_per_sec, self.tick_interval_ms)
    }
}

fn budget_bytes(bandwidth_bytes_per_sec: u32, tick_interval_ms: u32) -> usize {
    (bandwidth_bytes_per_sec as u64 * tick_interval_ms as u64 / 1000) as usize
}

//==================================================================================CONFIG_BUILDER
#[derive(Debug, Clone, Copy)]
/// Fluent builder checking that every tick can carry at least one packet.
pub struct TunnelConfigBuilder {
    pub tick_interval_ms: u32,
    pub bandwidth_bytes_per_sec: u32,
    pub heartbeat_ticks: u32,
}

impl Default for TunnelConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TunnelConfigBuilder {
    pub fn new() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            bandwidth_bytes_per_sec: DEFAULT_BANDWIDTH_BYTES_PER_SEC,
            heartbeat_ticks: DEFAULT_HEARTBEAT_TICKS,
        }
    }

    /// Sets the egress tick period in milliseconds.
    pub fn with_tick_interval_ms(mut self, millis: u32) -> Self {
        self.tick_interval_ms = millis;
        self
    }

    /// Sets the sustained bandwidth ceiling in bytes per second.
    pub fn with_bandwidth(mut self, bytes_per_sec: u32) -> Self {
        self.bandwidth_bytes_per_sec = bytes_per_sec;
        self
    }

    /// Sets how many ticks separate two heartbeat checkpoints.
    pub fn with_heartbeat_ticks(mut self, ticks: u32) -> Self {
        self.heartbeat_ticks = ticks;
        self
    }

    pub fn build(self) -> Result<TunnelConfig, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.heartbeat_ticks == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        if self.bandwidth_bytes_per_sec == 0 {
            return Err(ConfigError::ZeroBandwidth);
        }
        let budget = budget_bytes(self.bandwidth_bytes_per_sec, self.tick_interval_ms);
        if budget < CAN_PACKET_LEN {
            return Err(ConfigError::BudgetBelowPacket {
                budget,
                packet: CAN_PACKET_LEN,
            });
        }

        Ok(TunnelConfig {
            tick_interval_ms: self.tick_interval_ms,
            bandwidth_bytes_per_sec: self.bandwidth_bytes_per_sec,
            heartbeat_ticks: self.heartbeat_ticks,
        })
    }
}
