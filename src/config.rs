use crate::types::PayloadSize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `payload-size`.
    ///
    /// A size of `0` selects the versioned signature payload.
    pub const DEFAULT_PAYLOAD_SIZE: u16 = 0;

    /// The default value for `timeout`.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

    /// The default value for `tick-interval`.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

    /// The default value for `history-capacity`.
    pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

    /// The default value for `min-workers`.
    pub const DEFAULT_MIN_WORKERS: usize = 0;

    /// The default value for `max-workers`.
    pub const DEFAULT_MAX_WORKERS: usize = 20;

    /// The default value for `worker-idle-timeout`.
    pub const DEFAULT_WORKER_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);
}

/// Probe execution configuration.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProbeConfig {
    /// The address of the endpoint to probe.
    pub target_addr: IpAddr,
    /// The requested echo payload size in bytes.
    pub payload_size: PayloadSize,
    /// The maximum time to wait for an echo reply.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            payload_size: PayloadSize(defaults::DEFAULT_PAYLOAD_SIZE),
            timeout: defaults::DEFAULT_TIMEOUT,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PoolConfig {
    /// The number of workers kept resident even when idle.
    pub min_workers: usize,
    /// The hard cap on concurrently running workers.
    pub max_workers: usize,
    /// How long a worker above `min_workers` may sit idle before retiring.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: defaults::DEFAULT_MIN_WORKERS,
            max_workers: defaults::DEFAULT_MAX_WORKERS,
            idle_timeout: defaults::DEFAULT_WORKER_IDLE_TIMEOUT,
        }
    }
}

/// Statistics configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StatsConfig {
    /// The number of latency samples to retain.
    ///
    /// Once the capacity has been reached the oldest sample is overwritten
    /// (FIFO).
    pub history_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            history_capacity: defaults::DEFAULT_HISTORY_CAPACITY,
        }
    }
}
