use crate::config::{defaults, PoolConfig, ProbeConfig, StatsConfig};
use crate::constants::MAX_PAYLOAD_SIZE;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{MaxProbes, PayloadSize, SessionId};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Build a reachability probe [`Session`].
///
/// # Examples
///
/// Build a session which probes `192.0.2.1` every 500ms with a 64 byte
/// payload:
///
/// ```
/// use pingmon::Builder;
/// use std::net::{IpAddr, Ipv4Addr};
/// use std::time::Duration;
///
/// let session = Builder::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
///     .payload_size(64)
///     .tick_interval(Duration::from_millis(500))
///     .build()?;
/// # Ok::<(), pingmon::Error>(())
/// ```
#[derive(Debug)]
pub struct Builder {
    target_addr: IpAddr,
    session_id: SessionId,
    payload_size: PayloadSize,
    timeout: Duration,
    tick_interval: Duration,
    history_capacity: usize,
    min_workers: usize,
    max_workers: usize,
    worker_idle_timeout: Duration,
    max_probes: Option<usize>,
}

impl Builder {
    /// Build a probe session for a target address.
    #[must_use]
    pub fn new(target_addr: IpAddr) -> Self {
        Self {
            target_addr,
            session_id: SessionId(0),
            payload_size: PayloadSize(defaults::DEFAULT_PAYLOAD_SIZE),
            timeout: defaults::DEFAULT_TIMEOUT,
            tick_interval: defaults::DEFAULT_TICK_INTERVAL,
            history_capacity: defaults::DEFAULT_HISTORY_CAPACITY,
            min_workers: defaults::DEFAULT_MIN_WORKERS,
            max_workers: defaults::DEFAULT_MAX_WORKERS,
            worker_idle_timeout: defaults::DEFAULT_WORKER_IDLE_TIMEOUT,
            max_probes: None,
        }
    }

    /// Set the session identifier.
    ///
    /// Distinguishes the threads and events of concurrent sessions.
    #[must_use]
    pub const fn session_id(self, session_id: u16) -> Self {
        Self {
            session_id: SessionId(session_id),
            ..self
        }
    }

    /// Set the number of payload bytes sent with each probe.
    ///
    /// A size of `0` sends the built-in signature payload.
    #[must_use]
    pub const fn payload_size(self, payload_size: u16) -> Self {
        Self {
            payload_size: PayloadSize(payload_size),
            ..self
        }
    }

    /// Set how long each probe waits for a reply.
    #[must_use]
    pub const fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Set the interval between probes.
    #[must_use]
    pub const fn tick_interval(self, tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..self
        }
    }

    /// Set the number of round trip samples retained in the history.
    ///
    /// Older samples are overwritten once the capacity is reached.
    #[must_use]
    pub const fn history_capacity(self, history_capacity: usize) -> Self {
        Self {
            history_capacity,
            ..self
        }
    }

    /// Set the number of worker threads kept resident while idle.
    #[must_use]
    pub const fn min_workers(self, min_workers: usize) -> Self {
        Self {
            min_workers,
            ..self
        }
    }

    /// Set the maximum number of concurrent worker threads.
    #[must_use]
    pub const fn max_workers(self, max_workers: usize) -> Self {
        Self {
            max_workers,
            ..self
        }
    }

    /// Set how long an idle worker above the minimum lingers before it
    /// retires.
    #[must_use]
    pub const fn worker_idle_timeout(self, worker_idle_timeout: Duration) -> Self {
        Self {
            worker_idle_timeout,
            ..self
        }
    }

    /// Set the maximum number of probes to schedule before the session
    /// stops ticking, or `None` to probe until stopped.
    #[must_use]
    pub const fn max_probes(self, max_probes: Option<usize>) -> Self {
        Self { max_probes, ..self }
    }

    /// Validate the configuration and build the [`Session`].
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn build(self) -> Result<Session> {
        if self.payload_size.0 > MAX_PAYLOAD_SIZE {
            return Err(Error::InvalidPayloadSize(usize::from(self.payload_size.0)));
        }
        if self.timeout.is_zero() {
            return Err(Error::BadConfig(String::from("timeout must be non-zero")));
        }
        if self.tick_interval.is_zero() {
            return Err(Error::BadConfig(String::from(
                "tick_interval must be non-zero",
            )));
        }
        if self.history_capacity < 1 {
            return Err(Error::BadConfig(String::from(
                "history_capacity must be at least 1",
            )));
        }
        if self.max_workers < 1 {
            return Err(Error::BadConfig(String::from(
                "max_workers must be at least 1",
            )));
        }
        if self.min_workers > self.max_workers {
            return Err(Error::BadConfig(format!(
                "min_workers ({}) must not exceed max_workers ({})",
                self.min_workers, self.max_workers
            )));
        }
        let max_probes = match self.max_probes {
            Some(max_probes) => Some(MaxProbes(NonZeroUsize::new(max_probes).ok_or_else(
                || Error::BadConfig(String::from("max_probes must be non-zero")),
            )?)),
            None => None,
        };
        Ok(Session::new(
            self.session_id,
            ProbeConfig {
                target_addr: self.target_addr,
                payload_size: self.payload_size,
                timeout: self.timeout,
            },
            PoolConfig {
                min_workers: self.min_workers,
                max_workers: self.max_workers,
                idle_timeout: self.worker_idle_timeout,
            },
            StatsConfig {
                history_capacity: self.history_capacity,
            },
            self.tick_interval,
            max_probes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

    #[test]
    fn test_builder_defaults() {
        let session = Builder::new(TARGET).build().unwrap();
        assert_eq!(TARGET, session.target_addr());
        assert_eq!(PayloadSize(0), session.payload_size());
        assert_eq!(Duration::from_millis(1000), session.timeout());
        assert_eq!(Duration::from_millis(1000), session.tick_interval());
        assert_eq!(256, session.history_capacity());
        assert_eq!(None, session.max_probes());
    }

    #[test]
    fn test_builder_custom() {
        let session = Builder::new(TARGET)
            .session_id(7)
            .payload_size(64)
            .timeout(Duration::from_millis(250))
            .tick_interval(Duration::from_millis(100))
            .history_capacity(32)
            .max_probes(Some(10))
            .build()
            .unwrap();
        assert_eq!(SessionId(7), session.session_id());
        assert_eq!(PayloadSize(64), session.payload_size());
        assert_eq!(Duration::from_millis(250), session.timeout());
        assert_eq!(Duration::from_millis(100), session.tick_interval());
        assert_eq!(32, session.history_capacity());
        assert_eq!(
            Some(MaxProbes(NonZeroUsize::new(10).unwrap())),
            session.max_probes()
        );
    }

    #[test]
    fn test_builder_payload_size_max() {
        assert!(Builder::new(TARGET)
            .payload_size(MAX_PAYLOAD_SIZE)
            .build()
            .is_ok());
    }

    #[test]
    fn test_builder_payload_size_too_large() {
        let err = Builder::new(TARGET)
            .payload_size(MAX_PAYLOAD_SIZE + 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayloadSize(65501)));
    }

    #[test]
    fn test_builder_zero_timeout() {
        let err = Builder::new(TARGET)
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }

    #[test]
    fn test_builder_zero_tick_interval() {
        let err = Builder::new(TARGET)
            .tick_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }

    #[test]
    fn test_builder_zero_history_capacity() {
        let err = Builder::new(TARGET).history_capacity(0).build().unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }

    #[test]
    fn test_builder_zero_max_workers() {
        let err = Builder::new(TARGET).max_workers(0).build().unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }

    #[test]
    fn test_builder_min_workers_exceeds_max() {
        let err = Builder::new(TARGET)
            .min_workers(5)
            .max_workers(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }

    #[test]
    fn test_builder_zero_max_probes() {
        let err = Builder::new(TARGET)
            .max_probes(Some(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadConfig(_)));
    }
}
