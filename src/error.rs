use std::io;
use thiserror::Error;

/// A probe engine error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A probe engine error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid payload size: {0}")]
    InvalidPayloadSize(usize),
    #[error("invalid config: {0}")]
    BadConfig(String),
    /// The echo capability could not be opened for the target address family.
    ///
    /// This is recovered per-probe: the probe is abandoned before the sent
    /// counter moves and the next scheduled tick tries again independently.
    #[error("echo capability unavailable: {0}")]
    CapabilityUnavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Session setup failed, e.g. a worker or scheduler thread could not be
    /// spawned.  These abort session start and propagate to the caller.
    #[error("session setup failed: {0}")]
    SetupFailed(String),
    #[error("probe engine error: {0}")]
    Other(String),
}
