use crate::error::Result;
use std::net::IpAddr;
use std::time::Duration;

/// An abstraction over the host's echo request/reply capability.
///
/// The engine does not implement ICMP itself; implementations of these
/// traits supply the round trip using whatever facility the host platform
/// provides.
///
/// A fresh channel is opened for every probe and never pooled.  Dropping the
/// channel releases the underlying capability, so release is deterministic
/// on every exit path, including timeout and error.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelFactory {
    /// Open an echo channel for the given target address family.
    ///
    /// Failure here is reported as [`Error::CapabilityUnavailable`]
    /// (crate::Error::CapabilityUnavailable): the probe is abandoned without
    /// being counted as an attempted send.
    fn open(&self, target: IpAddr) -> Result<Box<dyn EchoChannel>>;
}

/// A single-use echo channel.
#[cfg_attr(test, mockall::automock)]
pub trait EchoChannel: Send {
    /// Perform one echo request/reply round trip.
    ///
    /// Returns `Ok(None)` if no reply arrived within `timeout` and `Err` on
    /// a transport failure; both are classified as loss by the caller.
    fn send_echo(
        &mut self,
        target: IpAddr,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Option<EchoReply>>;
}

/// The reply to an echo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    /// The address the reply was received from.
    pub addr: IpAddr,
    /// The payload carried by the reply.
    pub payload: Vec<u8>,
    /// The round trip time reported by the transport.
    pub round_trip: Duration,
    /// The status reported by the transport for the exchange.
    pub status: EchoStatus,
}

impl EchoReply {
    #[must_use]
    pub const fn new(
        addr: IpAddr,
        payload: Vec<u8>,
        round_trip: Duration,
        status: EchoStatus,
    ) -> Self {
        Self {
            addr,
            payload,
            round_trip,
            status,
        }
    }
}

/// The status of an echo exchange as reported by the transport.
///
/// A reply carrying [`EchoStatus::Failure`] counts as loss even though a
/// payload arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoStatus {
    /// The exchange succeeded.
    Success,
    /// The remote stack reported a failure status.
    Failure,
}

impl EchoStatus {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
