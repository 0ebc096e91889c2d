use crate::config::ProbeConfig;
use crate::error::Result;
use crate::net::{ChannelFactory, EchoReply};
use crate::payload::make_payload;
use crate::session::Event;
use crate::stats::StatsStore;
use crate::types::ProbeSeq;
use std::net::IpAddr;
use std::time::Duration;
use tracing::instrument;

/// One completed round trip, or the loss sentinel.
///
/// Samples occupy implicit sequence positions in the statistics history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSample {
    /// The round trip time of a non-lost probe.
    Received(Duration),
    /// The probe was lost.
    Lost,
}

impl ProbeSample {
    /// The round trip time, if the probe was not lost.
    #[must_use]
    pub const fn round_trip(self) -> Option<Duration> {
        match self {
            Self::Received(rtt) => Some(rtt),
            Self::Lost => None,
        }
    }
}

/// The classified outcome of a single probe execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// The round trip time, `None` for lost probes.
    pub round_trip: Option<Duration>,
    /// Whether the probe counts as lost.
    ///
    /// Set for timeouts, transport failures and for replies carrying a
    /// failure status.
    pub lost: bool,
    /// Whether the reply arrived from an address other than the target.
    pub addr_mismatch: bool,
    /// Whether the reply payload differed from the payload sent.
    pub payload_mismatch: bool,
}

impl ProbeOutcome {
    pub(crate) const fn lost() -> Self {
        Self {
            round_trip: None,
            lost: true,
            addr_mismatch: false,
            payload_mismatch: false,
        }
    }
}

/// Execute a single probe from payload construction to notification.
///
/// Within one probe the steps are strictly sequential: acquire the channel,
/// record the send, perform the exchange, classify, record the completion
/// and notify the sink.  The sent counter moves only after the channel was
/// acquired; an open failure is surfaced as a session-level warning and the
/// next tick tries again independently.
#[instrument(skip_all, fields(seq = seq.0), level = "trace")]
pub(crate) fn execute_probe(
    seq: ProbeSeq,
    config: &ProbeConfig,
    factory: &dyn ChannelFactory,
    stats: &StatsStore,
    sink: &dyn Fn(&Event),
) {
    let mut channel = match factory.open(config.target_addr) {
        Ok(channel) => channel,
        Err(err) => {
            tracing::warn!(%err, "echo capability unavailable");
            sink(&Event::CapabilityUnavailable(err.to_string()));
            return;
        }
    };
    let payload = make_payload(config.payload_size);
    stats.record_sent();
    let result = channel.send_echo(config.target_addr, &payload, config.timeout);
    // Release the capability before classification and notification.
    drop(channel);
    let outcome = classify(config.target_addr, &payload, result);
    stats.record_completed(&outcome);
    sink(&Event::ProbeCompleted(stats.snapshot()));
}

/// Classify the result of one echo exchange.
///
/// No reply, a transport error and a reply with a failure status all count
/// as loss.  The mismatch flags are independent of the loss classification
/// and of each other: a reply may simultaneously come from an unexpected
/// address and carry a corrupted payload.
pub(crate) fn classify(
    target: IpAddr,
    sent_payload: &[u8],
    result: Result<Option<EchoReply>>,
) -> ProbeOutcome {
    match result {
        Ok(Some(reply)) => {
            let lost = !reply.status.is_success();
            // v4-mapped v6 replies compare equal to their v4 form.
            let addr_mismatch = reply.addr.to_canonical() != target.to_canonical();
            let payload_mismatch = reply.payload != sent_payload;
            ProbeOutcome {
                round_trip: if lost { None } else { Some(reply.round_trip) },
                lost,
                addr_mismatch,
                payload_mismatch,
            }
        }
        Ok(None) => ProbeOutcome::lost(),
        Err(err) => {
            tracing::trace!(%err, "echo exchange failed");
            ProbeOutcome::lost()
        }
    }
}
