//! Pingmon - A network reachability probe engine.
//!
//! This crate provides a background probing engine which periodically sends
//! echo probes to a single target and maintains rolling reachability
//! statistics: sent, completed and lost counts, mismatch counters, a bounded
//! round trip history and min/avg/max/last aggregates.
//!
//! The echo transport is pluggable: the engine drives any
//! [`ChannelFactory`], so probes may travel over ICMP, UDP or an in-memory
//! fake in tests. Probes run on a dynamically sized worker pool so a slow or
//! timed-out probe never delays the next tick.
//!
//! # Example
//!
//! The following example builds a session which probes `1.1.1.1` once per
//! second and prints a statistics snapshot after each probe:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use pingmon::{Builder, Event};
//! # use pingmon::{ChannelFactory, EchoChannel};
//! # struct IcmpFactory;
//! # impl ChannelFactory for IcmpFactory {
//! #     fn open(&self, _: IpAddr) -> pingmon::Result<Box<dyn EchoChannel>> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! let addr = IpAddr::from_str("1.1.1.1")?;
//! let session = Builder::new(addr).build()?;
//! session.start_with(IcmpFactory, |event| {
//!     if let Event::ProbeCompleted(snapshot) = event {
//!         println!("{:?}", snapshot);
//!     }
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Session`].
//! - [`Session::start`] - Start probing in the background.
//! - [`Session::snapshot`] - Take a statistics snapshot on demand.
//! - [`ChannelFactory`] - Supply the echo transport.
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

mod builder;
mod config;
mod constants;
mod error;
mod net;
mod payload;
mod pool;
mod probe;
mod scheduler;
mod session;
mod stats;
mod types;

pub use builder::Builder;
pub use config::{defaults, PoolConfig, ProbeConfig, StatsConfig};
pub use constants::{MAX_PAYLOAD_SIZE, SIGNATURE_PAYLOAD_SIZE};
pub use error::{Error, Result};
pub use net::{ChannelFactory, EchoChannel, EchoReply, EchoStatus};
pub use probe::{ProbeOutcome, ProbeSample};
pub use session::{Event, Session};
pub use stats::Snapshot;
pub use types::{MaxProbes, PayloadSize, ProbeSeq, SessionId};
