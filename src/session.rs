use crate::config::{PoolConfig, ProbeConfig, StatsConfig};
use crate::error::{Error, Result};
use crate::net::ChannelFactory;
use crate::pool::WorkerPool;
use crate::probe::execute_probe;
use crate::scheduler::Scheduler;
use crate::stats::{Snapshot, StatsStore};
use crate::types::{MaxProbes, PayloadSize, SessionId};
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// A notification delivered to the consumer of a session.
#[derive(Debug, Clone)]
pub enum Event {
    /// A probe attempt completed.
    ///
    /// Carries a consistent snapshot of the statistics including the sample
    /// history, suitable for display or charting.
    ProbeCompleted(Snapshot),
    /// The echo capability could not be opened for this tick.
    ///
    /// A session-level warning, not fatal: the probe was abandoned before
    /// being counted as sent and the next tick tries again independently.
    CapabilityUnavailable(String),
}

/// A reachability probe session.
///
/// See the [`crate`] documentation for more information.
///
/// Note that this type is cheaply cloneable.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a `Session`.
    ///
    /// Use the [`crate::Builder`] type to create a [`Session`].
    pub(crate) fn new(
        session_id: SessionId,
        probe_config: ProbeConfig,
        pool_config: PoolConfig,
        stats_config: StatsConfig,
        tick_interval: Duration,
        max_probes: Option<MaxProbes>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                session_id,
                probe_config,
                pool_config,
                stats_config,
                tick_interval,
                max_probes,
                stats: Arc::new(StatsStore::new(stats_config.history_capacity)),
                running: Mutex::new(None),
            }),
        }
    }

    /// Start probing without an event handler.
    ///
    /// Statistics remain available via [`Session::snapshot`].
    pub fn start<T>(&self, factory: T) -> Result<()>
    where
        T: ChannelFactory + Send + Sync + 'static,
    {
        self.start_with(factory, |_| ())
    }

    /// Start probing, delivering an [`Event`] to `handler` after every
    /// completed probe.
    ///
    /// Spawns the worker pool and the scheduler; the first probe is
    /// enqueued immediately and one more per tick interval thereafter.
    /// Setup failures (e.g. a thread could not be spawned) are fatal and
    /// surface synchronously; per-probe failures after that are recovered
    /// into the statistics and events.
    pub fn start_with<T, F>(&self, factory: T, handler: F) -> Result<()>
    where
        T: ChannelFactory + Send + Sync + 'static,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.start(Arc::new(factory), Arc::new(handler))
    }

    /// Take a snapshot of the session statistics.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.stats.snapshot()
    }

    /// Stop the session.
    ///
    /// Stops the scheduler, drains in-flight probes (which run to
    /// completion or timeout, never force-killed) and joins all threads.
    /// Idempotent; also invoked when the last `Session` clone is dropped.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// The target address of the session.
    #[must_use]
    pub fn target_addr(&self) -> IpAddr {
        self.inner.probe_config.target_addr
    }

    /// The payload size of the session.
    #[must_use]
    pub fn payload_size(&self) -> PayloadSize {
        self.inner.probe_config.payload_size
    }

    /// The echo timeout of the session.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.probe_config.timeout
    }

    /// The tick interval of the session.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.inner.tick_interval
    }

    /// The sample history capacity of the session.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.inner.stats_config.history_capacity
    }

    /// The maximum number of probes of the session.
    #[must_use]
    pub fn max_probes(&self) -> Option<MaxProbes> {
        self.inner.max_probes
    }

    /// The session identifier.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }
}

#[derive(Debug)]
struct SessionInner {
    session_id: SessionId,
    probe_config: ProbeConfig,
    pool_config: PoolConfig,
    stats_config: StatsConfig,
    tick_interval: Duration,
    max_probes: Option<MaxProbes>,
    stats: Arc<StatsStore>,
    running: Mutex<Option<Running>>,
}

#[derive(Debug)]
struct Running {
    scheduler: Scheduler,
    pool: Arc<WorkerPool>,
}

impl SessionInner {
    #[instrument(skip_all, fields(session_id = self.session_id.0), level = "debug")]
    fn start(
        self: &Arc<Self>,
        factory: Arc<dyn ChannelFactory + Send + Sync>,
        handler: Arc<dyn Fn(&Event) + Send + Sync>,
    ) -> Result<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(Error::SetupFailed(String::from("session already started")));
        }
        tracing::debug!(
            probe_config = ?self.probe_config,
            pool_config = ?self.pool_config,
            stats_config = ?self.stats_config,
            tick_interval = ?self.tick_interval,
            "starting session"
        );
        let pool = Arc::new(WorkerPool::new(self.pool_config)?);
        let scheduler = {
            let pool = Arc::clone(&pool);
            let stats = Arc::clone(&self.stats);
            let probe_config = self.probe_config;
            Scheduler::start(
                self.session_id,
                self.tick_interval,
                self.max_probes,
                move |seq| {
                    let factory = Arc::clone(&factory);
                    let handler = Arc::clone(&handler);
                    let stats = Arc::clone(&stats);
                    pool.submit(move || {
                        execute_probe(seq, &probe_config, factory.as_ref(), &stats, &|event| {
                            handler(event);
                        });
                    });
                },
            )
        };
        let scheduler = match scheduler {
            Ok(scheduler) => scheduler,
            Err(err) => {
                pool.shutdown();
                return Err(err);
            }
        };
        *running = Some(Running { scheduler, pool });
        Ok(())
    }

    #[instrument(skip_all, fields(session_id = self.session_id.0), level = "debug")]
    fn stop(&self) {
        let running = self.running.lock().take();
        if let Some(running) = running {
            running.scheduler.stop();
            running.pool.shutdown();
            tracing::debug!("session stopped");
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.stop();
    }
}
