use crate::error::{Error, Result};
use crate::types::{MaxProbes, ProbeSeq, SessionId};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The periodic probe driver.
///
/// Fires one tick immediately and then one per interval until stopped or
/// until the optional probe budget is exhausted.  The scheduler holds no
/// probe state of its own; stopping it only stops new ticks and never
/// cancels work already handed to the pool.
pub(crate) struct Scheduler {
    shared: Arc<SchedulerShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct SchedulerShared {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl Scheduler {
    pub(crate) fn start<F>(
        session_id: SessionId,
        interval: Duration,
        max_probes: Option<MaxProbes>,
        tick: F,
    ) -> Result<Self>
    where
        F: Fn(ProbeSeq) + Send + 'static,
    {
        let shared = Arc::new(SchedulerShared {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let handle = thread::Builder::new()
            .name(format!("pingmon-scheduler-{}", session_id.0))
            .spawn({
                let shared = Arc::clone(&shared);
                move || run(&shared, interval, max_probes, &tick)
            })
            .map_err(|err| Error::SetupFailed(err.to_string()))?;
        Ok(Self {
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop ticking and join the scheduler thread.  Idempotent.
    pub(crate) fn stop(&self) {
        *self.shared.stopped.lock() = true;
        self.shared.wake.notify_all();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("scheduler thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("stopped", &*self.shared.stopped.lock())
            .finish_non_exhaustive()
    }
}

fn run<F: Fn(ProbeSeq)>(
    shared: &SchedulerShared,
    interval: Duration,
    max_probes: Option<MaxProbes>,
    tick: &F,
) {
    let mut seq = ProbeSeq(0);
    loop {
        if *shared.stopped.lock() {
            return;
        }
        seq += ProbeSeq(1);
        tick(seq);
        if let Some(max) = max_probes {
            if seq.0 >= max.0.get() as u64 {
                tracing::debug!(ticks = seq.0, "probe budget exhausted");
                return;
            }
        }
        let deadline = Instant::now() + interval;
        let mut stopped = shared.stopped.lock();
        while !*stopped {
            if shared.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        if *stopped {
            return;
        }
    }
}
