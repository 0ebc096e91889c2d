use crate::config::PoolConfig;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::{fmt, thread};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A bounded-concurrency task executor.
///
/// Tasks run on at most `max_workers` OS threads.  Idle workers above
/// `min_workers` retire after `idle_timeout`.  Submission never blocks and
/// tasks are never rejected while the pool is running, so the pending queue
/// is unbounded: under sustained saturation the backlog grows without limit
/// and callers who need backpressure must bound their submission rate
/// themselves.
///
/// Completion order across tasks is not guaranteed to match submission
/// order.
pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

struct PoolShared {
    config: PoolConfig,
    state: Mutex<PoolState>,
    work_available: Condvar,
    next_worker_id: AtomicUsize,
}

#[derive(Default)]
struct PoolState {
    queue: VecDeque<Task>,
    workers: usize,
    idle: usize,
    shutdown: bool,
}

impl WorkerPool {
    /// Create the pool and spawn the minimum resident workers.
    pub(crate) fn new(config: PoolConfig) -> Result<Self> {
        let pool = Self {
            shared: Arc::new(PoolShared {
                config,
                state: Mutex::new(PoolState::default()),
                work_available: Condvar::new(),
                next_worker_id: AtomicUsize::new(0),
            }),
            handles: Mutex::new(Vec::new()),
        };
        for _ in 0..config.min_workers {
            pool.spawn_worker()?;
        }
        Ok(pool)
    }

    /// Submit a task for execution on any available worker.
    ///
    /// Non-blocking for the caller.  If no worker is idle and the cap has
    /// not been reached a new worker is spawned; otherwise the task queues
    /// until one frees up.  Tasks submitted after shutdown are dropped.
    pub(crate) fn submit<F: FnOnce() + Send + 'static>(&self, task: F) {
        let spawn_needed = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                tracing::trace!("task submitted after shutdown, dropped");
                return;
            }
            state.queue.push_back(Box::new(task));
            state.idle == 0 && state.workers < self.shared.config.max_workers
        };
        if spawn_needed {
            if let Err(err) = self.spawn_worker() {
                // The task stays queued for the existing workers.
                tracing::warn!(%err, "failed to grow worker pool");
            }
        }
        self.shared.work_available.notify_one();
    }

    /// Stop accepting tasks, drain the queue and join all workers.
    ///
    /// In-flight tasks run to completion and are never force-killed.
    pub(crate) fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.work_available.notify_all();
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
    }

    /// The number of live workers, for diagnostics.
    #[cfg(test)]
    pub(crate) fn worker_count(&self) -> usize {
        self.shared.state.lock().workers
    }

    fn spawn_worker(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let id = shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        shared.state.lock().workers += 1;
        let handle = thread::Builder::new()
            .name(format!("pingmon-worker-{id}"))
            .spawn(move || worker_loop(&shared))
            .map_err(|err| {
                self.shared.state.lock().workers -= 1;
                Error::SetupFailed(err.to_string())
            })?;
        self.handles.lock().push(handle);
        Ok(())
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("workers", &state.workers)
            .field("idle", &state.idle)
            .field("queued", &state.queue.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}

impl fmt::Debug for PoolShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolShared")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolState")
            .field("queued", &self.queue.len())
            .field("workers", &self.workers)
            .field("idle", &self.idle)
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

fn worker_loop(shared: &Arc<PoolShared>) {
    let mut state = shared.state.lock();
    loop {
        if let Some(task) = state.queue.pop_front() {
            drop(state);
            task();
            state = shared.state.lock();
            continue;
        }
        if state.shutdown {
            break;
        }
        state.idle += 1;
        let timed_out = shared
            .work_available
            .wait_for(&mut state, shared.config.idle_timeout)
            .timed_out();
        state.idle -= 1;
        if timed_out
            && state.queue.is_empty()
            && !state.shutdown
            && state.workers > shared.config.min_workers
        {
            break;
        }
    }
    state.workers -= 1;
}
