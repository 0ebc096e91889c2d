use crate::probe::{ProbeOutcome, ProbeSample};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Sentinel for "no round trip time recorded yet".
const UNSET: u64 = u64::MAX;

/// Thread-safe probe statistics.
///
/// Counters are independent atomics and need no lock; only the sample
/// history takes a mutex, since concurrent workers must not race on the ring
/// position.
#[derive(Debug)]
pub(crate) struct StatsStore {
    /// Probes sent (incremented only after the capability was acquired).
    sent: AtomicU64,
    /// Probe attempts completed, successful or not.
    completed: AtomicU64,
    /// Probes classified as lost.
    lost: AtomicU64,
    /// Replies from an unexpected source address.
    addr_mismatch: AtomicU64,
    /// Replies whose payload failed the byte-for-byte comparison.
    payload_mismatch: AtomicU64,
    /// Round trip time of the most recent non-lost probe, in microseconds.
    last_micros: AtomicU64,
    /// Smallest round trip time observed, in microseconds.
    min_micros: AtomicU64,
    /// Largest round trip time observed, in microseconds.
    max_micros: AtomicU64,
    history: Mutex<RingBuffer<ProbeSample>>,
}

impl StatsStore {
    pub(crate) fn new(history_capacity: usize) -> Self {
        Self {
            sent: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            lost: AtomicU64::new(0),
            addr_mismatch: AtomicU64::new(0),
            payload_mismatch: AtomicU64::new(0),
            last_micros: AtomicU64::new(UNSET),
            min_micros: AtomicU64::new(UNSET),
            max_micros: AtomicU64::new(0),
            history: Mutex::new(RingBuffer::new(history_capacity)),
        }
    }

    /// Record that a probe was sent.
    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the completion of a probe attempt.
    ///
    /// The completed counter moves exactly once per attempted send,
    /// regardless of which failure flags fired.  Min/max/last are updated
    /// from non-lost samples only; lost probes contribute the loss sentinel
    /// to the history instead.
    pub(crate) fn record_completed(&self, outcome: &ProbeOutcome) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if outcome.lost {
            self.lost.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.addr_mismatch {
            self.addr_mismatch.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.payload_mismatch {
            self.payload_mismatch.fetch_add(1, Ordering::Relaxed);
        }
        let sample = match outcome.round_trip {
            Some(rtt) if !outcome.lost => {
                let micros = u64::try_from(rtt.as_micros())
                    .unwrap_or(UNSET - 1)
                    .min(UNSET - 1);
                self.last_micros.store(micros, Ordering::Relaxed);
                self.min_micros.fetch_min(micros, Ordering::Relaxed);
                self.max_micros.fetch_max(micros, Ordering::Relaxed);
                ProbeSample::Received(rtt)
            }
            _ => ProbeSample::Lost,
        };
        self.history.lock().push(sample);
    }

    /// Take a consistent snapshot of the current statistics.
    pub(crate) fn snapshot(&self) -> Snapshot {
        // Counter reads happen under the history lock so a snapshot never
        // shows a sample without its counter update.
        let history = self.history.lock();
        let min = self.min_micros.load(Ordering::Relaxed);
        // min is UNSET until the first non-lost sample; max shares that
        // lifecycle and carries no sentinel of its own.
        let max = (min != UNSET).then(|| self.max_micros.load(Ordering::Relaxed));
        Snapshot {
            sent: self.sent.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            addr_mismatch: self.addr_mismatch.load(Ordering::Relaxed),
            payload_mismatch: self.payload_mismatch.load(Ordering::Relaxed),
            last: duration_from(self.last_micros.load(Ordering::Relaxed)),
            min: duration_from(min),
            max: max.map(Duration::from_micros),
            samples: history.iter().copied().collect(),
        }
    }
}

fn duration_from(micros: u64) -> Option<Duration> {
    (micros != UNSET).then(|| Duration::from_micros(micros))
}

/// An immutable view of the statistics at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    sent: u64,
    completed: u64,
    lost: u64,
    addr_mismatch: u64,
    payload_mismatch: u64,
    last: Option<Duration>,
    min: Option<Duration>,
    max: Option<Duration>,
    samples: Vec<ProbeSample>,
}

impl Snapshot {
    /// The total number of probes sent.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// The total number of probe attempts completed.
    ///
    /// This counts attempt completion, not success: every probe for which a
    /// send was attempted completes exactly once, lost or not.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    /// The total number of probes lost.
    #[must_use]
    pub const fn lost(&self) -> u64 {
        self.lost
    }

    /// The total number of replies from an unexpected source address.
    #[must_use]
    pub const fn addr_mismatch(&self) -> u64 {
        self.addr_mismatch
    }

    /// The total number of replies with a corrupted payload.
    #[must_use]
    pub const fn payload_mismatch(&self) -> u64 {
        self.payload_mismatch
    }

    /// The round trip time of the most recent non-lost probe.
    #[must_use]
    pub const fn last(&self) -> Option<Duration> {
        self.last
    }

    /// The smallest round trip time observed.
    #[must_use]
    pub const fn min(&self) -> Option<Duration> {
        self.min
    }

    /// The largest round trip time observed.
    #[must_use]
    pub const fn max(&self) -> Option<Duration> {
        self.max
    }

    /// The resident samples, oldest first.
    ///
    /// Holds at most the configured history capacity; once full, each new
    /// sample evicts the oldest.
    #[must_use]
    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    /// The mean round trip time over the resident non-lost samples.
    ///
    /// This is a windowed average: it reflects only the samples currently in
    /// the history, not all-time history, and is recomputed on every call.
    #[must_use]
    pub fn avg(&self) -> Option<Duration> {
        let received: Vec<Duration> = self
            .samples
            .iter()
            .filter_map(|sample| sample.round_trip())
            .collect();
        if received.is_empty() {
            None
        } else {
            Some(received.iter().sum::<Duration>() / received.len() as u32)
        }
    }

    /// The windowed average in fractional milliseconds, 0 when no samples.
    #[must_use]
    pub fn avg_ms(&self) -> f64 {
        self.avg()
            .map_or(0_f64, |avg| avg.as_secs_f64() * 1000_f64)
    }

    /// The round trip time of the most recent non-lost probe in fractional
    /// milliseconds.
    #[must_use]
    pub fn last_ms(&self) -> Option<f64> {
        self.last.map(|last| last.as_secs_f64() * 1000_f64)
    }

    /// The smallest round trip time observed in fractional milliseconds.
    #[must_use]
    pub fn min_ms(&self) -> Option<f64> {
        self.min.map(|min| min.as_secs_f64() * 1000_f64)
    }

    /// The largest round trip time observed in fractional milliseconds.
    #[must_use]
    pub fn max_ms(&self) -> Option<f64> {
        self.max.map(|max| max.as_secs_f64() * 1000_f64)
    }

    /// The % of probes that were lost.
    #[must_use]
    pub fn loss_pct(&self) -> f64 {
        if self.sent > 0 {
            self.lost as f64 / self.sent as f64 * 100_f64
        } else {
            0_f64
        }
    }
}

/// A fixed-capacity sample store.
///
/// Writes overwrite the oldest slot once full.  The logical count never
/// exceeds the capacity.
#[derive(Debug)]
pub(crate) struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// The next slot to overwrite once the buffer is full.
    write: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            write: 0,
        }
    }

    pub(crate) fn push(&mut self, item: T) {
        if self.buf.len() < self.capacity {
            self.buf.push(item);
        } else {
            self.buf[self.write] = item;
        }
        self.write = (self.write + 1) % self.capacity;
    }

    /// The number of samples currently resident.
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Positional read, oldest first.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        if index >= self.buf.len() {
            None
        } else if self.buf.len() < self.capacity {
            self.buf.get(index)
        } else {
            self.buf.get((self.write + index) % self.capacity)
        }
    }

    /// Iterate the resident samples, oldest first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len()).filter_map(|index| self.get(index))
    }
}
