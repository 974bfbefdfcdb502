use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for a single run.
///
/// Purpose:
/// - Track recipients handed to the worker pool
/// - Track terminal outcomes (sent / failed)
///
/// Design:
/// - Lock-free (Atomics)
/// - Owned by the coordinator, shared with feed and workers via `Arc`
#[derive(Debug, Default)]
pub struct RunMetrics {
    pub produced: AtomicUsize,
    pub sent: AtomicUsize,
    pub failed: AtomicUsize,
}

impl RunMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `RunMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub produced: usize,
    pub sent: usize,
    pub failed: usize,
}

impl MetricsSnapshot {
    /// True when every produced recipient reached exactly one outcome.
    pub fn is_balanced(&self) -> bool {
        self.sent + self.failed == self.produced
    }
}
