//! Pipeline counters and worker timing.
//!
//! Counters are relaxed atomics bumped from whichever thread owns the packet
//! at the time. Processing time is tracked on the worker thread only.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live pipeline metrics, shared by the pool, the worker and the dispatcher.
pub struct PipelineMetrics {
    /// Packets ever allocated by the pool
    allocated: AtomicU64,
    /// Pool acquisitions
    acquired: AtomicU64,
    /// Pool releases
    released: AtomicU64,
    /// Packets accepted by `submit`
    submitted: AtomicU64,
    /// Packets whose action succeeded
    processed: AtomicU64,
    /// Packets that arrived at the worker without an action
    dropped_no_action: AtomicU64,
    /// Packets whose action failed or panicked
    failed: AtomicU64,
    /// Completion callbacks run by the dispatcher
    callbacks_invoked: AtomicU64,
    /// Completion callbacks that panicked
    callback_panics: AtomicU64,
    /// Frames forwarded without entering the pipeline
    bypassed: AtomicU64,
    timing: Mutex<TimingTracker>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            allocated: AtomicU64::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            submitted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            dropped_no_action: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            callbacks_invoked: AtomicU64::new(0),
            callback_panics: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
            timing: Mutex::new(TimingTracker::new()),
        }
    }
}

/// Per-packet processing time, exponentially smoothed.
struct TimingTracker {
    average_us: f64,
    peak_us: f64,
    samples: u64,
}

impl TimingTracker {
    /// Smoothing factor for the running average.
    const ALPHA: f64 = 0.1;

    fn new() -> Self {
        Self {
            average_us: 0.0,
            peak_us: 0.0,
            samples: 0,
        }
    }

    fn record(&mut self, elapsed: Duration) {
        let us = elapsed.as_secs_f64() * 1_000_000.0;
        if self.samples == 0 {
            self.average_us = us;
        } else {
            self.average_us += Self::ALPHA * (us - self.average_us);
        }
        self.peak_us = self.peak_us.max(us);
        self.samples += 1;
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_allocated(&self) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful action and how long it took.
    ///
    /// The count is exact. The timing sample is best-effort: the worker never
    /// waits for the timing lock, so a sample taken while a snapshot holds it
    /// is skipped.
    pub(crate) fn record_processed(&self, elapsed: Duration) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if let Some(mut timing) = self.timing.try_lock() {
            timing.record(elapsed);
        }
    }

    #[inline]
    pub(crate) fn record_dropped_no_action(&self) {
        self.dropped_no_action.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_callback(&self) {
        self.callbacks_invoked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_callback_panic(&self) {
        self.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame that skipped the pipeline because no shift applied.
    #[inline]
    pub fn record_bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        let timing = self.timing.lock();
        PipelineMetricsSnapshot {
            allocated: self.allocated.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            dropped_no_action: self.dropped_no_action.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            average_process_us: timing.average_us,
            peak_process_us: timing.peak_us,
        }
    }

    /// Reset the activity counters. `allocated` is left alone since the
    /// pool still owns those packets.
    pub fn reset(&self) {
        self.acquired.store(0, Ordering::Relaxed);
        self.released.store(0, Ordering::Relaxed);
        self.submitted.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.dropped_no_action.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.callbacks_invoked.store(0, Ordering::Relaxed);
        self.callback_panics.store(0, Ordering::Relaxed);
        self.bypassed.store(0, Ordering::Relaxed);
        *self.timing.lock() = TimingTracker::new();
    }
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetricsSnapshot {
    pub allocated: u64,
    pub acquired: u64,
    pub released: u64,
    pub submitted: u64,
    pub processed: u64,
    pub dropped_no_action: u64,
    pub failed: u64,
    pub callbacks_invoked: u64,
    pub callback_panics: u64,
    pub bypassed: u64,
    /// Smoothed worker time per processed packet (microseconds).
    /// Best-effort: samples that race a snapshot are skipped.
    pub average_process_us: f64,
    /// Worst worker time per processed packet (microseconds), best-effort
    pub peak_process_us: f64,
}

impl PipelineMetricsSnapshot {
    /// Packets acquired but not yet returned to the pool.
    pub fn in_flight(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_counters() {
        let metrics = PipelineMetrics::new();
        metrics.record_acquired();
        metrics.record_acquired();
        metrics.record_released();
        metrics.record_submitted();
        metrics.record_failed();
        metrics.record_bypassed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.acquired, 2);
        assert_eq!(snapshot.released, 1);
        assert_eq!(snapshot.in_flight(), 1);
        assert_eq!(snapshot.submitted, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.bypassed, 1);
    }

    #[test]
    fn test_timing() {
        let metrics = PipelineMetrics::new();
        metrics.record_processed(Duration::from_micros(100));
        metrics.record_processed(Duration::from_micros(200));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_relative_eq!(snapshot.average_process_us, 110.0, epsilon = 1e-6);
        assert_relative_eq!(snapshot.peak_process_us, 200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_timing_skipped_while_locked_but_count_exact() {
        let metrics = PipelineMetrics::new();
        metrics.record_processed(Duration::from_micros(100));
        {
            let _held = metrics.timing.lock();
            metrics.record_processed(Duration::from_micros(900));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_relative_eq!(snapshot.peak_process_us, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reset_keeps_allocated() {
        let metrics = PipelineMetrics::new();
        metrics.record_allocated();
        metrics.record_acquired();
        metrics.record_processed(Duration::from_micros(50));
        metrics.reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.allocated, 1);
        assert_eq!(snapshot.acquired, 0);
        assert_eq!(snapshot.processed, 0);
        assert_eq!(snapshot.average_process_us, 0.0);
    }
}
