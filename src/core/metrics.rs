//! Counters for observing a configured domain
//!
//! Tracks how many records were emitted, how many went through the dispatch
//! queue, how often producers had to wait for queue space and how many sink
//! writes failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// # Example
///
/// ```
/// use domain_logger_system::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_forwarded();
/// metrics.record_sink_failure();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.pending(), 0);
/// assert_eq!(metrics.sink_failures(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Records accepted by a logger (after its level check)
    emitted: AtomicU64,

    /// Records placed on the dispatch queue
    enqueued: AtomicU64,

    /// Records the dispatch listener handed to sinks
    forwarded: AtomicU64,

    /// Enqueue attempts that found the queue full and had to wait
    backpressure_events: AtomicU64,

    /// Failed or panicked sink writes
    sink_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            enqueued: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backpressure_events(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Records enqueued but not yet forwarded
    pub fn pending(&self) -> u64 {
        self.enqueued().saturating_sub(self.forwarded())
    }

    #[inline]
    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_counting() {
        let metrics = Arc::new(LoggerMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.record_enqueued();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.enqueued(), 1000);
        assert_eq!(metrics.pending(), 1000);
    }
}
