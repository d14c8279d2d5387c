//! Canonical handler set shared by every logger of a domain

use super::dispatch::DispatchHandle;
use super::error::LoggerError;
use super::log_entry::LogEntry;
use super::metrics::LoggerMetrics;
use super::sink::SharedSink;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Where a logger sends an accepted record
#[derive(Clone)]
pub enum Handler {
    /// Write straight to a sink on the calling thread
    Sink(SharedSink),
    /// Hand the record to a dispatch listener
    Forward(DispatchHandle),
}

impl Handler {
    fn handle(&self, index: usize, entry: &LogEntry, metrics: &LoggerMetrics) {
        match self {
            Handler::Sink(sink) => {
                emit_isolated(index, sink, entry, metrics);
            }
            Handler::Forward(handle) => match handle.enqueue(entry.clone()) {
                Ok(()) | Err(LoggerError::LoggerStopped) => {}
                Err(e) => eprintln!("[LOGGER ERROR] Handler #{} failed to enqueue: {}", index, e),
            },
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Sink(sink) => f.debug_tuple("Sink").field(&sink.lock().name()).finish(),
            Handler::Forward(handle) => f.debug_tuple("Forward").field(handle).finish(),
        }
    }
}

/// The handlers a manager installs on its loggers
///
/// Owned by the manager; loggers only keep a weak reference, so dropping the
/// manager's `Arc` detaches the set from every logger at once.
#[derive(Debug)]
pub struct HandlerSet {
    handlers: Vec<Handler>,
    metrics: Arc<LoggerMetrics>,
}

impl HandlerSet {
    pub fn new(handlers: Vec<Handler>, metrics: Arc<LoggerMetrics>) -> Self {
        Self { handlers, metrics }
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }

    /// Pass `entry` to every handler in order
    pub fn handle(&self, entry: &LogEntry) {
        self.metrics.record_emitted();
        for (idx, handler) in self.handlers.iter().enumerate() {
            handler.handle(idx, entry, &self.metrics);
        }
    }

    /// Flush directly attached sinks; forwarded records are flushed by the listener
    pub fn flush(&self) {
        for (idx, handler) in self.handlers.iter().enumerate() {
            if let Handler::Sink(sink) = handler {
                flush_isolated(idx, sink);
            }
        }
    }
}

/// Write `entry` to `sink`, containing errors and panics
///
/// Returns `false` when the sink failed. Records below the sink's level are
/// skipped and count as success.
pub(crate) fn emit_isolated(
    index: usize,
    sink: &SharedSink,
    entry: &LogEntry,
    metrics: &LoggerMetrics,
) -> bool {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut guard = sink.lock();
        if guard.accepts(entry) {
            guard.emit(entry)
        } else {
            Ok(())
        }
    }));

    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            eprintln!("[LOGGER ERROR] Sink #{} failed: {}", index, e);
            metrics.record_sink_failure();
            false
        }
        Err(panic_info) => {
            eprintln!(
                "[LOGGER CRITICAL] Sink #{} panicked: {}. Other sinks continue to function.",
                index,
                panic_message(panic_info.as_ref())
            );
            metrics.record_sink_failure();
            false
        }
    }
}

pub(crate) fn flush_isolated(index: usize, sink: &SharedSink) {
    match catch_unwind(AssertUnwindSafe(|| sink.lock().flush())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("[LOGGER ERROR] Sink #{} flush failed: {}", index, e),
        Err(panic_info) => eprintln!(
            "[LOGGER CRITICAL] Sink #{} panicked during flush: {}",
            index,
            panic_message(panic_info.as_ref())
        ),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
