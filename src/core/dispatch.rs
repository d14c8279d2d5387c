//! Background dispatch of records to sinks
//!
//! A [`DispatchPipeline`] moves sink I/O off the logging threads. Producers
//! push records onto a bounded channel through a [`DispatchHandle`]; a single
//! listener thread pops them in FIFO order and writes each one to every sink.
//!
//! A full queue blocks the producer until the listener catches up, so records
//! are never dropped. [`DispatchPipeline::stop`] queues a shutdown marker
//! behind everything already enqueued and waits for the listener to drain and
//! exit.

use super::error::{LoggerError, Result};
use super::handler::{emit_isolated, flush_isolated, panic_message};
use super::log_entry::LogEntry;
use super::metrics::LoggerMetrics;
use super::sink::SharedSink;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const LISTENER_THREAD_NAME: &str = "log-dispatch";

enum Envelope {
    Record(Box<LogEntry>),
    Shutdown,
}

/// Producer side of a running pipeline
#[derive(Clone)]
pub struct DispatchHandle {
    sender: Sender<Envelope>,
    metrics: Arc<LoggerMetrics>,
}

impl DispatchHandle {
    /// Queue `entry` for the listener, blocking while the queue is full
    ///
    /// Fails with [`LoggerError::LoggerStopped`] once the listener has exited.
    pub fn enqueue(&self, entry: LogEntry) -> Result<()> {
        let envelope = Envelope::Record(Box::new(entry));
        match self.sender.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                self.metrics.record_backpressure();
                self.sender
                    .send(envelope)
                    .map_err(|_| LoggerError::LoggerStopped)?;
            }
            Err(TrySendError::Disconnected(_)) => return Err(LoggerError::LoggerStopped),
        }
        self.metrics.record_enqueued();
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity().unwrap_or(0)
    }

    /// Records currently waiting in the queue
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

enum PipelineState {
    Idle,
    Running {
        sender: Sender<Envelope>,
        listener: JoinHandle<()>,
    },
    Stopped,
}

/// Queue plus listener thread; `Idle -> Running -> Stopped`
pub struct DispatchPipeline {
    state: PipelineState,
}

impl DispatchPipeline {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    /// Spawn the listener over `sinks` with a queue of `max_queue_size` slots
    pub fn start(
        &mut self,
        sinks: Vec<SharedSink>,
        max_queue_size: usize,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<DispatchHandle> {
        match self.state {
            PipelineState::Idle => {}
            PipelineState::Running { .. } => {
                return Err(LoggerError::pipeline("pipeline is already running"))
            }
            PipelineState::Stopped => {
                return Err(LoggerError::pipeline("pipeline has been stopped"))
            }
        }
        if max_queue_size == 0 {
            return Err(LoggerError::config(
                "max_queue_size",
                "queue capacity must be at least 1",
            ));
        }

        let (sender, receiver) = bounded(max_queue_size);
        let listener_metrics = Arc::clone(&metrics);
        let listener = thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || run_listener(receiver, sinks, listener_metrics))
            .map_err(|e| {
                LoggerError::io_operation("spawning dispatch listener", e.to_string(), e)
            })?;

        let handle = DispatchHandle {
            sender: sender.clone(),
            metrics,
        };
        self.state = PipelineState::Running { sender, listener };
        Ok(handle)
    }

    /// Signal the listener, let it drain the queue and wait for it to exit
    ///
    /// Calling `stop` on a pipeline that is not running is a no-op.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        let PipelineState::Running { sender, listener } =
            std::mem::replace(&mut self.state, PipelineState::Stopped)
        else {
            return;
        };

        // Fails only when the listener is already gone.
        let _ = sender.send(Envelope::Shutdown);
        drop(sender);

        if let Err(panic_info) = listener.join() {
            eprintln!(
                "[LOGGER CRITICAL] Dispatch listener panicked: {}",
                panic_message(panic_info.as_ref())
            );
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PipelineState::Running { .. })
    }
}

impl Default for DispatchPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispatchPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_listener(receiver: Receiver<Envelope>, sinks: Vec<SharedSink>, metrics: Arc<LoggerMetrics>) {
    while let Ok(envelope) = receiver.recv() {
        match envelope {
            Envelope::Record(entry) => {
                forward(&sinks, &entry, &metrics);
                if receiver.is_empty() {
                    flush_all(&sinks);
                }
            }
            Envelope::Shutdown => break,
        }
    }

    // Anything that raced in behind the marker is still delivered.
    while let Ok(envelope) = receiver.try_recv() {
        if let Envelope::Record(entry) = envelope {
            forward(&sinks, &entry, &metrics);
        }
    }
    flush_all(&sinks);
}

fn forward(sinks: &[SharedSink], entry: &LogEntry, metrics: &LoggerMetrics) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        for (idx, sink) in sinks.iter().enumerate() {
            emit_isolated(idx, sink, entry, metrics);
        }
    }));
    if let Err(panic_info) = result {
        eprintln!(
            "[LOGGER CRITICAL] Dispatch listener recovered from panic: {}",
            panic_message(panic_info.as_ref())
        );
    }
    metrics.record_forwarded();
}

fn flush_all(sinks: &[SharedSink]) {
    for (idx, sink) in sinks.iter().enumerate() {
        flush_isolated(idx, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::memory::MemorySink;
    use crate::core::log_level::LogLevel;
    use crate::core::sink::share;

    fn memory_pipeline(capacity: usize) -> (DispatchPipeline, DispatchHandle, crate::MemoryBuffer) {
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let mut pipeline = DispatchPipeline::new();
        let handle = pipeline
            .start(vec![share(Box::new(sink))], capacity, Arc::new(LoggerMetrics::new()))
            .unwrap();
        (pipeline, handle, buffer)
    }

    #[test]
    fn test_stop_drains_queued_records() {
        let (mut pipeline, handle, buffer) = memory_pipeline(16);
        for i in 0..100 {
            handle
                .enqueue(LogEntry::new(LogLevel::Info, format!("record {}", i)))
                .unwrap();
        }
        pipeline.stop();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 100);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.ends_with(&format!("record {}", i)), "out of order: {}", line);
        }
    }

    #[test]
    fn test_enqueue_after_stop_reports_stopped() {
        let (mut pipeline, handle, _buffer) = memory_pipeline(4);
        pipeline.stop();

        let result = handle.enqueue(LogEntry::new(LogLevel::Info, "late"));
        assert!(matches!(result, Err(LoggerError::LoggerStopped)));
    }

    #[test]
    fn test_lifecycle_is_one_shot() {
        let (mut pipeline, _handle, _buffer) = memory_pipeline(4);
        assert!(pipeline.is_running());
        assert!(pipeline
            .start(Vec::new(), 4, Arc::new(LoggerMetrics::new()))
            .is_err());

        pipeline.stop();
        pipeline.stop();
        assert!(!pipeline.is_running());
        assert!(matches!(
            pipeline.start(Vec::new(), 4, Arc::new(LoggerMetrics::new())),
            Err(LoggerError::PipelineError(_))
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut pipeline = DispatchPipeline::new();
        let result = pipeline.start(Vec::new(), 0, Arc::new(LoggerMetrics::new()));
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
        assert!(!pipeline.is_running());
    }

    #[test]
    fn test_handle_reports_capacity() {
        let (mut pipeline, handle, _buffer) = memory_pipeline(32);
        assert_eq!(handle.capacity(), 32);
        pipeline.stop();
    }
}
