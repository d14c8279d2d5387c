//! In-memory sink
//!
//! Keeps formatted lines in a [`MemoryBuffer`] that stays readable after the
//! sink itself has been handed to a manager.

use crate::core::{LogEntry, LogLevel, Result, SharedFormatter, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct BufferState {
    lines: Vec<String>,
    flushes: usize,
    closes: usize,
}

/// Shared view of the lines a [`MemorySink`] received
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl MemoryBuffer {
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.state.lock().lines.iter().any(|l| l.contains(needle))
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    pub fn clear(&self) {
        self.state.lock().lines.clear();
    }
}

#[derive(Debug)]
pub struct MemorySink {
    buffer: MemoryBuffer,
    level: LogLevel,
    formatter: Option<SharedFormatter>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            buffer: MemoryBuffer::default(),
            level: LogLevel::Trace,
            formatter: None,
        }
    }

    pub fn buffer(&self) -> MemoryBuffer {
        self.buffer.clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.render(entry);
        self.buffer.state.lock().lines.push(line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.buffer.state.lock().flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.buffer.state.lock().closes += 1;
        Ok(())
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    fn formatter(&self) -> Option<&SharedFormatter> {
        self.formatter.as_ref()
    }

    fn set_formatter(&mut self, formatter: SharedFormatter) {
        self.formatter = Some(formatter);
    }

    fn name(&self) -> &str {
        "memory"
    }
}
