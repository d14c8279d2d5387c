//! Sink capability for log output destinations

use super::error::Result;
use super::formatter::{PatternFormatter, SharedFormatter};
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use parking_lot::Mutex;
use std::sync::Arc;

/// A destination for formatted records
///
/// Every sink carries its own threshold level and formatter; the manager sets
/// both when it takes ownership of the sink.
pub trait Sink: Send {
    fn emit(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Release underlying resources; later `emit` calls may fail
    fn close(&mut self) -> Result<()>;

    fn level(&self) -> LogLevel;
    fn set_level(&mut self, level: LogLevel);

    fn formatter(&self) -> Option<&SharedFormatter>;
    fn set_formatter(&mut self, formatter: SharedFormatter);

    fn name(&self) -> &str;

    /// Whether this sink wants `entry` given its level
    fn accepts(&self, entry: &LogEntry) -> bool {
        entry.level >= self.level()
    }

    /// Render `entry` with the configured formatter, or the default pattern
    fn render(&self, entry: &LogEntry) -> String {
        use super::formatter::Formatter;
        match self.formatter() {
            Some(formatter) => formatter.format(entry),
            None => PatternFormatter::default().format(entry),
        }
    }
}

/// A sink shared between the manager, loggers and the dispatch listener
pub type SharedSink = Arc<Mutex<Box<dyn Sink>>>;

pub fn share(sink: Box<dyn Sink>) -> SharedSink {
    Arc::new(Mutex::new(sink))
}
