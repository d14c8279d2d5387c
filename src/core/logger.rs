//! Named loggers
//!
//! A [`Logger`] is a cheap, cloneable handle to a named node of the process
//! logger hierarchy. It owns only its name and threshold level; the handlers
//! records go to belong to whichever manager configured the domain, and are
//! referenced weakly so a manager's shutdown detaches them everywhere.

use super::handler::{Handler, HandlerSet};
use super::log_context::LogContext;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

struct LoggerInner {
    name: String,
    level: RwLock<LogLevel>,
    handlers: RwLock<Weak<HandlerSet>>,
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: RwLock::new(LogLevel::default()),
                handlers: RwLock::new(Weak::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn level(&self) -> LogLevel {
        *self.inner.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.inner.level.write() = level;
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Whether both handles point at the same hierarchy node
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handlers currently attached (zero once detached)
    pub fn handler_count(&self) -> usize {
        self.handler_set().map_or(0, |set| set.len())
    }

    /// Snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<Handler> {
        self.handler_set()
            .map(|set| set.handlers().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn handler_set(&self) -> Option<Arc<HandlerSet>> {
        self.inner.handlers.read().upgrade()
    }

    pub(crate) fn attach(&self, set: &Arc<HandlerSet>) {
        *self.inner.handlers.write() = Arc::downgrade(set);
    }

    /// Drop the reference to `set`; returns `false` if the logger was already
    /// attached elsewhere or detached
    pub(crate) fn detach(&self, set: &Arc<HandlerSet>) -> bool {
        let mut handlers = self.inner.handlers.write();
        if Weak::ptr_eq(&handlers, &Arc::downgrade(set)) {
            *handlers = Weak::new();
            true
        } else {
            false
        }
    }

    /// Send a fully built record, filling in this logger's name
    pub fn log_record(&self, entry: LogEntry) {
        if !self.is_enabled_for(entry.level) {
            return;
        }
        if let Some(set) = self.handler_set() {
            set.handle(&entry.with_logger_name(self.inner.name.as_str()));
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if self.is_enabled_for(level) {
            self.log_record(LogEntry::new(level, message));
        }
    }

    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        if self.is_enabled_for(level) {
            self.log_record(LogEntry::new(level, message).with_context(context));
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log at ERROR with `error` and its source chain attached
    pub fn exception(&self, message: impl Into<String>, error: &(dyn std::error::Error + 'static)) {
        if self.is_enabled_for(LogLevel::Error) {
            self.log_record(LogEntry::new(LogLevel::Error, message).with_error(error));
        }
    }

    /// Flush sinks attached directly to this logger
    pub fn flush(&self) {
        if let Some(set) = self.handler_set() {
            set.flush();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .finish()
    }
}
