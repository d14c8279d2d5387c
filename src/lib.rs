//! # Domain Logger System
//!
//! Domain-scoped logging configuration for multi-component applications.
//!
//! Each top-level component (`"api"`, `"billing"`, ...) gets a
//! [`LoggerManager`] that owns its sinks, hands out dotted sub-loggers and
//! tears everything down in one call.
//!
//! ## Features
//!
//! - **Environment Settings**: `LOG_LEVEL`, `LOG_JSON`, `LOG_DIR`, ... with
//!   explicit overrides on top
//! - **Domain Isolation**: one live manager per domain, enforced process-wide
//! - **Async Dispatch**: bounded queue with a single listener thread and
//!   blocking backpressure; shutdown drains every queued record
//! - **Sinks**: console, size-rotating files with optional gzip backups and
//!   caller-supplied sinks through a checked factory
//!
//! ## Example
//!
//! ```
//! use domain_logger_system::prelude::*;
//! use domain_logger_system::info;
//!
//! let settings = Settings::builder()
//!     .ignore_environment()
//!     .level(LogLevel::Debug)
//!     .build()
//!     .unwrap();
//!
//! let manager = LoggerManager::new("docs-example");
//! manager.configure(settings, None).unwrap();
//!
//! let logger = manager.get_logger(Some("http")).unwrap();
//! info!(logger, "listening on port {}", 8080);
//!
//! manager.shutdown();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleSink, ConsoleStream, FactoryValue, MemoryBuffer, MemorySink, RotatingFileSink,
        RotationPolicy,
    };
    pub use crate::core::{
        get_logger, DomainRegistry, FieldValue, Formatter, JsonFormatter, LogContext, LogEntry,
        LogLevel, Logger, LoggerError, LoggerManager, LoggerMetrics, PatternFormatter, Result,
        Settings, SettingsBuilder, SharedFormatter, SharedSink, Sink, TimestampFormat,
    };
}

pub use appenders::{
    ConsoleSink, ConsoleStream, FactoryValue, MemoryBuffer, MemorySink, RotatingFileSink,
    RotationPolicy,
};
pub use core::{
    get_logger, DispatchHandle, DispatchPipeline, DomainRegistry, FieldValue, Formatter, Handler,
    JsonFormatter, LogContext, LogEntry, LogLevel, Logger, LoggerError, LoggerManager,
    LoggerMetrics, PatternFormatter, Result, Settings, SettingsBuilder, SharedFormatter,
    SharedSink, Sink, TimestampFormat,
};
