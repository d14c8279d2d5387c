//! Core logger types and traits

pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod hierarchy;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod manager;
pub mod metrics;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod timestamp;

pub use dispatch::{DispatchHandle, DispatchPipeline};
pub use error::{LoggerError, Result};
pub use formatter::{build_formatter, Formatter, JsonFormatter, PatternFormatter, SharedFormatter};
pub use handler::{Handler, HandlerSet};
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::Logger;
pub use manager::LoggerManager;
pub use metrics::LoggerMetrics;
pub use registry::{get_logger, DomainRegistry};
pub use settings::{Settings, SettingsBuilder};
pub use sink::{share, SharedSink, Sink};
pub use timestamp::TimestampFormat;
