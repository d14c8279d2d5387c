//! Logging macros with source location
//!
//! Like `println!`, but the message is only formatted when the logger's level
//! lets the record through, and the record carries `file!()`, `line!()` and
//! `module_path!()` of the call site.
//!
//! # Examples
//!
//! ```
//! use domain_logger_system::prelude::*;
//! use domain_logger_system::{info, warn};
//!
//! let logger = get_logger("macros-example");
//!
//! info!(logger, "Server started");
//! let port = 8080;
//! warn!(logger, "Port {} already in use, retrying", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use domain_logger_system::prelude::*;
/// # let logger = get_logger("log-macro");
/// use domain_logger_system::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = &$logger;
        if logger.is_enabled_for(level) {
            logger.log_record(
                $crate::LogEntry::new(level, format!($($arg)+))
                    .with_location(file!(), line!(), module_path!()),
            );
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use domain_logger_system::prelude::*;
/// # let logger = get_logger("error-macro");
/// use domain_logger_system::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
