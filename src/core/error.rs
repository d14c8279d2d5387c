//! Error types for the domain logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// `configure` called on a manager that is already configured
    #[error("LoggerManager for domain '{domain}' is already configured; call shutdown() first")]
    AlreadyConfigured { domain: String },

    /// Another live manager owns the domain
    #[error("Domain '{domain}' is already configured by another manager")]
    DomainConflict { domain: String },

    /// Logger requested before `configure`
    #[error("LoggerManager for domain '{domain}' is not configured")]
    NotConfigured { domain: String },

    /// Custom sink factory cannot be invoked
    #[error("Sink factory `{description}` is not callable")]
    NotCallable { description: String },

    /// Custom sink factory did not return a sequence
    #[error("Sink factory must return a sequence of sinks, got `{description}`")]
    NotIterable { description: String },

    /// Element returned by a custom sink factory is not a sink
    #[error("Element #{index} returned by sink factory (`{description}`) is not a sink")]
    InvalidSink { index: usize, description: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Dispatch pipeline used outside its lifecycle
    #[error("Dispatch pipeline error: {0}")]
    PipelineError(String),

    /// Dispatch listener already stopped
    #[error("Logger already stopped")]
    LoggerStopped,
}

impl LoggerError {
    pub fn already_configured(domain: impl Into<String>) -> Self {
        LoggerError::AlreadyConfigured {
            domain: domain.into(),
        }
    }

    pub fn domain_conflict(domain: impl Into<String>) -> Self {
        LoggerError::DomainConflict {
            domain: domain.into(),
        }
    }

    pub fn not_configured(domain: impl Into<String>) -> Self {
        LoggerError::NotConfigured {
            domain: domain.into(),
        }
    }

    pub fn not_callable(description: impl Into<String>) -> Self {
        LoggerError::NotCallable {
            description: description.into(),
        }
    }

    pub fn not_iterable(description: impl Into<String>) -> Self {
        LoggerError::NotIterable {
            description: description.into(),
        }
    }

    pub fn invalid_sink(index: usize, description: impl Into<String>) -> Self {
        LoggerError::InvalidSink {
            index,
            description: description.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    pub fn pipeline<S: Into<String>>(msg: S) -> Self {
        LoggerError::PipelineError(msg.into())
    }

    /// True for the configuration-time errors a caller is expected to fix
    /// rather than retry.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LoggerError::AlreadyConfigured { .. }
                | LoggerError::DomainConflict { .. }
                | LoggerError::NotConfigured { .. }
                | LoggerError::NotCallable { .. }
                | LoggerError::NotIterable { .. }
                | LoggerError::InvalidSink { .. }
                | LoggerError::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::domain_conflict("api");
        assert!(matches!(err, LoggerError::DomainConflict { .. }));

        let err = LoggerError::config("Settings", "Invalid level");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::invalid_sink(2, "\"not a sink\"");
        assert!(matches!(err, LoggerError::InvalidSink { index: 2, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::already_configured("api");
        assert_eq!(
            err.to_string(),
            "LoggerManager for domain 'api' is already configured; call shutdown() first"
        );

        let err = LoggerError::domain_conflict("api");
        assert_eq!(
            err.to_string(),
            "Domain 'api' is already configured by another manager"
        );

        let err = LoggerError::not_callable("not_a_callable");
        assert_eq!(err.to_string(), "Sink factory `not_a_callable` is not callable");

        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );
    }

    #[test]
    fn test_configuration_error_classification() {
        assert!(LoggerError::not_configured("x").is_configuration_error());
        assert!(LoggerError::not_iterable("42").is_configuration_error());
        assert!(!LoggerError::LoggerStopped.is_configuration_error());
        assert!(!LoggerError::writer("closed").is_configuration_error());
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("creating log directory", "cannot create", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("creating log directory"));
    }
}
