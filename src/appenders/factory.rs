//! Sink construction from settings and caller-supplied factories
//!
//! [`create_default_sinks`] builds the sinks every domain gets. Callers can add
//! their own through a [`FactoryValue`]: a factory closure that receives the
//! settings and formatter and returns a list of sinks. Because the value
//! crosses a dynamic boundary (plugins, config-driven wiring), its shape is
//! checked when the manager configures itself, not by the type system.

use super::console::ConsoleSink;
use super::rotating_file::{RotatingFileSink, RotationPolicy};
use crate::core::error::{LoggerError, Result};
use crate::core::{Settings, SharedFormatter, Sink};
use std::fmt;
use std::sync::Arc;

type FactoryFn = dyn Fn(&Settings, &SharedFormatter) -> FactoryValue + Send + Sync;

/// A dynamically shaped value passed across the sink-factory boundary
///
/// # Example
///
/// ```
/// use domain_logger_system::{FactoryValue, MemorySink};
///
/// let factory = FactoryValue::factory(|_settings, _formatter| {
///     FactoryValue::sinks([FactoryValue::sink(MemorySink::new())])
/// });
/// assert_eq!(factory.describe(), "factory");
/// ```
pub enum FactoryValue {
    /// Callable producing the sink list
    Factory(Arc<FactoryFn>),
    List(Vec<FactoryValue>),
    Sink(Box<dyn Sink>),
    /// Anything else, kept only for error reporting
    Opaque(String),
}

impl FactoryValue {
    /// Wrap a callable that builds sinks from the settings and formatter
    ///
    /// [`LoggerManager::configure`](crate::LoggerManager::configure) calls it
    /// without holding the manager's state lock. Calling `configure` on the
    /// same manager from inside the factory deadlocks.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Settings, &SharedFormatter) -> FactoryValue + Send + Sync + 'static,
    {
        FactoryValue::Factory(Arc::new(f))
    }

    pub fn sinks<I>(items: I) -> Self
    where
        I: IntoIterator<Item = FactoryValue>,
    {
        FactoryValue::List(items.into_iter().collect())
    }

    pub fn sink<S: Sink + 'static>(sink: S) -> Self {
        FactoryValue::Sink(Box::new(sink))
    }

    pub fn opaque(description: impl Into<String>) -> Self {
        FactoryValue::Opaque(description.into())
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            FactoryValue::Factory(_) => "factory".to_string(),
            FactoryValue::List(items) => format!("list of {}", items.len()),
            FactoryValue::Sink(sink) => format!("sink `{}`", sink.name()),
            FactoryValue::Opaque(description) => description.clone(),
        }
    }
}

impl fmt::Debug for FactoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryValue::Factory(_) => f.write_str("Factory(..)"),
            FactoryValue::List(items) => f.debug_tuple("List").field(items).finish(),
            FactoryValue::Sink(sink) => f.debug_tuple("Sink").field(&sink.name()).finish(),
            FactoryValue::Opaque(description) => f.debug_tuple("Opaque").field(description).finish(),
        }
    }
}

impl From<Box<dyn Sink>> for FactoryValue {
    fn from(sink: Box<dyn Sink>) -> Self {
        FactoryValue::Sink(sink)
    }
}

impl From<Vec<Box<dyn Sink>>> for FactoryValue {
    fn from(sinks: Vec<Box<dyn Sink>>) -> Self {
        FactoryValue::List(sinks.into_iter().map(FactoryValue::Sink).collect())
    }
}

/// Console sink, plus a rotating file sink when a log directory is set
///
/// # Errors
///
/// Returns error if the log directory or file cannot be created
pub fn create_default_sinks(
    settings: &Settings,
    formatter: &SharedFormatter,
) -> Result<Vec<Box<dyn Sink>>> {
    let mut sinks: Vec<Box<dyn Sink>> =
        vec![Box::new(ConsoleSink::new().with_formatter(Arc::clone(formatter)))];

    if let Some(path) = settings.log_file_path() {
        let policy = RotationPolicy::new()
            .with_max_bytes(settings.max_bytes())
            .with_backup_count(settings.backup_count())
            .with_compression(settings.compress_backups());
        let file = RotatingFileSink::new(path, policy)?.with_formatter(Arc::clone(formatter));
        sinks.push(Box::new(file));
    }

    Ok(sinks)
}

/// Invoke a caller factory and check that it produced a list of sinks
///
/// # Errors
///
/// - [`LoggerError::NotCallable`] if `value` is not a factory
/// - [`LoggerError::NotIterable`] if the factory returned something other than a list
/// - [`LoggerError::InvalidSink`] naming the first element that is not a sink
pub fn resolve_custom_sinks(
    value: FactoryValue,
    settings: &Settings,
    formatter: &SharedFormatter,
) -> Result<Vec<Box<dyn Sink>>> {
    let factory = match value {
        FactoryValue::Factory(factory) => factory,
        other => return Err(LoggerError::not_callable(other.describe())),
    };

    let items = match factory(settings, formatter) {
        FactoryValue::List(items) => items,
        other => return Err(LoggerError::not_iterable(other.describe())),
    };

    let mut sinks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            FactoryValue::Sink(sink) => sinks.push(sink),
            other => {
                // Already-built sinks never saw a write; closing them is enough.
                for sink in &mut sinks {
                    if let Err(e) = sink.close() {
                        eprintln!(
                            "[LOGGER WARNING] Sink ({}) close after invalid factory result failed: {}",
                            sink.name(),
                            e
                        );
                    }
                }
                return Err(LoggerError::invalid_sink(index, other.describe()));
            }
        }
    }
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::memory::MemorySink;
    use crate::core::formatter::build_formatter;
    use tempfile::tempdir;

    fn defaults() -> (Settings, SharedFormatter) {
        let settings = Settings::builder().ignore_environment().build().unwrap();
        let formatter = build_formatter(&settings).unwrap();
        (settings, formatter)
    }

    #[test]
    fn test_console_only_without_directory() {
        let (settings, formatter) = defaults();
        let sinks = create_default_sinks(&settings, &formatter).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "console");
    }

    #[test]
    fn test_file_sink_with_directory() {
        let dir = tempdir().unwrap();
        let settings = Settings::builder()
            .ignore_environment()
            .directory(dir.path().join("logs"))
            .file_name("svc.log")
            .build()
            .unwrap();
        let formatter = build_formatter(&settings).unwrap();

        let sinks = create_default_sinks(&settings, &formatter).unwrap();

        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[1].name(), "rotating_file");
        assert!(dir.path().join("logs/svc.log").exists());
    }

    #[test]
    fn test_non_factory_is_not_callable() {
        let (settings, formatter) = defaults();
        let result = resolve_custom_sinks(FactoryValue::opaque("42"), &settings, &formatter);
        assert!(matches!(result, Err(LoggerError::NotCallable { description }) if description == "42"));
    }

    #[test]
    fn test_factory_returning_sink_is_not_iterable() {
        let (settings, formatter) = defaults();
        let factory = FactoryValue::factory(|_, _| FactoryValue::sink(MemorySink::new()));
        let result = resolve_custom_sinks(factory, &settings, &formatter);
        assert!(matches!(result, Err(LoggerError::NotIterable { .. })));
    }

    #[test]
    fn test_invalid_element_reports_index() {
        let (settings, formatter) = defaults();
        let factory = FactoryValue::factory(|_, _| {
            FactoryValue::sinks([
                FactoryValue::sink(MemorySink::new()),
                FactoryValue::opaque("not a sink"),
            ])
        });
        let result = resolve_custom_sinks(factory, &settings, &formatter);
        assert!(matches!(result, Err(LoggerError::InvalidSink { index: 1, .. })));
    }

    #[test]
    fn test_factory_sees_settings_and_formatter() {
        let (settings, formatter) = defaults();
        let factory = FactoryValue::factory(|settings, formatter| {
            assert!(!settings.json());
            assert_eq!(formatter.name(), "pattern");
            FactoryValue::sinks(Vec::new())
        });
        let sinks = resolve_custom_sinks(factory, &settings, &formatter).unwrap();
        assert!(sinks.is_empty());
    }

    struct StuckSink;

    impl Sink for StuckSink {
        fn emit(&mut self, _entry: &crate::core::LogEntry) -> Result<()> {
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Err(LoggerError::writer("handle already gone"))
        }
        fn level(&self) -> crate::core::LogLevel {
            crate::core::LogLevel::Trace
        }
        fn set_level(&mut self, _level: crate::core::LogLevel) {}
        fn formatter(&self) -> Option<&SharedFormatter> {
            None
        }
        fn set_formatter(&mut self, _formatter: SharedFormatter) {}
        fn name(&self) -> &str {
            "stuck"
        }
    }

    #[test]
    fn test_invalid_element_closes_every_built_sink() {
        let (settings, formatter) = defaults();
        let memory = MemorySink::new();
        let buffer = memory.buffer();
        let slot = parking_lot::Mutex::new(Some(memory));
        let factory = FactoryValue::factory(move |_, _| {
            let mut items = vec![FactoryValue::sink(StuckSink)];
            items.extend(slot.lock().take().map(FactoryValue::sink));
            items.push(FactoryValue::opaque("trailing text"));
            FactoryValue::sinks(items)
        });

        let result = resolve_custom_sinks(factory, &settings, &formatter);

        assert!(matches!(result, Err(LoggerError::InvalidSink { index: 2, .. })));
        assert_eq!(buffer.close_count(), 1);
    }
}
