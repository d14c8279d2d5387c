//! Logging settings
//!
//! [`Settings`] is an immutable, validated value. Each field is resolved from,
//! in order of precedence:
//!
//! 1. an explicit value given to [`SettingsBuilder`]
//! 2. an environment variable `<PREFIX><FIELD>` (prefix `LOG_` by default,
//!    matched case-insensitively)
//! 3. the built-in default
//!
//! | Field              | Variable                 | Default  |
//! |--------------------|--------------------------|----------|
//! | `level`            | `LOG_LEVEL`              | `INFO`   |
//! | `json`             | `LOG_JSON`               | `false`  |
//! | `format`           | `LOG_FORMAT`             | [`Settings::DEFAULT_FORMAT`] |
//! | `use_async`        | `LOG_USE_ASYNC`          | `true`   |
//! | `max_queue_size`   | `LOG_MAX_QUEUE_SIZE`     | `1000`   |
//! | `directory`        | `LOG_DIR`                | unset    |
//! | `file_name`        | `LOG_FILE`               | unset    |
//! | `max_bytes`        | `LOG_MAX_BYTES`          | 10 MiB   |
//! | `backup_count`     | `LOG_BACKUP_FILES_COUNT` | `5`      |
//! | `compress_backups` | `LOG_COMPRESS_BACKUPS`   | `false`  |

use super::error::{LoggerError, Result};
use super::formatter::PatternFormatter;
use super::log_level::LogLevel;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    level: LogLevel,
    json: bool,
    format: String,
    directory: Option<PathBuf>,
    file_name: Option<String>,
    max_bytes: u64,
    backup_count: usize,
    use_async: bool,
    max_queue_size: usize,
    compress_backups: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            format: Self::DEFAULT_FORMAT.to_string(),
            directory: None,
            file_name: None,
            max_bytes: 10 * 1024 * 1024,
            backup_count: 5,
            use_async: true,
            max_queue_size: 1000,
            compress_backups: false,
        }
    }
}

impl Settings {
    pub const DEFAULT_FORMAT: &'static str = "%(asctime)s - %(name)s - %(levelname)s - %(message)s";
    pub const DEFAULT_ENV_PREFIX: &'static str = "LOG_";
    /// File name used when only a directory is configured
    pub const DEFAULT_FILE_NAME: &'static str = "app.log";

    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Defaults overridden by `<prefix>*` process environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when a variable cannot be coerced to its
    /// field's type or the resulting settings are inconsistent.
    pub fn load_from_environment(prefix: &str) -> Result<Self> {
        Self::builder().env_prefix(prefix).build()
    }

    /// Like [`Settings::load_from_environment`], reading variables through
    /// `lookup` instead of the process environment
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = EnvSource::from_lookup(prefix, lookup);
        Self::builder().env_prefix(prefix).build_from(source)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    pub fn use_async(&self) -> bool {
        self.use_async
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    pub fn compress_backups(&self) -> bool {
        self.compress_backups
    }

    /// Path of the rotating log file, if file output is enabled
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| {
            dir.join(
                self.file_name
                    .as_deref()
                    .unwrap_or(Self::DEFAULT_FILE_NAME),
            )
        })
    }

    fn validate(&self) -> Result<()> {
        if self.file_name.is_some() && self.directory.is_none() {
            return Err(LoggerError::config(
                "file_name",
                "a log file name requires a log directory",
            ));
        }
        if let Some(ref dir) = self.directory {
            if dir.as_os_str().is_empty() {
                return Err(LoggerError::config("directory", "path is empty"));
            }
            if dir.exists() && !dir.is_dir() {
                return Err(LoggerError::config(
                    "directory",
                    format!("'{}' exists and is not a directory", dir.display()),
                ));
            }
        }
        if let Some(ref name) = self.file_name {
            if name.is_empty() {
                return Err(LoggerError::config("file_name", "name is empty"));
            }
        }
        if self.max_queue_size == 0 {
            return Err(LoggerError::config(
                "max_queue_size",
                "the dispatch queue needs a capacity of at least 1",
            ));
        }
        if !self.json {
            PatternFormatter::validate(&self.format)
                .map_err(|e| LoggerError::config("format", e.to_string()))?;
        }
        Ok(())
    }
}

/// Explicit overrides on top of environment and defaults
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    env_prefix: String,
    use_environment: bool,
    level: Option<LogLevel>,
    json: Option<bool>,
    format: Option<String>,
    directory: Option<PathBuf>,
    file_name: Option<String>,
    max_bytes: Option<u64>,
    backup_count: Option<usize>,
    use_async: Option<bool>,
    max_queue_size: Option<usize>,
    compress_backups: Option<bool>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            env_prefix: Settings::DEFAULT_ENV_PREFIX.to_string(),
            use_environment: true,
            level: None,
            json: None,
            format: None,
            directory: None,
            file_name: None,
            max_bytes: None,
            backup_count: None,
            use_async: None,
            max_queue_size: None,
            compress_backups: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Resolve fields from explicit values and defaults only
    #[must_use = "builder methods return a new value"]
    pub fn ignore_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn json(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backup_count(mut self, count: usize) -> Self {
        self.backup_count = Some(count);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn use_async(mut self, use_async: bool) -> Self {
        self.use_async = Some(use_async);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = Some(size);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compress_backups(mut self, compress: bool) -> Self {
        self.compress_backups = Some(compress);
        self
    }

    /// Resolve and validate the settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` on a malformed environment value or an
    /// inconsistent combination of fields.
    pub fn build(self) -> Result<Settings> {
        let source = if self.use_environment {
            EnvSource::from_process(&self.env_prefix)
        } else {
            EnvSource::default()
        };
        self.build_from(source)
    }

    fn build_from(self, env: EnvSource) -> Result<Settings> {
        let prefix = self.env_prefix.as_str();
        let defaults = Settings::default();

        let settings = Settings {
            level: resolve(self.level, || env.parsed(prefix, "LEVEL", parse_level), defaults.level)?,
            json: resolve(self.json, || env.parsed(prefix, "JSON", parse_bool), defaults.json)?,
            format: self.format.or_else(|| env.raw("FORMAT")).unwrap_or(defaults.format),
            directory: self
                .directory
                .or_else(|| env.non_empty("DIR").map(PathBuf::from)),
            file_name: self.file_name.or_else(|| env.non_empty("FILE")),
            max_bytes: resolve(
                self.max_bytes,
                || env.parsed(prefix, "MAX_BYTES", parse_int::<u64>),
                defaults.max_bytes,
            )?,
            backup_count: resolve(
                self.backup_count,
                || env.parsed(prefix, "BACKUP_FILES_COUNT", parse_int::<usize>),
                defaults.backup_count,
            )?,
            use_async: resolve(
                self.use_async,
                || env.parsed(prefix, "USE_ASYNC", parse_bool),
                defaults.use_async,
            )?,
            max_queue_size: resolve(
                self.max_queue_size,
                || env.parsed(prefix, "MAX_QUEUE_SIZE", parse_int::<usize>),
                defaults.max_queue_size,
            )?,
            compress_backups: resolve(
                self.compress_backups,
                || env.parsed(prefix, "COMPRESS_BACKUPS", parse_bool),
                defaults.compress_backups,
            )?,
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An explicit value wins outright; the environment is only parsed when
/// nothing explicit was given.
fn resolve<T>(explicit: Option<T>, env: impl FnOnce() -> Result<Option<T>>, default: T) -> Result<T> {
    match explicit {
        Some(value) => Ok(value),
        None => Ok(env()?.unwrap_or(default)),
    }
}

const FIELDS: [&str; 10] = [
    "LEVEL",
    "JSON",
    "FORMAT",
    "USE_ASYNC",
    "MAX_QUEUE_SIZE",
    "DIR",
    "FILE",
    "MAX_BYTES",
    "BACKUP_FILES_COUNT",
    "COMPRESS_BACKUPS",
];

/// Raw variable values keyed by upper-case field suffix
#[derive(Debug, Default)]
struct EnvSource {
    values: HashMap<String, String>,
}

impl EnvSource {
    fn from_process(prefix: &str) -> Self {
        let prefix = prefix.to_uppercase();
        let values = std::env::vars_os()
            .filter_map(|(key, value)| {
                let key = key.to_str()?.to_uppercase();
                let field = key.strip_prefix(prefix.as_str())?;
                if !FIELDS.contains(&field) {
                    return None;
                }
                Some((field.to_string(), value.to_str()?.to_string()))
            })
            .collect();
        Self { values }
    }

    fn from_lookup<F>(prefix: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = FIELDS
            .iter()
            .filter_map(|field| {
                lookup(&format!("{}{}", prefix, field)).map(|value| (field.to_string(), value))
            })
            .collect();
        Self { values }
    }

    fn raw(&self, field: &str) -> Option<String> {
        self.values.get(field).cloned()
    }

    fn non_empty(&self, field: &str) -> Option<String> {
        self.raw(field).filter(|v| !v.trim().is_empty())
    }

    fn parsed<T>(
        &self,
        prefix: &str,
        field: &str,
        parse: fn(&str) -> std::result::Result<T, String>,
    ) -> Result<Option<T>> {
        match self.values.get(field) {
            None => Ok(None),
            Some(raw) => parse(raw)
                .map(Some)
                .map_err(|message| LoggerError::config(format!("{}{}", prefix, field), message)),
        }
    }
}

fn parse_level(raw: &str) -> std::result::Result<LogLevel, String> {
    raw.parse()
}

fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(format!("expected a boolean, got '{}'", raw)),
    }
}

fn parse_int<T>(raw: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| format!("expected a non-negative integer, got '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.level(), LogLevel::Info);
        assert!(!settings.json());
        assert!(settings.use_async());
        assert_eq!(settings.max_queue_size(), 1000);
        assert_eq!(settings.max_bytes(), 10 * 1024 * 1024);
        assert_eq!(settings.backup_count(), 5);
        assert_eq!(settings.log_file_path(), None);
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let settings = Settings::from_lookup(
            "LOG_",
            lookup_from(&[
                ("LOG_LEVEL", "DEBUG"),
                ("LOG_JSON", "true"),
                ("LOG_USE_ASYNC", "off"),
                ("LOG_MAX_QUEUE_SIZE", "500"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.level(), LogLevel::Debug);
        assert!(settings.json());
        assert!(!settings.use_async());
        assert_eq!(settings.max_queue_size(), 500);
    }

    #[test]
    fn test_malformed_integer_is_rejected() {
        let err = Settings::from_lookup("LOG_", lookup_from(&[("LOG_MAX_BYTES", "10MB")]))
            .unwrap_err();
        match err {
            LoggerError::InvalidConfiguration { component, .. } => {
                assert_eq!(component, "LOG_MAX_BYTES")
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(Settings::from_lookup("LOG_", lookup_from(&[("LOG_BACKUP_FILES_COUNT", "-1")]))
            .is_err());
        assert!(Settings::from_lookup("LOG_", lookup_from(&[("LOG_MAX_QUEUE_SIZE", "1.5")]))
            .is_err());
    }

    #[test]
    fn test_malformed_bool_and_level_are_rejected() {
        assert!(Settings::from_lookup("LOG_", lookup_from(&[("LOG_JSON", "maybe")])).is_err());
        assert!(Settings::from_lookup("LOG_", lookup_from(&[("LOG_LEVEL", "LOUD")])).is_err());
    }

    #[test]
    fn test_empty_directory_variables_mean_unset() {
        let settings =
            Settings::from_lookup("LOG_", lookup_from(&[("LOG_DIR", ""), ("LOG_FILE", " ")]))
                .unwrap();
        assert_eq!(settings.directory(), None);
        assert_eq!(settings.file_name(), None);
    }

    #[test]
    fn test_explicit_values_win() {
        let settings = SettingsBuilder::new()
            .level(LogLevel::Error)
            .build_from(EnvSource::from_lookup(
                "LOG_",
                lookup_from(&[("LOG_LEVEL", "DEBUG"), ("LOG_BACKUP_FILES_COUNT", "9")]),
            ))
            .unwrap();

        assert_eq!(settings.level(), LogLevel::Error);
        assert_eq!(settings.backup_count(), 9);
    }

    #[test]
    fn test_explicit_value_skips_malformed_variable() {
        let settings = SettingsBuilder::new()
            .max_queue_size(10)
            .use_async(false)
            .build_from(EnvSource::from_lookup(
                "LOG_",
                lookup_from(&[("LOG_MAX_QUEUE_SIZE", "lots"), ("LOG_USE_ASYNC", "sometimes")]),
            ))
            .unwrap();

        assert_eq!(settings.max_queue_size(), 10);
        assert!(!settings.use_async());
    }

    #[test]
    fn test_file_name_requires_directory() {
        let err = Settings::builder()
            .ignore_environment()
            .file_name("app.log")
            .build()
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_directory_must_not_be_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = Settings::builder()
            .ignore_environment()
            .directory(file.path())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_log_file_path_defaults_file_name() {
        let settings = Settings::builder()
            .ignore_environment()
            .directory("/tmp/logs")
            .build()
            .unwrap();
        assert_eq!(
            settings.log_file_path(),
            Some(PathBuf::from("/tmp/logs/app.log"))
        );
    }

    #[test]
    fn test_zero_queue_and_bad_pattern_are_rejected() {
        assert!(Settings::builder()
            .ignore_environment()
            .max_queue_size(0)
            .build()
            .is_err());
        assert!(Settings::builder()
            .ignore_environment()
            .format("%(nope)s")
            .build()
            .is_err());
        // JSON mode never renders the pattern
        assert!(Settings::builder()
            .ignore_environment()
            .json(true)
            .format("%(nope)s")
            .build()
            .is_ok());
    }
}
