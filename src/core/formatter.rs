//! Record formatters
//!
//! Two renderers are provided:
//! - [`PatternFormatter`]: human-readable lines driven by a `%(key)s` template
//! - [`JsonFormatter`]: one self-contained JSON object per record
//!
//! Both are shared between sinks through [`SharedFormatter`].

use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::settings::Settings;
use super::timestamp::TimestampFormat;
use std::fmt;
use std::sync::Arc;

/// Renders a record into the text a sink writes
pub trait Formatter: Send + Sync + fmt::Debug {
    fn format(&self, entry: &LogEntry) -> String;

    fn name(&self) -> &str;

    /// Structured output must not be decorated (e.g. colored) by sinks
    fn is_structured(&self) -> bool {
        false
    }

    /// Template string for pattern-based formatters
    fn pattern(&self) -> Option<&str> {
        None
    }
}

pub type SharedFormatter = Arc<dyn Formatter>;

/// Build the formatter described by `settings`
pub fn build_formatter(settings: &Settings) -> Result<SharedFormatter> {
    if settings.json() {
        Ok(Arc::new(JsonFormatter::new()))
    } else {
        Ok(Arc::new(PatternFormatter::new(settings.format())?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    AscTime,
    Created,
    Msecs,
    LevelName,
    LevelNo,
    Name,
    Message,
    Thread,
    ThreadName,
    FileName,
    PathName,
    LineNo,
    Module,
    Process,
}

impl Field {
    fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "asctime" => Field::AscTime,
            "created" => Field::Created,
            "msecs" => Field::Msecs,
            "levelname" => Field::LevelName,
            "levelno" => Field::LevelNo,
            "name" => Field::Name,
            "message" => Field::Message,
            "thread" => Field::Thread,
            "threadName" => Field::ThreadName,
            "filename" => Field::FileName,
            "pathname" => Field::PathName,
            "lineno" => Field::LineNo,
            "module" => Field::Module,
            "process" => Field::Process,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        left_align: bool,
        width: Option<usize>,
    },
}

/// Template-driven text formatter
///
/// Placeholders follow the `%(key)s` convention, with optional alignment and
/// width (`%(levelname)-8s`). `%%` produces a literal percent sign. Newlines
/// in messages are escaped so every record stays on one line.
///
/// # Examples
///
/// ```
/// use domain_logger_system::{Formatter, LogEntry, LogLevel, PatternFormatter};
///
/// let formatter = PatternFormatter::new("%(levelname)s - %(name)s - %(message)s").unwrap();
/// let entry = LogEntry::new(LogLevel::Warn, "disk almost full").with_logger_name("api.storage");
/// assert_eq!(formatter.format(&entry), "WARN - api.storage - disk almost full");
/// ```
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    segments: Vec<Segment>,
    timestamp_format: TimestampFormat,
}

impl PatternFormatter {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let segments = Self::parse(&pattern)?;
        Ok(Self {
            pattern,
            segments,
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// Check a template without building a formatter
    pub fn validate(pattern: &str) -> Result<()> {
        Self::parse(pattern).map(|_| ())
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn parse(pattern: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some('(') => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(ch) => key.push(ch),
                            None => {
                                return Err(LoggerError::formatter(
                                    "pattern",
                                    format!("unterminated placeholder '%({}'", key),
                                ))
                            }
                        }
                    }
                    let field = Field::parse(&key).ok_or_else(|| {
                        LoggerError::formatter("pattern", format!("unknown placeholder '{}'", key))
                    })?;

                    let left_align = chars.next_if_eq(&'-').is_some();
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(|ch| ch.is_ascii_digit()) {
                        digits.push(d);
                    }
                    let width = if digits.is_empty() {
                        None
                    } else {
                        Some(digits.parse::<usize>().map_err(|e| {
                            LoggerError::formatter("pattern", format!("invalid width: {}", e))
                        })?)
                    };

                    match chars.next() {
                        Some('s' | 'd' | 'i' | 'f' | 'r') => {}
                        other => {
                            return Err(LoggerError::formatter(
                                "pattern",
                                format!(
                                    "placeholder '{}' needs a conversion type, got {:?}",
                                    key, other
                                ),
                            ))
                        }
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        field,
                        left_align,
                        width,
                    });
                }
                other => {
                    return Err(LoggerError::formatter(
                        "pattern",
                        format!("unsupported directive '%{}'", other.map(String::from).unwrap_or_default()),
                    ))
                }
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    /// Escape line breaks so an attacker cannot forge extra records
    fn sanitize(text: &str) -> String {
        text.replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    fn render_field(&self, field: Field, entry: &LogEntry) -> String {
        match field {
            Field::AscTime => self.timestamp_format.format(&entry.timestamp),
            Field::Created => format!("{:.6}", entry.timestamp.timestamp_micros() as f64 / 1e6),
            Field::Msecs => entry.timestamp.timestamp_subsec_millis().to_string(),
            Field::LevelName => entry.level.to_str().to_string(),
            Field::LevelNo => entry.level.severity().to_string(),
            Field::Name => entry.logger_name.clone(),
            Field::Message => Self::sanitize(&entry.message),
            Field::Thread => entry.thread_id.clone(),
            Field::ThreadName => entry.thread_label().to_string(),
            Field::FileName => entry
                .file
                .as_deref()
                .and_then(|f| std::path::Path::new(f).file_name())
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Field::PathName => entry.file.clone().unwrap_or_default(),
            Field::LineNo => entry.line.unwrap_or(0).to_string(),
            Field::Module => entry.module_path.clone().unwrap_or_default(),
            Field::Process => std::process::id().to_string(),
        }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self {
            pattern: Settings::DEFAULT_FORMAT.to_string(),
            segments: Self::parse(Settings::DEFAULT_FORMAT).unwrap_or_default(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl Formatter for PatternFormatter {
    fn format(&self, entry: &LogEntry) -> String {
        let mut out = String::with_capacity(self.pattern.len() + entry.message.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    field,
                    left_align,
                    width,
                } => {
                    let value = self.render_field(*field, entry);
                    match (width, left_align) {
                        (Some(w), true) => out.push_str(&format!("{:<w$}", value, w = *w)),
                        (Some(w), false) => out.push_str(&format!("{:>w$}", value, w = *w)),
                        (None, _) => out.push_str(&value),
                    }
                }
            }
        }

        if let Some(ref context) = entry.context {
            if !context.is_empty() {
                out.push(' ');
                out.push_str(&Self::sanitize(&context.format_fields()));
            }
        }
        if let Some(ref exception) = entry.exception {
            out.push_str(" | ");
            out.push_str(&Self::sanitize(exception));
        }
        out
    }

    fn name(&self) -> &str {
        "pattern"
    }

    fn pattern(&self) -> Option<&str> {
        Some(&self.pattern)
    }
}

/// One JSON object per record
///
/// Always contains `timestamp`, `level`, `logger`, `message` and `context`;
/// location, thread and exception fields are added when known.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::Iso8601,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn to_value(&self, entry: &LogEntry) -> serde_json::Value {
        use serde_json::Value;

        let mut json_obj = serde_json::Map::new();
        json_obj.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp_format.format(&entry.timestamp)),
        );
        json_obj.insert(
            "level".to_string(),
            Value::String(entry.level.to_str().to_string()),
        );
        json_obj.insert("logger".to_string(), Value::String(entry.logger_name.clone()));
        json_obj.insert("message".to_string(), Value::String(entry.message.clone()));
        json_obj.insert(
            "context".to_string(),
            entry
                .context
                .as_ref()
                .map(|c| c.to_json_object())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        );
        json_obj.insert("thread_id".to_string(), Value::String(entry.thread_id.clone()));
        if let Some(ref name) = entry.thread_name {
            json_obj.insert("thread_name".to_string(), Value::String(name.clone()));
        }
        if let Some(ref file) = entry.file {
            json_obj.insert("file".to_string(), Value::String(file.clone()));
        }
        if let Some(line) = entry.line {
            json_obj.insert("line".to_string(), Value::Number(line.into()));
        }
        if let Some(ref module_path) = entry.module_path {
            json_obj.insert("module".to_string(), Value::String(module_path.clone()));
        }
        if let Some(ref exception) = entry.exception {
            json_obj.insert("exception".to_string(), Value::String(exception.clone()));
        }
        Value::Object(json_obj)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> String {
        // Serializing a Value built from strings and integers cannot fail
        self.to_value(entry).to_string()
    }

    fn name(&self) -> &str {
        "json"
    }

    fn is_structured(&self) -> bool {
        true
    }
}
