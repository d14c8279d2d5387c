//! Console sink

use crate::core::{Formatter, LogEntry, LogLevel, Result, SharedFormatter, Sink};
use colored::Colorize;
use std::io::Write;

/// Which standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
    /// ERROR and FATAL to stderr, everything else to stdout
    #[default]
    Split,
}

impl ConsoleStream {
    fn is_stderr(self, level: LogLevel) -> bool {
        match self {
            ConsoleStream::Stdout => false,
            ConsoleStream::Stderr => true,
            ConsoleStream::Split => level >= LogLevel::Error,
        }
    }
}

pub struct ConsoleSink {
    stream: ConsoleStream,
    use_colors: bool,
    level: LogLevel,
    formatter: Option<SharedFormatter>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            stream: ConsoleStream::default(),
            use_colors: false,
            level: LogLevel::Trace,
            formatter: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_stream(mut self, stream: ConsoleStream) -> Self {
        self.stream = stream;
        self
    }

    /// Color whole lines by level; ignored for structured formatters
    #[must_use = "builder methods return a new value"]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_formatter(mut self, formatter: SharedFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    fn colorize(&self, level: LogLevel, line: String) -> String {
        let structured = self.formatter.as_ref().is_some_and(|f| f.is_structured());
        if self.use_colors && !structured {
            line.color(level.color_code()).to_string()
        } else {
            line
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn emit(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.colorize(entry.level, self.render(entry));
        if self.stream.is_stderr(entry.level) {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush()?,
            ConsoleStream::Stderr => std::io::stderr().flush()?,
            ConsoleStream::Split => {
                std::io::stdout().flush()?;
                std::io::stderr().flush()?;
            }
        }
        Ok(())
    }

    // Standard streams stay open for the rest of the process.
    fn close(&mut self) -> Result<()> {
        self.flush()
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
        "console"
    }
}
