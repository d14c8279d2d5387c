//! Size-based rotating file sink
//!
//! Writes to `directory/file_name` and, once the next record would push the
//! file to `max_bytes`, shifts existing backups up by one (`app.log.1` becomes
//! `app.log.2`, ...), moves the live file to `app.log.1` and starts over.
//! With compression enabled backups are gzip files named `app.log.N.gz`.

use crate::core::error::{LoggerError, Result};
use crate::core::{LogEntry, LogLevel, SharedFormatter, Sink};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// When and how far to rotate
///
/// # Examples
///
/// ```
/// use domain_logger_system::appenders::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_bytes(1024 * 1024)
///     .with_backup_count(3)
///     .with_compression(true);
/// assert_eq!(policy.backup_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotation threshold in bytes; `0` disables rotation
    pub max_bytes: u64,
    /// Backups kept; `0` truncates the live file instead of rotating
    pub backup_count: usize,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            backup_count: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

pub struct RotatingFileSink {
    path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    level: LogLevel,
    formatter: Option<SharedFormatter>,
}

impl RotatingFileSink {
    /// Open `path` for appending, creating parent directories as needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open(&path)?;
        Ok(Self {
            path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            level: LogLevel::Trace,
            formatter: None,
        })
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_formatter(mut self, formatter: SharedFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Path of backup number `index` (`app.log.1`, or `app.log.1.gz` when compressing)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let plain = self.plain_backup_path(index);
        if self.policy.compress {
            gz_path(&plain)
        } else {
            plain
        }
    }

    /// Every name a backup in slot `index` may have, compressed first
    fn backup_variants(&self, index: usize) -> Vec<PathBuf> {
        let plain = self.plain_backup_path(index);
        if self.policy.compress {
            vec![gz_path(&plain), plain]
        } else {
            vec![plain]
        }
    }

    fn plain_backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", index));
        self.path.with_file_name(name)
    }

    fn open(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;
        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.policy.max_bytes > 0
            && self.current_size > 0
            && self.current_size + incoming >= self.policy.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.policy.backup_count == 0 {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)
                .map_err(|e| {
                    LoggerError::file_rotation(
                        self.path.display().to_string(),
                        format!("Failed to truncate log file: {}", e),
                    )
                })?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = 0;
            return Ok(());
        }

        for oldest in self.backup_variants(self.policy.backup_count) {
            if oldest.exists() {
                if let Err(e) = fs::remove_file(&oldest) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove oldest backup {}: {}",
                        oldest.display(),
                        e
                    );
                }
            }
        }

        for i in (1..self.policy.backup_count).rev() {
            for (from, to) in self.backup_variants(i).into_iter().zip(self.backup_variants(i + 1)) {
                if !from.exists() {
                    continue;
                }
                if fs::rename(&from, &to).is_err() {
                    // Some platforms refuse to rename over an existing file.
                    let _ = fs::remove_file(&to);
                    fs::rename(&from, &to).map_err(|e| {
                        LoggerError::file_rotation(
                            from.display().to_string(),
                            format!("Failed to shift backup: {}", e),
                        )
                    })?;
                }
            }
        }

        if self.path.exists() {
            let first = self.plain_backup_path(1);
            fs::rename(&self.path, &first).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to move current log file: {}", e),
                )
            })?;
            if self.policy.compress {
                // The plain backup keeps its slot and is shifted like a compressed one.
                if let Err(e) = compress_file(&first) {
                    eprintln!(
                        "[LOGGER WARNING] Keeping uncompressed backup {}: {}",
                        first.display(),
                        e
                    );
                }
            }
        }

        let (file, size) = Self::open(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }

    /// Rotate, falling back to the live file when rotation fails
    fn rotate_or_recover(&mut self) -> Result<()> {
        let Err(e) = self.rotate() else {
            return Ok(());
        };
        eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);

        if self.writer.is_none() {
            match Self::open(&self.path) {
                Ok((file, _)) => self.writer = Some(BufWriter::new(file)),
                Err(reopen_err) => {
                    eprintln!(
                        "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                        reopen_err
                    );
                    return Err(e);
                }
            }
        }
        // Let the file outgrow the limit rather than retry on every record.
        self.current_size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn emit(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = self.render(entry);
        line.push('\n');
        let incoming = line.len() as u64;

        if self.should_rotate(incoming) {
            self.rotate_or_recover()?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("file sink is closed"))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                )
            })?;
        self.current_size += incoming;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(self.path.display().to_string(), format!("Failed to flush: {}", e))
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        Ok(())
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
        "rotating_file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` to `path.gz`, removing the original only once the archive is complete
fn compress_file(path: &Path) -> Result<()> {
    let target = gz_path(path);
    let mut temp = target.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let result = (|| -> std::io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        std::io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp, &target)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PatternFormatter;
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn message_only() -> SharedFormatter {
        Arc::new(PatternFormatter::new("%(message)s").unwrap())
    }

    fn sink_at(dir: &Path, policy: RotationPolicy) -> RotatingFileSink {
        RotatingFileSink::new(dir.join("app.log"), policy)
            .unwrap()
            .with_formatter(message_only())
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let mut sink = sink_at(&nested, RotationPolicy::default());

        sink.emit(&LogEntry::new(LogLevel::Info, "hello")).unwrap();

        let content = fs::read_to_string(nested.join("app.log")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_rotates_before_crossing_limit() {
        let dir = tempdir().unwrap();
        // Every line is 10 bytes including the newline.
        let mut sink = sink_at(
            dir.path(),
            RotationPolicy::new().with_max_bytes(25).with_backup_count(2),
        );

        for i in 0..5 {
            sink.emit(&LogEntry::new(LogLevel::Info, format!("line-{:04}", i)))
                .unwrap();
        }

        let live = fs::read_to_string(dir.path().join("app.log")).unwrap();
        let first = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        let second = fs::read_to_string(dir.path().join("app.log.2")).unwrap();
        assert_eq!(live, "line-0004\n");
        assert_eq!(first, "line-0002\nline-0003\n");
        assert_eq!(second, "line-0000\nline-0001\n");
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempdir().unwrap();
        let mut sink = sink_at(
            dir.path(),
            RotationPolicy::new().with_max_bytes(15).with_backup_count(0),
        );

        sink.emit(&LogEntry::new(LogLevel::Info, "first-one")).unwrap();
        sink.emit(&LogEntry::new(LogLevel::Info, "second-on")).unwrap();

        let live = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(live, "second-on\n");
        assert!(!dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_zero_max_bytes_never_rotates() {
        let dir = tempdir().unwrap();
        let mut sink = sink_at(dir.path(), RotationPolicy::new().with_max_bytes(0));

        for _ in 0..50 {
            sink.emit(&LogEntry::new(LogLevel::Info, "x".repeat(100))).unwrap();
        }

        assert_eq!(sink.current_size(), 50 * 101);
        assert!(!dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_compressed_backups() {
        let dir = tempdir().unwrap();
        let mut sink = sink_at(
            dir.path(),
            RotationPolicy::new()
                .with_max_bytes(20)
                .with_backup_count(3)
                .with_compression(true),
        );

        sink.emit(&LogEntry::new(LogLevel::Info, "before-rotation"))
            .unwrap();
        sink.emit(&LogEntry::new(LogLevel::Info, "after-rotation"))
            .unwrap();

        let gz = dir.path().join("app.log.1.gz");
        assert!(gz.exists());
        assert!(!dir.path().join("app.log.1").exists());
        assert_eq!(sink.backup_path(1), gz);

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "before-rotation\n");
    }

    #[test]
    fn test_emit_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = sink_at(dir.path(), RotationPolicy::default());
        sink.close().unwrap();

        assert!(sink.emit(&LogEntry::new(LogLevel::Info, "late")).is_err());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.log"), "old\n").unwrap();
        let mut sink = sink_at(dir.path(), RotationPolicy::default());
        assert_eq!(sink.current_size(), 4);

        sink.emit(&LogEntry::new(LogLevel::Info, "new")).unwrap();
        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content, "old\nnew\n");
    }

    #[test]
    fn test_failed_compression_keeps_plain_backups() {
        let dir = tempdir().unwrap();
        // A directory squatting on the temp name makes every compression fail.
        fs::create_dir(dir.path().join("app.log.1.gz.tmp")).unwrap();
        let mut sink = sink_at(
            dir.path(),
            RotationPolicy::new()
                .with_max_bytes(20)
                .with_backup_count(3)
                .with_compression(true),
        );

        for message in ["generation-one", "generation-two", "generation-three"] {
            sink.emit(&LogEntry::new(LogLevel::Info, message)).unwrap();
        }

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("app.log"), "generation-three\n");
        assert_eq!(read("app.log.1"), "generation-two\n");
        assert_eq!(read("app.log.2"), "generation-one\n");
        assert!(!dir.path().join("app.log.1.gz").exists());
    }
}
