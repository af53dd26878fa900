//! Sink resolution
//!
//! Derives the dated log file path and wires the writer every record goes
//! through: standard output plus a size-rotated file. Rotation itself
//! (thresholds, backup naming, pruning, gzip) is done by `file_rotate`.

use crate::config::LoggerConfig;
use crate::errors::{LogError, Result};
use applog_core_types::schema::FILE_DATE_FORMAT;
use chrono::{Local, NaiveDate, Utc};
use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::writer::{MakeWriterExt, Tee};
use tracing_subscriber::fmt::MakeWriter;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Stamp the file name of `base` with `date`
///
/// `logs/logs.log` becomes `logs/logs-2024-03-09.log`; a name without an
/// extension gets the date appended.
pub fn dated_path(base: &Path, date: NaiveDate) -> PathBuf {
    let stamp = date.format(FILE_DATE_FORMAT);
    let name = match (base.file_stem(), base.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}-{}.{}",
            stem.to_string_lossy(),
            stamp,
            ext.to_string_lossy()
        ),
        (Some(stem), None) => format!("{}-{}", stem.to_string_lossy(), stamp),
        _ => format!("logs-{}.log", stamp),
    };
    base.with_file_name(name)
}

/// Today's calendar date, local or UTC
pub fn today(local_time: bool) -> NaiveDate {
    if local_time {
        Local::now().date_naive()
    } else {
        Utc::now().date_naive()
    }
}

/// The file a logger built today writes to
pub fn resolve_path(config: &LoggerConfig) -> PathBuf {
    dated_path(&config.file_name, today(config.local_time))
}

fn content_limit(config: &LoggerConfig) -> ContentLimit {
    match config.max_size {
        0 => ContentLimit::None,
        mb => ContentLimit::BytesSurpassed(
            usize::try_from(mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX),
        ),
    }
}

// file_rotate prunes by count or by age, not both; a count limit takes precedence.
fn file_limit(config: &LoggerConfig) -> FileLimit {
    if config.max_backups > 0 {
        FileLimit::MaxFiles(config.max_backups)
    } else if config.max_age > 0 {
        FileLimit::Age(chrono::Duration::days(i64::from(config.max_age)))
    } else {
        FileLimit::Unlimited
    }
}

fn compression(config: &LoggerConfig) -> Compression {
    if config.compress {
        Compression::OnRotate(0)
    } else {
        Compression::None
    }
}

/// Size-rotated log file, shareable between threads
#[derive(Clone)]
pub struct RotatingSink {
    path: PathBuf,
    file: Arc<Mutex<FileRotate<AppendTimestamp>>>,
}

impl RotatingSink {
    /// Open (or create) the rotating file at `path` with the limits in `config`
    pub fn open(config: &LoggerConfig, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| LogError::sink(parent, err))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| LogError::sink(path, err))?;

        let file = FileRotate::new(
            path,
            AppendTimestamp::default(file_limit(config)),
            content_limit(config),
            compression(config),
            #[cfg(unix)]
            None,
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered bytes to disk
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, FileRotate<AppendTimestamp>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RotatingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Exclusive handle on the rotating file for the duration of one record
pub struct SinkWriter<'a> {
    file: MutexGuard<'a, FileRotate<AppendTimestamp>>,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Drop for SinkWriter<'_> {
    fn drop(&mut self) {
        let _ = self.file.flush();
    }
}

impl<'a> MakeWriter<'a> for RotatingSink {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { file: self.lock() }
    }
}

/// Writer duplicating every record to standard output and the rotating file
pub type FanOut = Tee<fn() -> io::Stdout, RotatingSink>;

pub fn fan_out(sink: RotatingSink) -> FanOut {
    let console: fn() -> io::Stdout = io::stdout;
    console.and(sink)
}
