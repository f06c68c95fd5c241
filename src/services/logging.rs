//! Logging Setup
//!
//! Installs the global tracing subscriber: a human-readable stdout layer and a
//! plain-text file layer. The file layer writes through a non-blocking worker
//! into a [`RotatingLogFile`], which keeps a single append-only log plus at most
//! one `.old` generation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::models::settings::LoggingSettings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_log_path;

/// Append-only log file with one-generation rotation.
///
/// When a write would push the file past `max_bytes`, the current file is
/// renamed to `<name>.old` (replacing any previous one) and a fresh file is
/// started. The same check runs when the file is opened.
#[derive(Debug)]
pub struct RotatingLogFile {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingLogFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if existing > max_bytes {
            fs::rename(&path, rotated_path(&path))?;
        }

        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, rotated_path(&self.path))?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// `<path>.old`
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

/// Keeps the file writer alive; drop it only at process exit.
#[derive(Debug)]
pub struct LoggingGuard {
    log_path: PathBuf,
    _guard: WorkerGuard,
}

impl LoggingGuard {
    /// The file `/logs` delivers.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> AppResult<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let log_path = settings.file.clone().unwrap_or_else(default_log_path);
    let file = RotatingLogFile::open(&log_path, settings.max_bytes)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let stdout_layer = fmt::layer().with_target(false).with_writer(io::stdout);
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::internal(format!("failed to install logger: {}", e)))?;

    Ok(LoggingGuard {
        log_path,
        _guard: guard,
    })
}
