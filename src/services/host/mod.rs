//! Host Capability Providers
//!
//! Host-side operations the session drives: shell execution, process
//! listing and killing, desktop control, audio playback and system reports.
//! Each provider is a trait object so the session can run against the real
//! host or against [`mock`] providers in tests.
//!
//! ```text
//! SessionBridge ──► HostCapabilities ──► ShellExecutor    (sh -c, sudo -S)
//!                                    ├─► ProcessProvider  (sysinfo, kill)
//!                                    ├─► DesktopControl   (xdotool, amixer, ...)
//!                                    ├─► AudioPlayer      (mpv / ffplay / paplay)
//!                                    └─► SystemReports    (sysinfo, uptime, df, ...)
//! ```

pub mod audio;
pub mod command;
pub mod desktop;
pub mod filesystem;
pub mod mock;
pub mod processes;
pub mod reports;
pub mod shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use audio::{ExternalAudioPlayer, StopOutcome};
pub use desktop::{map_hotkey, LinuxDesktop, PowerAction, VolumeAction};
pub use processes::{aggregate_by_name, matches_name, top_by_cpu, SysinfoProcesses};
pub use reports::SystemReporter;
pub use shell::SystemShell;

/// Failure of a host operation, surfaced to the operator with its cause.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Command timed out after {}", format_timeout(.0))]
    Timeout(Duration),

    #[error("Command failed with exit code {code}\n{output}")]
    NonZeroExit { code: i32, output: String },

    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{0}")]
    Unavailable(String),

    #[error("Invalid argument: {0}")]
    Invalid(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

pub type HostResult<T> = Result<T, HostError>;

fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_millis() == 0 && timeout.as_secs() > 0 {
        format!("{} s", timeout.as_secs())
    } else {
        format!("{} ms", timeout.as_millis())
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// One shell line to run.
#[derive(Clone)]
pub struct ShellRequest {
    pub command: String,
    pub working_dir: PathBuf,
    /// sudo password; when set the line runs through `sudo -S`
    pub elevate_with: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for ShellRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellRequest")
            .field("command", &self.command)
            .field("working_dir", &self.working_dir)
            .field("elevated", &self.elevate_with.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run the line and return combined stdout/stderr.
    ///
    /// Never outlives `request.timeout`; a timed-out child is killed.
    async fn run(&self, request: ShellRequest) -> HostResult<String>;
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

/// One running process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub memory_mb: f64,
    pub cpu_percent: f32,
}

/// Processes sharing a name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessGroup {
    pub name: String,
    pub count: usize,
    pub memory_mb: f64,
    pub cpu_percent: f32,
    pub pids: Vec<u32>,
}

/// Outcome of a kill-by-name. Zero matches is a valid result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KillReport {
    pub killed: usize,
    pub failures: Vec<(u32, String)>,
}

#[async_trait]
pub trait ProcessProvider: Send + Sync {
    async fn list(&self) -> HostResult<Vec<ProcessEntry>>;

    /// Kill every process whose name contains `name` (case-insensitive).
    async fn kill_by_name(&self, name: &str) -> HostResult<KillReport>;
}

// ---------------------------------------------------------------------------
// Desktop
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DesktopControl: Send + Sync {
    /// Capture the screen into a PNG under `dest_dir`.
    async fn screenshot(&self, dest_dir: &Path) -> HostResult<PathBuf>;

    /// Press a chord of already-mapped key names.
    async fn send_hotkey(&self, keys: &[String]) -> HostResult<()>;

    async fn notify(&self, text: &str) -> HostResult<()>;

    async fn set_volume(&self, action: VolumeAction) -> HostResult<()>;

    async fn lock_screen(&self) -> HostResult<()>;

    async fn set_wallpaper(&self, image: &Path) -> HostResult<()>;

    async fn power(&self, action: PowerAction) -> HostResult<()>;
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Ownership of the host's audio output. Dropping the handle stops playback.
pub trait Playback: Send + Sync {
    fn pause(&mut self) -> HostResult<()>;
    fn resume(&mut self) -> HostResult<()>;
    fn stop(&mut self) -> HostResult<()>;
    /// False once the player exited on its own.
    fn is_active(&mut self) -> bool;
}

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start playing `media`; the returned handle owns the file.
    async fn play(&self, media: tempfile::TempPath) -> HostResult<Box<dyn Playback>>;
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Data behind `/info`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub host_name: String,
    pub user: String,
    pub ip: String,
    pub os: String,
    pub kernel: String,
    pub is_root: bool,
    pub cpu_model: String,
    pub cpu_percent: f32,
    pub ram_used_bytes: u64,
    pub ram_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
}

/// Read-only text reports backed by host tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Uptime,
    Who,
    Disks,
    Memory,
    AuthLog,
    Sessions,
}

#[async_trait]
pub trait SystemReports: Send + Sync {
    async fn snapshot(&self) -> HostResult<SystemSnapshot>;

    /// Raw tool output; empty means "nothing to report".
    async fn report(&self, kind: ReportKind) -> HostResult<String>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every provider the session uses.
#[derive(Clone)]
pub struct HostCapabilities {
    pub shell: Arc<dyn ShellExecutor>,
    pub processes: Arc<dyn ProcessProvider>,
    pub desktop: Arc<dyn DesktopControl>,
    pub audio: Arc<dyn AudioPlayer>,
    pub reports: Arc<dyn SystemReports>,
}

impl HostCapabilities {
    /// Providers backed by the real host.
    pub fn system() -> Self {
        Self {
            shell: Arc::new(SystemShell),
            processes: Arc::new(SysinfoProcesses::new()),
            desktop: Arc::new(LinuxDesktop::default()),
            audio: Arc::new(ExternalAudioPlayer::default()),
            reports: Arc::new(SystemReporter::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_request_debug_hides_password() {
        let request = ShellRequest {
            command: "apt update".to_string(),
            working_dir: PathBuf::from("/"),
            elevate_with: Some("hunter2".to_string()),
            timeout: Duration::from_secs(30),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("elevated: true"));
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::NonZeroExit {
            code: 2,
            output: "ls: cannot access".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command failed with exit code 2\nls: cannot access"
        );
        assert_eq!(
            HostError::Timeout(Duration::from_secs(30)).to_string(),
            "Command timed out after 30 s"
        );
        assert_eq!(
            HostError::Timeout(Duration::from_millis(200)).to_string(),
            "Command timed out after 200 ms"
        );
    }
}
