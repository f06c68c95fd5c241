//! Recording providers for tests and dry runs.
//!
//! Every mock keeps a log of what it was asked to do so tests can assert on
//! host side effects without touching the machine.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempPath;

use super::{
    matches_name, AudioPlayer, DesktopControl, HostCapabilities, HostError, HostResult,
    KillReport, Playback, PowerAction, ProcessEntry, ProcessProvider, ReportKind, ShellExecutor,
    ShellRequest, SystemReports, SystemSnapshot, VolumeAction,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Returns queued responses in order, then `ran: <command>`.
#[derive(Default)]
pub struct MockShell {
    requests: Mutex<Vec<ShellRequest>>,
    responses: Mutex<VecDeque<HostResult<String>>>,
    hang: AtomicBool,
}

impl MockShell {
    /// Every later command records its request and then never finishes.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn push_response(&self, response: HostResult<String>) {
        lock(&self.responses).push_back(response);
    }

    pub fn requests(&self) -> Vec<ShellRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ShellExecutor for MockShell {
    async fn run(&self, request: ShellRequest) -> HostResult<String> {
        let command = request.command.clone();
        lock(&self.requests).push(request);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(format!("ran: {}", command)))
    }
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

/// An in-memory process table; kill removes matching rows.
#[derive(Default)]
pub struct MockProcesses {
    table: Mutex<Vec<ProcessEntry>>,
}

impl MockProcesses {
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self {
            table: Mutex::new(entries),
        }
    }

    pub fn remaining(&self) -> Vec<ProcessEntry> {
        lock(&self.table).clone()
    }
}

#[async_trait]
impl ProcessProvider for MockProcesses {
    async fn list(&self) -> HostResult<Vec<ProcessEntry>> {
        Ok(self.remaining())
    }

    async fn kill_by_name(&self, name: &str) -> HostResult<KillReport> {
        if name.trim().is_empty() {
            return Err(HostError::Invalid("process name is empty".to_string()));
        }
        let mut table = lock(&self.table);
        let before = table.len();
        table.retain(|entry| !matches_name(&entry.name, name));
        Ok(KillReport {
            killed: before - table.len(),
            failures: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Desktop
// ---------------------------------------------------------------------------

/// Records each desktop call as a short string such as `notify:hello`.
#[derive(Default)]
pub struct MockDesktop {
    calls: Mutex<Vec<String>>,
    headless: bool,
}

impl MockDesktop {
    /// A desktop with no display attached; screenshots fail.
    pub fn headless() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            headless: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl DesktopControl for MockDesktop {
    async fn screenshot(&self, dest_dir: &Path) -> HostResult<PathBuf> {
        if self.headless {
            return Err(HostError::Unavailable("no display".to_string()));
        }
        let target = dest_dir.join("screenshot-mock.png");
        tokio::fs::write(&target, b"\x89PNG\r\n\x1a\n").await?;
        self.record("screenshot".to_string());
        Ok(target)
    }

    async fn send_hotkey(&self, keys: &[String]) -> HostResult<()> {
        self.record(format!("hotkey:{}", keys.join("+")));
        Ok(())
    }

    async fn notify(&self, text: &str) -> HostResult<()> {
        self.record(format!("notify:{}", text));
        Ok(())
    }

    async fn set_volume(&self, action: VolumeAction) -> HostResult<()> {
        self.record(format!("volume:{}", action.amixer_value()));
        Ok(())
    }

    async fn lock_screen(&self) -> HostResult<()> {
        self.record("lock".to_string());
        Ok(())
    }

    async fn set_wallpaper(&self, image: &Path) -> HostResult<()> {
        self.record(format!("wallpaper:{}", image.display()));
        Ok(())
    }

    async fn power(&self, action: PowerAction) -> HostResult<()> {
        self.record(format!("power:{:?}", action).to_lowercase());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Hands out numbered playback handles that log `play:N`, `pause:N`,
/// `resume:N`, `stop:N` and `release:N` into a shared event list.
#[derive(Default)]
pub struct MockAudio {
    events: Arc<Mutex<Vec<String>>>,
    started: Mutex<usize>,
}

impl MockAudio {
    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl AudioPlayer for MockAudio {
    async fn play(&self, media: TempPath) -> HostResult<Box<dyn Playback>> {
        let id = {
            let mut started = lock(&self.started);
            *started += 1;
            *started
        };
        lock(&self.events).push(format!("play:{}", id));
        Ok(Box::new(MockPlayback {
            id,
            events: Arc::clone(&self.events),
            _media: media,
            active: true,
        }))
    }
}

struct MockPlayback {
    id: usize,
    events: Arc<Mutex<Vec<String>>>,
    _media: TempPath,
    active: bool,
}

impl MockPlayback {
    fn log(&self, event: &str) {
        lock(&self.events).push(format!("{}:{}", event, self.id));
    }
}

impl Playback for MockPlayback {
    fn pause(&mut self) -> HostResult<()> {
        self.log("pause");
        Ok(())
    }

    fn resume(&mut self) -> HostResult<()> {
        self.log("resume");
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        if self.active {
            self.active = false;
            self.log("stop");
        }
        Ok(())
    }

    fn is_active(&mut self) -> bool {
        self.active
    }
}

impl Drop for MockPlayback {
    fn drop(&mut self) {
        self.log("release");
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Fixed snapshot plus per-kind canned output (empty when unset).
pub struct MockReports {
    snapshot: SystemSnapshot,
    outputs: Mutex<HashMap<ReportKind, String>>,
}

impl Default for MockReports {
    fn default() -> Self {
        Self {
            snapshot: SystemSnapshot {
                host_name: "testhost".to_string(),
                user: "operator".to_string(),
                ip: "192.168.1.10".to_string(),
                os: "Linux (Test 1.0)".to_string(),
                kernel: "6.1.0".to_string(),
                is_root: false,
                cpu_model: "Test CPU".to_string(),
                cpu_percent: 12.5,
                ram_used_bytes: 2 * 1024 * 1024 * 1024,
                ram_total_bytes: 8 * 1024 * 1024 * 1024,
                disk_used_bytes: 50 * 1024 * 1024 * 1024,
                disk_total_bytes: 200 * 1024 * 1024 * 1024,
            },
            outputs: Mutex::new(HashMap::new()),
        }
    }
}

impl MockReports {
    pub fn set_output(&self, kind: ReportKind, output: &str) {
        lock(&self.outputs).insert(kind, output.to_string());
    }
}

#[async_trait]
impl SystemReports for MockReports {
    async fn snapshot(&self) -> HostResult<SystemSnapshot> {
        Ok(self.snapshot.clone())
    }

    async fn report(&self, kind: ReportKind) -> HostResult<String> {
        Ok(lock(&self.outputs).get(&kind).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Concrete handles to every mock plus a [`HostCapabilities`] view of them.
#[derive(Clone, Default)]
pub struct MockHost {
    pub shell: Arc<MockShell>,
    pub processes: Arc<MockProcesses>,
    pub desktop: Arc<MockDesktop>,
    pub audio: Arc<MockAudio>,
    pub reports: Arc<MockReports>,
}

impl MockHost {
    pub fn with_processes(entries: Vec<ProcessEntry>) -> Self {
        Self {
            processes: Arc::new(MockProcesses::new(entries)),
            ..Self::default()
        }
    }

    pub fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            shell: self.shell.clone(),
            processes: self.processes.clone(),
            desktop: self.desktop.clone(),
            audio: self.audio.clone(),
            reports: self.reports.clone(),
        }
    }
}
