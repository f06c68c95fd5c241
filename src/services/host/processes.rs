//! Process listing and kill-by-name backed by sysinfo.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use super::{HostError, HostResult, KillReport, ProcessEntry, ProcessGroup, ProcessProvider};

/// Case-insensitive substring match used by kill-by-name.
pub fn matches_name(process_name: &str, query: &str) -> bool {
    process_name
        .to_lowercase()
        .contains(&query.trim().to_lowercase())
}

/// Group processes by name, heaviest memory first.
pub fn aggregate_by_name(entries: &[ProcessEntry]) -> Vec<ProcessGroup> {
    let mut groups: HashMap<&str, ProcessGroup> = HashMap::new();
    for entry in entries {
        let group = groups
            .entry(entry.name.as_str())
            .or_insert_with(|| ProcessGroup {
                name: entry.name.clone(),
                count: 0,
                memory_mb: 0.0,
                cpu_percent: 0.0,
                pids: Vec::new(),
            });
        group.count += 1;
        group.memory_mb += entry.memory_mb;
        group.cpu_percent += entry.cpu_percent;
        group.pids.push(entry.pid);
    }

    let mut groups: Vec<ProcessGroup> = groups.into_values().collect();
    for group in &mut groups {
        group.pids.sort_unstable();
    }
    groups.sort_by(|a, b| {
        b.memory_mb
            .total_cmp(&a.memory_mb)
            .then_with(|| a.name.cmp(&b.name))
    });
    groups
}

/// The `n` busiest processes by CPU.
pub fn top_by_cpu(entries: &[ProcessEntry], n: usize) -> Vec<ProcessEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    sorted.truncate(n);
    sorted
}

/// `ProcessProvider` over the live process table.
pub struct SysinfoProcesses {
    system: Mutex<System>,
}

impl SysinfoProcesses {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn refresh(&self) -> HostResult<()> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| HostError::Failed("process table lock poisoned".to_string()))?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        Ok(())
    }

    fn snapshot(&self) -> HostResult<Vec<ProcessEntry>> {
        let system = self
            .system
            .lock()
            .map_err(|_| HostError::Failed("process table lock poisoned".to_string()))?;
        Ok(system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
                cpu_percent: process.cpu_usage(),
            })
            .collect())
    }
}

impl Default for SysinfoProcesses {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessProvider for SysinfoProcesses {
    async fn list(&self) -> HostResult<Vec<ProcessEntry>> {
        // CPU usage is a delta between two refreshes
        self.refresh()?;
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        self.refresh()?;
        self.snapshot()
    }

    async fn kill_by_name(&self, name: &str) -> HostResult<KillReport> {
        if name.trim().is_empty() {
            return Err(HostError::Invalid("process name is empty".to_string()));
        }

        self.refresh()?;
        let own_pid = std::process::id();
        let mut report = KillReport::default();

        for entry in self.snapshot()? {
            if entry.pid == own_pid || !matches_name(&entry.name, name) {
                continue;
            }
            match send_kill(entry.pid) {
                Ok(()) => report.killed += 1,
                Err(e) => report.failures.push((entry.pid, e.to_string())),
            }
        }

        tracing::info!(
            "[Processes] kill '{}': {} killed, {} failed",
            name,
            report.killed,
            report.failures.len()
        );
        Ok(report)
    }
}

fn send_kill(pid: u32) -> std::io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
