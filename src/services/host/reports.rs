//! System snapshot and read-only tool reports.

use std::net::{IpAddr, UdpSocket};
use std::sync::Mutex;

use async_trait::async_trait;
use sysinfo::{Disks, System};

use super::command::{run_program, HELPER_TIMEOUT};
use super::{HostError, HostResult, ReportKind, SystemReports, SystemSnapshot};

/// Keep only `loginctl list-sessions` lines for Wayland sessions.
pub fn wayland_sessions(output: &str) -> String {
    output
        .lines()
        .filter(|line| line.contains("wayland"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Primary IPv4 address: the source address the kernel picks for an
/// outbound route. No packet is sent.
fn primary_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

/// `SystemReports` backed by sysinfo and the usual CLI tools.
pub struct SystemReporter {
    system: Mutex<System>,
}

impl SystemReporter {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn refresh(&self) -> HostResult<()> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| HostError::Failed("system info lock poisoned".to_string()))?;
        system.refresh_cpu_all();
        system.refresh_memory();
        Ok(())
    }
}

impl Default for SystemReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemReports for SystemReporter {
    async fn snapshot(&self) -> HostResult<SystemSnapshot> {
        self.refresh()?;
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        self.refresh()?;

        let (cpu_model, cpu_percent, ram_used, ram_total) = {
            let system = self
                .system
                .lock()
                .map_err(|_| HostError::Failed("system info lock poisoned".to_string()))?;
            let model = system
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            (
                model,
                system.global_cpu_usage(),
                system.used_memory(),
                system.total_memory(),
            )
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_used, disk_total) = disks
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"))
            .map(|d| (d.total_space().saturating_sub(d.available_space()), d.total_space()))
            .unwrap_or((0, 0));

        Ok(SystemSnapshot {
            host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            user: whoami::username(),
            ip: primary_ipv4()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            os: System::long_os_version()
                .unwrap_or_else(|| format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            // SAFETY: geteuid(2) cannot fail and touches no memory.
            is_root: unsafe { libc::geteuid() } == 0,
            cpu_model,
            cpu_percent,
            ram_used_bytes: ram_used,
            ram_total_bytes: ram_total,
            disk_used_bytes: disk_used,
            disk_total_bytes: disk_total,
        })
    }

    async fn report(&self, kind: ReportKind) -> HostResult<String> {
        match kind {
            ReportKind::Uptime => run_program("uptime", &[], HELPER_TIMEOUT).await,
            ReportKind::Who => match run_program("who", &[], HELPER_TIMEOUT).await {
                Ok(out) if !out.trim().is_empty() => Ok(out),
                _ => run_program("w", &[], HELPER_TIMEOUT).await,
            },
            ReportKind::Disks => run_program("df", &["-h"], HELPER_TIMEOUT).await,
            ReportKind::Memory => run_program("free", &["-h"], HELPER_TIMEOUT).await,
            ReportKind::AuthLog => run_program("last", &[], HELPER_TIMEOUT).await,
            ReportKind::Sessions => {
                let out = run_program("loginctl", &["list-sessions"], HELPER_TIMEOUT).await?;
                Ok(wayland_sessions(&out))
            }
        }
    }
}
