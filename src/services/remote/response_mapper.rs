//! Response Mapper
//!
//! Turns provider results into operator-facing text. Table reports are plain
//! monospaced text; the bridge pages and sends them preformatted.

use std::path::Path;

use remote_assistant_core::truncate;

use super::i18n::{fill, text, Language, Text};
use super::types::RemoteError;
use crate::services::host::filesystem::DirEntryInfo;
use crate::services::host::{KillReport, ProcessEntry, ProcessGroup, ReportKind, SystemSnapshot};

const NAME_WIDTH: usize = 30;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Response formatter for remote platform display.
pub struct ResponseMapper;

impl ResponseMapper {
    /// `/info` report.
    pub fn format_system_info(lang: Language, snapshot: &SystemSnapshot, cwd: &Path) -> String {
        let gb = |bytes: u64| format!("{:.1}", bytes as f64 / GIB);
        let percent = |used: u64, total: u64| {
            if total == 0 {
                "0.0".to_string()
            } else {
                format!("{:.1}", used as f64 * 100.0 / total as f64)
            }
        };

        fill(
            text(lang, Text::SystemInfo),
            &[
                &snapshot.host_name,
                &snapshot.user,
                &snapshot.ip,
                &snapshot.os,
                &snapshot.kernel,
                &env!("CARGO_PKG_VERSION"),
                &snapshot.is_root,
                &cwd.display(),
                &snapshot.cpu_model,
                &format!("{:.1}", snapshot.cpu_percent),
                &gb(snapshot.ram_used_bytes),
                &gb(snapshot.ram_total_bytes),
                &percent(snapshot.ram_used_bytes, snapshot.ram_total_bytes),
                &gb(snapshot.disk_used_bytes),
                &gb(snapshot.disk_total_bytes),
                &percent(snapshot.disk_used_bytes, snapshot.disk_total_bytes),
            ],
        )
    }

    /// `/ps` table: one row per process name.
    pub fn format_process_table(groups: &[ProcessGroup]) -> String {
        let mut out = format!(
            "{:<30} {:>5} {:>10} {:>10} {}\n",
            "Name", "Cnt", "Mem(MB)", "CPU(%)", "PIDs"
        );
        for group in groups {
            let shown: Vec<String> = group.pids.iter().take(3).map(u32::to_string).collect();
            let mut pids = shown.join(",");
            if group.pids.len() > 3 {
                pids.push_str(&format!(" +{}", group.pids.len() - 3));
            }
            out.push_str(&format!(
                "{:<30} {:>5} {:>10.1} {:>10.1} {}\n",
                truncate(&group.name, NAME_WIDTH),
                group.count,
                group.memory_mb,
                group.cpu_percent,
                pids
            ));
        }
        out
    }

    /// `/top` table.
    pub fn format_top(entries: &[ProcessEntry]) -> String {
        let mut out = format!("{:<30} {:>10} {:>10} {}\n", "Name", "Mem(MB)", "CPU(%)", "PID");
        for entry in entries {
            out.push_str(&format!(
                "{:<30} {:>10.1} {:>10.1} {}\n",
                truncate(&entry.name, NAME_WIDTH),
                entry.memory_mb,
                entry.cpu_percent,
                entry.pid
            ));
        }
        out
    }

    pub fn format_kill_report(name: &str, report: &KillReport) -> String {
        let mut out = format!("Killed {} processes named {}", report.killed, name);
        if !report.failures.is_empty() {
            out.push_str("\nErrors:");
            for (pid, error) in &report.failures {
                out.push_str(&format!("\n{}: {}", pid, error));
            }
        }
        out
    }

    /// `/pwd` listing.
    pub fn format_directory(lang: Language, dir: &Path, entries: &[DirEntryInfo]) -> String {
        let mut out = fill(text(lang, Text::DirectoryHeader), &[&dir.display()]);
        if entries.is_empty() {
            out.push_str(text(lang, Text::EmptyDirectory));
            return out;
        }
        for entry in entries {
            let size = Self::human_size(entry.size);
            if entry.is_dir {
                out.push_str(&format!("📁 {}/ ({})\n", entry.name, size));
            } else {
                out.push_str(&format!("📄 {} ({})\n", entry.name, size));
            }
        }
        out
    }

    pub fn human_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * 1024;
        if bytes >= MB {
            format!("{:.1}MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1}KB", bytes as f64 / KB as f64)
        } else {
            format!("{}B", bytes)
        }
    }

    /// Read-only report output, with the fixed message when there is nothing to show.
    pub fn format_report(lang: Language, kind: ReportKind, output: &str) -> String {
        if !output.trim().is_empty() {
            return output.to_string();
        }
        match kind {
            ReportKind::Who => text(lang, Text::NoUsers).to_string(),
            ReportKind::Sessions => text(lang, Text::NoWaylandSessions).to_string(),
            _ => String::new(),
        }
    }

    /// Format an error for display.
    pub fn format_error(lang: Language, error: &(dyn std::fmt::Display + Sync)) -> String {
        fill(text(lang, Text::Error), &[error])
    }

    /// Format a remote error for display.
    pub fn format_remote_error(lang: Language, error: &RemoteError) -> String {
        match error {
            RemoteError::Unauthorized => text(lang, Text::Unauthorized).to_string(),
            RemoteError::Transfer(cause) => fill(text(lang, Text::TransferFailed), &[cause]),
            other => Self::format_error(lang, other),
        }
    }
}
