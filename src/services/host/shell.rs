//! Shell Executor
//!
//! Runs one line through `sh -c` in the session directory. Elevated lines go
//! through `sudo -S` with the password written to stdin, so it never appears
//! in the process table.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::command::{capture, spawn_error};
use super::{HostResult, ShellExecutor, ShellRequest};

/// Marker that asks for elevation through the stored credential.
pub const SUDO_PREFIX: &str = "sudo ";

/// `ShellExecutor` backed by `/bin/sh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, request: ShellRequest) -> HostResult<String> {
        let mut cmd = match &request.elevate_with {
            Some(_) => {
                let mut cmd = Command::new("sudo");
                cmd.args(["-S", "-p", "", "--", "sh", "-c", request.command.as_str()]);
                cmd
            }
            None => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(&request.command);
                cmd
            }
        };
        let program = if request.elevate_with.is_some() { "sudo" } else { "sh" };

        cmd.current_dir(&request.working_dir)
            .stdin(if request.elevate_with.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| spawn_error(program, e))?;

        if let (Some(password), Some(mut stdin)) = (&request.elevate_with, child.stdin.take()) {
            stdin.write_all(password.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            // EOF so sudo does not wait for a retry
            drop(stdin);
        }

        tracing::debug!(
            "[Shell] running in {} (elevated: {})",
            request.working_dir.display(),
            request.elevate_with.is_some()
        );

        let captured = capture(child, request.timeout).await?;
        let output = captured.into_result()?;
        if output.is_empty() {
            Ok("Command completed successfully with no output".to_string())
        } else {
            Ok(output)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::services::host::HostError;
    use std::path::PathBuf;
    use std::time::Duration;

    fn request(command: &str, dir: PathBuf, timeout_ms: u64) -> ShellRequest {
        ShellRequest {
            command: command.to_string(),
            working_dir: dir,
            elevate_with: None,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let out = SystemShell
            .run(request("pwd", canonical.clone(), 5000))
            .await
            .unwrap();
        assert_eq!(out.trim(), canonical.to_string_lossy());
    }

    #[tokio::test]
    async fn test_empty_output_message() {
        let dir = tempfile::tempdir().unwrap();
        let out = SystemShell
            .run(request("true", dir.path().to_path_buf(), 5000))
            .await
            .unwrap();
        assert_eq!(out, "Command completed successfully with no output");
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemShell
            .run(request("echo broken >&2; exit 1", dir.path().to_path_buf(), 5000))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::NonZeroExit { code: 1, .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let err = SystemShell
            .run(request("sleep 10", dir.path().to_path_buf(), 200))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_backgrounded_job_returns_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let out = SystemShell
            .run(request("sleep 5 & echo started", dir.path().to_path_buf(), 10_000))
            .await
            .unwrap();
        assert_eq!(out.trim(), "started");
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
