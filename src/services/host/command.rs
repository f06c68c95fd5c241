//! External program execution shared by the providers.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{HostError, HostResult};

/// Default bound for short helper programs (xdotool, amixer, df, ...).
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(15);

/// Exit status plus captured output of a finished child.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// stdout, then stderr under a separator when both are present.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() {
                text.push_str("\n--- stderr ---\n");
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// Ok with combined output on success, `NonZeroExit` otherwise.
    pub fn into_result(self) -> HostResult<String> {
        if self.status.success() {
            Ok(self.combined())
        } else {
            Err(HostError::NonZeroExit {
                code: self.status.code().unwrap_or(-1),
                output: self.combined(),
            })
        }
    }
}

/// How long to keep reading once the child has exited. A background process
/// that inherited the pipes is not waited for.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// One output pipe read to completion on its own task.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl Drain {
    fn spawn<R>(mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = buf.clone();
        let task = tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(|p| p.into_inner())
                        .extend_from_slice(&chunk[..n]),
                }
            }
        });
        Self { buf, task }
    }

    /// Whatever was read by `deadline`.
    async fn finish(mut self, deadline: Instant) -> Vec<u8> {
        if tokio::time::timeout_at(deadline, &mut self.task).await.is_err() {
            self.task.abort();
        }
        let mut buf = self.buf.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *buf)
    }

    fn abort(self) {
        self.task.abort();
    }
}

/// Wait for `child` with a deadline, draining both pipes concurrently.
///
/// On timeout the child is killed and `HostError::Timeout` is returned. After
/// a normal exit the pipes are read for at most `DRAIN_GRACE`, still bounded
/// by the same deadline.
pub async fn capture(mut child: Child, timeout: Duration) -> HostResult<Captured> {
    let deadline = Instant::now() + timeout;
    let stdout = child.stdout.take().map(Drain::spawn);
    let stderr = child.stderr.take().map(Drain::spawn);

    let status = match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            let _ = child.kill().await;
            stdout.into_iter().chain(stderr).for_each(Drain::abort);
            return Err(HostError::Timeout(timeout));
        }
    };

    let drain_deadline = deadline.min(Instant::now() + DRAIN_GRACE);
    let stdout = match stdout {
        Some(drain) => drain.finish(drain_deadline).await,
        None => Vec::new(),
    };
    let stderr = match stderr {
        Some(drain) => drain.finish(drain_deadline).await,
        None => Vec::new(),
    };

    Ok(Captured {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Spawn `program` with piped output. A missing binary becomes `Unavailable`.
pub fn spawn_piped(command: &mut Command, program: &str) -> HostResult<Child> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))
}

pub fn spawn_error(program: &str, err: std::io::Error) -> HostError {
    if err.kind() == std::io::ErrorKind::NotFound {
        HostError::Unavailable(format!("{} is not installed", program))
    } else {
        HostError::Spawn {
            program: program.to_string(),
            message: err.to_string(),
        }
    }
}

/// Run `program args..` and return its combined output.
pub async fn run_program(program: &str, args: &[&str], timeout: Duration) -> HostResult<String> {
    let child = spawn_piped(Command::new(program).args(args), program)?;
    capture(child, timeout).await?.into_result()
}

/// Try each candidate in order; the first success wins, otherwise the last
/// error is returned.
pub async fn run_first_available(
    candidates: &[(&str, Vec<String>)],
    timeout: Duration,
) -> HostResult<String> {
    let mut last_err = HostError::Unavailable("no candidate program".to_string());
    for (program, args) in candidates {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match run_program(program, &args, timeout).await {
            Ok(out) => return Ok(out),
            Err(e) => {
                tracing::debug!("[Host] {} failed: {}", program, e);
                last_err = e;
            }
        }
    }
    Err(last_err)
}
