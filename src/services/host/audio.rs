//! Audio playback through an external player process.
//!
//! The handle owns both the player child and the downloaded media file;
//! dropping it kills the player and deletes the file. Pause and resume are
//! SIGSTOP/SIGCONT on the player.

use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::process::{Child, Command};

use super::command::spawn_error;
use super::{AudioPlayer, HostError, HostResult, Playback};

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NothingPlaying,
}

/// Player binaries in preference order.
#[derive(Debug, Clone)]
pub struct ExternalAudioPlayer {
    players: Vec<(&'static str, Vec<&'static str>)>,
}

impl Default for ExternalAudioPlayer {
    fn default() -> Self {
        Self {
            players: vec![
                ("mpv", vec!["--no-video", "--really-quiet"]),
                ("ffplay", vec!["-nodisp", "-autoexit", "-loglevel", "quiet"]),
                ("paplay", vec![]),
            ],
        }
    }
}

impl ExternalAudioPlayer {
    pub fn with_players(players: Vec<(&'static str, Vec<&'static str>)>) -> Self {
        Self { players }
    }
}

#[async_trait]
impl AudioPlayer for ExternalAudioPlayer {
    async fn play(&self, media: TempPath) -> HostResult<Box<dyn Playback>> {
        let mut last_err = HostError::Unavailable("no audio player configured".to_string());
        for (program, args) in &self.players {
            let spawned = Command::new(program)
                .args(args)
                .arg(&*media)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn();
            match spawned {
                Ok(child) => {
                    tracing::info!("[Audio] playing {} with {}", media.display(), program);
                    return Ok(Box::new(ProcessPlayback {
                        child,
                        _media: media,
                        paused: false,
                    }));
                }
                Err(e) => {
                    last_err = spawn_error(program, e);
                    tracing::debug!("[Audio] {}", last_err);
                }
            }
        }
        Err(last_err)
    }
}

/// A running player process.
#[derive(Debug)]
pub struct ProcessPlayback {
    child: Child,
    _media: TempPath,
    paused: bool,
}

impl ProcessPlayback {
    fn signal(&mut self, signal: libc::c_int) -> HostResult<()> {
        if !self.is_active() {
            return Err(HostError::Unavailable("playback already finished".to_string()));
        }
        let pid = self
            .child
            .id()
            .and_then(|id| libc::pid_t::try_from(id).ok())
            .ok_or_else(|| HostError::Unavailable("playback already finished".to_string()))?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(HostError::Io(std::io::Error::last_os_error()))
        }
    }
}

impl Playback for ProcessPlayback {
    fn pause(&mut self) -> HostResult<()> {
        if self.paused && self.is_active() {
            return Ok(());
        }
        self.signal(libc::SIGSTOP)?;
        self.paused = true;
        Ok(())
    }

    fn resume(&mut self) -> HostResult<()> {
        if !self.paused && self.is_active() {
            return Ok(());
        }
        self.signal(libc::SIGCONT)?;
        self.paused = false;
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        if self.is_active() {
            self.child.start_kill()?;
        }
        Ok(())
    }

    fn is_active(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for ProcessPlayback {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}
