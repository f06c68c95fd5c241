//! Session Bridge
//!
//! Carries out a [`Route`] chosen by the session state machine: calls the
//! host capability providers or the chunked transfer codec, formats the
//! result, and sends it back through the adapter. Every failure ends up as
//! one message to the operator; nothing here can stop the session loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use remote_assistant_core::split_message;
use remote_assistant_transfer::{ChunkedTransfer, FileSink, TransferError};

use super::adapters::RemoteAdapter;
use super::command_router::{CommandKind, CommandRouter};
use super::i18n::{fill, text, Language, Text};
use super::response_mapper::ResponseMapper;
use super::session::{Route, Session};
use super::types::{Attachment, IncomingRemoteMessage};
use crate::services::host::filesystem::{
    change_directory, list_directory, make_directory, parent_directory, remove_path, resolve,
    sanitize_file_name,
};
use crate::services::host::shell::SUDO_PREFIX;
use crate::services::host::{
    aggregate_by_name, map_hotkey, top_by_cpu, HostCapabilities, PowerAction, ReportKind,
    ShellRequest, StopOutcome, VolumeAction,
};

/// Knobs the bridge needs from the application config.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub shell_timeout: Duration,
    pub credential_ttl: Duration,
    pub top_processes: usize,
    /// File delivered by `/logs`
    pub log_path: PathBuf,
    /// Scratch space for audio, wallpapers and screenshots
    pub scratch_dir: PathBuf,
}

/// Outbound side for one chat.
pub struct Outbox {
    adapter: Arc<dyn RemoteAdapter>,
    chat_id: i64,
}

impl Outbox {
    pub fn new(adapter: Arc<dyn RemoteAdapter>, chat_id: i64) -> Self {
        Self { adapter, chat_id }
    }

    /// Send plain text. Send failures are logged, not returned.
    pub async fn text(&self, body: &str) {
        if let Err(e) = self.adapter.send_message(self.chat_id, body).await {
            tracing::warn!("[SessionBridge] send to {} failed: {}", self.chat_id, e);
        }
    }

    /// Send a monospaced report, one message per page. Pages break at line
    /// boundaries and concatenate back to `body`.
    pub async fn report(&self, body: &str) {
        for page in split_message(body, self.adapter.max_message_length()) {
            if page.is_empty() {
                continue;
            }
            if let Err(e) = self.adapter.send_preformatted(self.chat_id, &page).await {
                tracing::warn!("[SessionBridge] page send to {} failed: {}", self.chat_id, e);
                return;
            }
        }
    }
}

#[async_trait]
impl FileSink for Outbox {
    async fn send_file(&self, path: &Path, caption: Option<&str>) -> Result<(), String> {
        self.adapter
            .send_document(self.chat_id, path, caption)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Executes routes against the host.
pub struct SessionBridge {
    adapter: Arc<dyn RemoteAdapter>,
    host: HostCapabilities,
    transfer: ChunkedTransfer,
    settings: BridgeSettings,
}

impl SessionBridge {
    pub fn new(
        adapter: Arc<dyn RemoteAdapter>,
        host: HostCapabilities,
        transfer: ChunkedTransfer,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            adapter,
            host,
            transfer,
            settings,
        }
    }

    pub fn outbox(&self, chat_id: i64) -> Outbox {
        Outbox::new(self.adapter.clone(), chat_id)
    }

    /// Greet the peer after the transport comes up.
    pub async fn announce(&self, session: &Session) {
        let lang = session.language();
        let out = self.outbox(session.peer_id());
        out.text(&fill(text(lang, Text::Started), &[&env!("CARGO_PKG_VERSION")]))
            .await;
        match self.host.reports.snapshot().await {
            Ok(snapshot) => {
                out.text(&ResponseMapper::format_system_info(lang, &snapshot, session.cwd()))
                    .await
            }
            Err(e) => tracing::warn!("[SessionBridge] startup snapshot failed: {}", e),
        }
    }

    /// Carry out one route.
    pub async fn execute(&self, session: &mut Session, msg: &IncomingRemoteMessage, route: Route) {
        let lang = session.language();
        let out = self.outbox(msg.chat_id);

        match route {
            Route::Duplicate => {}
            Route::Unauthorized => out.text(text(lang, Text::Unauthorized)).await,
            Route::Unknown => out.text(text(lang, Text::UnknownCommand)).await,
            Route::Prompt(spec) | Route::ConfirmRequired(spec) => {
                if let Some(prompt) = spec.prompt {
                    out.text(text(lang, prompt)).await;
                }
            }
            Route::PlayAudio(attachment) => self.play_audio(session, &out, &attachment).await,
            Route::UploadFile(attachment) => self.save_upload(session, &out, &attachment).await,
            Route::SetWallpaper(attachment) => self.set_wallpaper(lang, &out, &attachment).await,
            Route::Execute { kind, argument } => {
                self.run_command(session, &out, kind, argument).await
            }
        }
    }

    async fn run_command(
        &self,
        session: &mut Session,
        out: &Outbox,
        kind: CommandKind,
        argument: Option<String>,
    ) {
        let lang = session.language();
        let arg = argument.as_deref().unwrap_or_default();

        match kind {
            CommandKind::Help => out.text(&CommandRouter::help_text(lang)).await,
            CommandKind::Info => match self.host.reports.snapshot().await {
                Ok(snapshot) => {
                    out.text(&ResponseMapper::format_system_info(lang, &snapshot, session.cwd()))
                        .await
                }
                Err(e) => out.text(&ResponseMapper::format_error(lang, &e)).await,
            },
            CommandKind::Logs => {
                let log_path = self.settings.log_path.clone();
                self.deliver(lang, out, &log_path).await
            }
            CommandKind::Shell => self.run_shell(session, out, arg).await,
            CommandKind::SudoPass => {
                session
                    .credential()
                    .set(arg.to_string(), self.settings.credential_ttl);
                tracing::info!(
                    "[SessionBridge] sudo password set, expires in {} s",
                    self.settings.credential_ttl.as_secs()
                );
                out.text(text(lang, Text::SudoPassSet)).await
            }
            CommandKind::ClearSudo => {
                session.credential().clear();
                out.text(text(lang, Text::SudoPassCleared)).await
            }
            CommandKind::Processes => match self.host.processes.list().await {
                Ok(entries) if entries.is_empty() => out.text(text(lang, Text::NoProcesses)).await,
                Ok(entries) => {
                    let groups = aggregate_by_name(&entries);
                    out.report(&ResponseMapper::format_process_table(&groups)).await
                }
                Err(e) => out.text(&ResponseMapper::format_error(lang, &e)).await,
            },
            CommandKind::Top => match self.host.processes.list().await {
                Ok(entries) => {
                    let top = top_by_cpu(&entries, self.settings.top_processes);
                    out.report(&ResponseMapper::format_top(&top)).await
                }
                Err(e) => out.text(&ResponseMapper::format_error(lang, &e)).await,
            },
            CommandKind::Kill => match self.host.processes.kill_by_name(arg).await {
                Ok(report) => out.text(&ResponseMapper::format_kill_report(arg, &report)).await,
                Err(e) => out.text(&ResponseMapper::format_error(lang, &e)).await,
            },
            CommandKind::Download => {
                let target = resolve(session.cwd(), arg);
                if !target.exists() {
                    out.text(text(lang, Text::FileNotFound)).await;
                } else {
                    self.deliver(lang, out, &target).await
                }
            }
            CommandKind::Upload => match change_directory(session.cwd(), arg) {
                Ok(dir) => {
                    out.text(&fill(text(lang, Text::UploadReady), &[&dir.display()]))
                        .await;
                    session.set_cwd(dir);
                }
                Err(e) => out.text(&fill(text(lang, Text::CdError), &[&e])).await,
            },
            CommandKind::Cd => match change_directory(session.cwd(), arg) {
                Ok(dir) => {
                    out.text(&fill(text(lang, Text::CdSuccess), &[&dir.display()]))
                        .await;
                    session.set_cwd(dir);
                }
                Err(e) => out.text(&fill(text(lang, Text::CdError), &[&e])).await,
            },
            CommandKind::CdParent => match parent_directory(session.cwd()) {
                Some(dir) => {
                    out.text(&fill(text(lang, Text::CdSuccess), &[&dir.display()]))
                        .await;
                    session.set_cwd(dir);
                }
                None => out.text(text(lang, Text::AlreadyAtRoot)).await,
            },
            CommandKind::Pwd => match list_directory(session.cwd()) {
                Ok(entries) => {
                    out.report(&ResponseMapper::format_directory(lang, session.cwd(), &entries))
                        .await
                }
                Err(e) => out.text(&fill(text(lang, Text::CdError), &[&e])).await,
            },
            CommandKind::Screenshot => self.screenshot(lang, out).await,
            CommandKind::Play => out.text(text(lang, Text::PlayUsage)).await,
            CommandKind::PauseAudio => match session.active_playback() {
                Some(playback) => match playback.pause() {
                    Ok(()) => out.text(text(lang, Text::AudioPaused)).await,
                    Err(e) => out.text(&fill(text(lang, Text::AudioError), &[&e])).await,
                },
                None => out.text(text(lang, Text::NoAudio)).await,
            },
            CommandKind::ResumeAudio => match session.active_playback() {
                Some(playback) => match playback.resume() {
                    Ok(()) => out.text(text(lang, Text::AudioResumed)).await,
                    Err(e) => out.text(&fill(text(lang, Text::AudioError), &[&e])).await,
                },
                None => out.text(text(lang, Text::NoAudio)).await,
            },
            CommandKind::StopAudio => match session.stop_playback() {
                Ok(StopOutcome::Stopped) => out.text(text(lang, Text::AudioStopped)).await,
                Ok(StopOutcome::NothingPlaying) => out.text(text(lang, Text::NoAudio)).await,
                Err(e) => out.text(&fill(text(lang, Text::AudioError), &[&e])).await,
            },
            CommandKind::Hotkey => {
                let result = match map_hotkey(arg) {
                    Ok(keys) => self.host.desktop.send_hotkey(&keys).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => out.text(&fill(text(lang, Text::HotkeySent), &[&arg])).await,
                    Err(e) => out.text(&fill(text(lang, Text::HotkeyError), &[&e])).await,
                }
            }
            CommandKind::Language => {
                let lang = session.toggle_language();
                out.text(&fill(text(lang, Text::LanguageChanged), &[&lang]))
                    .await
            }
            CommandKind::Reboot => self.power(lang, out, PowerAction::Reboot, "reboot").await,
            CommandKind::Shutdown => {
                self.power(lang, out, PowerAction::Shutdown, "shutdown")
                    .await
            }
            CommandKind::Notify => match self.host.desktop.notify(arg).await {
                Ok(()) => out.text(&fill(text(lang, Text::NotifySent), &[&arg])).await,
                Err(e) => out.text(&fill(text(lang, Text::NotifyError), &[&e])).await,
            },
            CommandKind::Volume => {
                let result = match VolumeAction::parse(arg) {
                    Ok(action) => self.host.desktop.set_volume(action).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => out.text(&fill(text(lang, Text::VolumeSet), &[&arg])).await,
                    Err(e) => out.text(&fill(text(lang, Text::VolumeError), &[&e])).await,
                }
            }
            CommandKind::Mkdir => match make_directory(session.cwd(), arg) {
                Ok(dir) => {
                    out.text(&fill(text(lang, Text::MkdirSuccess), &[&dir.display()]))
                        .await
                }
                Err(e) => out.text(&fill(text(lang, Text::MkdirError), &[&e])).await,
            },
            CommandKind::Rm => match remove_path(session.cwd(), arg) {
                Ok(path) => {
                    out.text(&fill(text(lang, Text::RmSuccess), &[&path.display()]))
                        .await
                }
                Err(e) => out.text(&fill(text(lang, Text::RmError), &[&e])).await,
            },
            CommandKind::Lock => match self.host.desktop.lock_screen().await {
                Ok(()) => out.text(text(lang, Text::LockSuccess)).await,
                Err(e) => out.text(&fill(text(lang, Text::LockError), &[&e])).await,
            },
            CommandKind::Uptime => self.report(lang, out, ReportKind::Uptime).await,
            CommandKind::Who => self.report(lang, out, ReportKind::Who).await,
            CommandKind::Disks => self.report(lang, out, ReportKind::Disks).await,
            CommandKind::Memory => self.report(lang, out, ReportKind::Memory).await,
            CommandKind::AuthLog => self.report(lang, out, ReportKind::AuthLog).await,
            CommandKind::Sessions => self.report(lang, out, ReportKind::Sessions).await,
        }
    }

    async fn run_shell(&self, session: &Session, out: &Outbox, line: &str) {
        let lang = session.language();
        let (command, elevate_with) = match line.strip_prefix(SUDO_PREFIX) {
            Some(rest) => match session.credential().get() {
                Some(secret) => (rest.trim().to_string(), Some(secret)),
                None => {
                    out.text(text(lang, Text::SudoPassRequired)).await;
                    return;
                }
            },
            None => (line.to_string(), None),
        };

        let request = ShellRequest {
            command,
            working_dir: session.cwd().to_path_buf(),
            elevate_with,
            timeout: self.settings.shell_timeout,
        };
        tracing::info!("[SessionBridge] shell {:?}", request);

        match self.host.shell.run(request).await {
            Ok(output) => out.report(&output).await,
            Err(e) => out.report(&ResponseMapper::format_error(lang, &e)).await,
        }
    }

    async fn report(&self, lang: Language, out: &Outbox, kind: ReportKind) {
        match self.host.reports.report(kind).await {
            Ok(output) => {
                let body = ResponseMapper::format_report(lang, kind, &output);
                if output.trim().is_empty() {
                    out.text(&body).await
                } else {
                    out.report(&body).await
                }
            }
            Err(e) => out.text(&ResponseMapper::format_error(lang, &e)).await,
        }
    }

    async fn power(&self, lang: Language, out: &Outbox, action: PowerAction, label: &str) {
        out.text(&fill(text(lang, Text::PowerStarting), &[&label]))
            .await;
        if let Err(e) = self.host.desktop.power(action).await {
            out.text(&ResponseMapper::format_error(lang, &e)).await;
        }
    }

    async fn deliver(&self, lang: Language, out: &Outbox, target: &Path) {
        match self.transfer.deliver(target, out).await {
            Ok(report) => tracing::info!(
                "[SessionBridge] delivered {} ({} part(s), chunked: {})",
                target.display(),
                report.parts,
                report.chunked
            ),
            Err(TransferError::NotFound(_)) => out.text(text(lang, Text::FileNotFound)).await,
            Err(e) => {
                tracing::warn!("[SessionBridge] transfer of {} failed: {}", target.display(), e);
                out.text(&fill(text(lang, Text::TransferFailed), &[&e])).await
            }
        }
    }

    async fn screenshot(&self, lang: Language, out: &Outbox) {
        let shot = match self.host.desktop.screenshot(&self.settings.scratch_dir).await {
            Ok(path) => path,
            Err(e) => {
                out.text(&fill(text(lang, Text::ScreenshotError), &[&e])).await;
                return;
            }
        };
        let sent = self.adapter.send_photo(out.chat_id, &shot).await;
        if let Err(e) = tokio::fs::remove_file(&shot).await {
            tracing::warn!("[SessionBridge] could not remove {}: {}", shot.display(), e);
        }
        match sent {
            Ok(()) => out.text(text(lang, Text::ScreenshotSent)).await,
            Err(e) => out.text(&fill(text(lang, Text::ScreenshotError), &[&e])).await,
        }
    }

    async fn play_audio(&self, session: &mut Session, out: &Outbox, attachment: &Attachment) {
        let lang = session.language();
        let suffix = attachment
            .file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".ogg".to_string());

        let media = match tempfile::Builder::new()
            .prefix("audio-")
            .suffix(&suffix)
            .tempfile_in(&self.settings.scratch_dir)
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => {
                out.text(&fill(text(lang, Text::AudioError), &[&e])).await;
                return;
            }
        };
        if let Err(e) = self.adapter.download_file(&attachment.file_id, &media).await {
            out.text(&fill(text(lang, Text::AudioError), &[&e])).await;
            return;
        }

        // release the output before the next player starts
        if let Err(e) = session.stop_playback() {
            tracing::warn!("[SessionBridge] stopping previous playback failed: {}", e);
        }

        match self.host.audio.play(media).await {
            Ok(playback) => {
                session.start_playback(playback);
                let name = attachment.file_name.as_deref().unwrap_or("voice");
                out.text(&fill(text(lang, Text::AudioPlaying), &[&name])).await
            }
            Err(e) => out.text(&fill(text(lang, Text::AudioError), &[&e])).await,
        }
    }

    async fn save_upload(&self, session: &Session, out: &Outbox, attachment: &Attachment) {
        let lang = session.language();
        let name = attachment
            .file_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| format!("upload-{}", attachment.file_id));
        let dest = session.cwd().join(name);

        // an existing file of the same name is only replaced by a complete download
        let partial = match tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(session.cwd())
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => {
                out.text(&ResponseMapper::format_error(lang, &e)).await;
                return;
            }
        };

        let bytes = match self.adapter.download_file(&attachment.file_id, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                out.text(&ResponseMapper::format_remote_error(lang, &e)).await;
                return;
            }
        };
        match partial.persist(&dest) {
            Ok(()) => {
                tracing::info!("[SessionBridge] saved {} ({} bytes)", dest.display(), bytes);
                out.text(&fill(text(lang, Text::FileSaved), &[&dest.display()]))
                    .await
            }
            Err(e) => out.text(&ResponseMapper::format_error(lang, &e.error)).await,
        }
    }

    async fn set_wallpaper(&self, lang: Language, out: &Outbox, attachment: &Attachment) {
        let name = attachment
            .file_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| "wallpaper.jpg".to_string());
        let dir = self.settings.scratch_dir.join("wallpapers");
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            out.text(&fill(text(lang, Text::WallpaperError), &[&e])).await;
            return;
        }
        let dest = dir.join(name);

        let result = match self.adapter.download_file(&attachment.file_id, &dest).await {
            Ok(_) => self
                .host
                .desktop
                .set_wallpaper(&dest)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => out.text(text(lang, Text::WallpaperSet)).await,
            Err(e) => out.text(&fill(text(lang, Text::WallpaperError), &[&e])).await,
        }
    }
}
