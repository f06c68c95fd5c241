//! Session State Machine
//!
//! Owns the per-process session state (working directory, pending prompt,
//! sudo credential, playback handle, language) and classifies each inbound
//! message into a [`Route`]. It performs no I/O; the session bridge carries
//! out whatever the route asks for.
//!
//! Classification order for one message:
//!
//! 1. wrong chat → [`Route::Unauthorized`], nothing changes
//! 2. already-seen message id → [`Route::Duplicate`]
//! 3. attachment → audio / file / image route, armed prompt left in place
//! 4. known command → execute, arm a prompt, or ask for confirmation
//! 5. armed prompt → the whole text is that command's argument
//! 6. otherwise → [`Route::Unknown`]

use std::path::{Path, PathBuf};

use super::command_router::{
    Argument, CommandKind, CommandRouter, CommandSpec, ParsedInput, CONFIRM_WORD,
};
use super::credential::CredentialSlot;
use super::i18n::Language;
use super::types::{Attachment, AttachmentClass, IncomingRemoteMessage};
use crate::services::host::{HostResult, Playback, StopOutcome};

/// The single outstanding "next message is the argument" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingPrompt {
    #[default]
    Idle,
    AwaitingArgument(CommandKind),
}

/// What to do with one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Unauthorized,
    Duplicate,
    PlayAudio(Attachment),
    UploadFile(Attachment),
    SetWallpaper(Attachment),
    /// Send the command's usage prompt
    Prompt(&'static CommandSpec),
    /// Send the confirmation request; nothing runs
    ConfirmRequired(&'static CommandSpec),
    Execute {
        kind: CommandKind,
        argument: Option<String>,
    },
    Unknown,
}

impl Route {
    /// Short label for logs and tracing spans.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Unauthorized => "unauthorized",
            Route::Duplicate => "duplicate",
            Route::PlayAudio(_) => "play_audio",
            Route::UploadFile(_) => "upload_file",
            Route::SetWallpaper(_) => "set_wallpaper",
            Route::Prompt(spec) | Route::ConfirmRequired(spec) => spec.token,
            Route::Execute { kind, .. } => CommandRouter::spec_for(*kind)
                .map(|spec| spec.token)
                .unwrap_or("command"),
            Route::Unknown => "unknown",
        }
    }
}

pub struct Session {
    peer_id: i64,
    cwd: PathBuf,
    prompt: PendingPrompt,
    credential: CredentialSlot,
    playback: Option<Box<dyn Playback>>,
    language: Language,
    last_message_id: Option<i64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer_id", &self.peer_id)
            .field("cwd", &self.cwd)
            .field("prompt", &self.prompt)
            .field("credential", &self.credential)
            .field("playing", &self.playback.is_some())
            .field("language", &self.language)
            .finish()
    }
}

impl Session {
    pub fn new(peer_id: i64, cwd: PathBuf, language: Language) -> Self {
        Self {
            peer_id,
            cwd,
            prompt: PendingPrompt::Idle,
            credential: CredentialSlot::new(),
            playback: None,
            language,
            last_message_id: None,
        }
    }

    pub fn peer_id(&self) -> i64 {
        self.peer_id
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: PathBuf) {
        tracing::debug!("[Session] cwd -> {}", cwd.display());
        self.cwd = cwd;
    }

    pub fn prompt(&self) -> PendingPrompt {
        self.prompt
    }

    pub fn credential(&self) -> &CredentialSlot {
        &self.credential
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn toggle_language(&mut self) -> Language {
        self.language = self.language.toggle();
        self.language
    }

    /// Classify one inbound message and update the prompt slot.
    pub fn route(&mut self, msg: &IncomingRemoteMessage) -> Route {
        if msg.chat_id != self.peer_id {
            tracing::warn!(
                "[Session] rejected message from chat {} (user {}, @{})",
                msg.chat_id,
                msg.user_id,
                msg.username.as_deref().unwrap_or("-")
            );
            return Route::Unauthorized;
        }

        if self
            .last_message_id
            .is_some_and(|last| msg.message_id <= last)
        {
            tracing::debug!("[Session] skipping redelivered message {}", msg.message_id);
            return Route::Duplicate;
        }
        self.last_message_id = Some(msg.message_id);

        if let Some(attachment) = &msg.attachment {
            if let PendingPrompt::AwaitingArgument(kind) = self.prompt {
                tracing::warn!(
                    "[Session] attachment received while /{} prompt is armed; prompt kept",
                    CommandRouter::spec_for(kind).map(|s| s.token).unwrap_or("?")
                );
            }
            return match attachment.classify() {
                AttachmentClass::Audio => Route::PlayAudio(attachment.clone()),
                AttachmentClass::File => Route::UploadFile(attachment.clone()),
                AttachmentClass::Image => Route::SetWallpaper(attachment.clone()),
            };
        }

        match CommandRouter::parse(&msg.text) {
            ParsedInput::Command { spec, argument } => self.route_command(spec, argument, msg),
            ParsedInput::Text(text) => match self.prompt {
                PendingPrompt::AwaitingArgument(kind) => {
                    let argument = text.trim();
                    if argument.is_empty() {
                        // keep waiting and repeat the usage text
                        return CommandRouter::spec_for(kind)
                            .map(Route::Prompt)
                            .unwrap_or(Route::Unknown);
                    }
                    self.prompt = PendingPrompt::Idle;
                    Route::Execute {
                        kind,
                        argument: Some(argument.to_string()),
                    }
                }
                PendingPrompt::Idle => Route::Unknown,
            },
        }
    }

    fn route_command(
        &mut self,
        spec: &'static CommandSpec,
        argument: Option<String>,
        msg: &IncomingRemoteMessage,
    ) -> Route {
        self.prompt = PendingPrompt::Idle;

        if spec.kind == CommandKind::Play {
            return match &msg.reply_attachment {
                Some(att) if att.classify() == AttachmentClass::Audio => {
                    Route::PlayAudio(att.clone())
                }
                _ => Route::Prompt(spec),
            };
        }

        match (spec.argument, argument) {
            (Argument::Required, None) => {
                self.prompt = PendingPrompt::AwaitingArgument(spec.kind);
                Route::Prompt(spec)
            }
            (Argument::Optional, None) => Route::Prompt(spec),
            (Argument::Confirm, Some(arg)) if arg == CONFIRM_WORD => Route::Execute {
                kind: spec.kind,
                argument: Some(arg),
            },
            (Argument::Confirm, _) => Route::ConfirmRequired(spec),
            (_, argument) => Route::Execute {
                kind: spec.kind,
                argument,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Playback ownership
    // -----------------------------------------------------------------------

    /// Take ownership of a new playback, stopping the previous one first.
    pub fn start_playback(&mut self, playback: Box<dyn Playback>) {
        if let Some(mut previous) = self.playback.take() {
            if let Err(e) = previous.stop() {
                tracing::warn!("[Session] failed to stop previous playback: {}", e);
            }
        }
        self.playback = Some(playback);
    }

    /// The current playback if its player is still running.
    pub fn active_playback(&mut self) -> Option<&mut Box<dyn Playback>> {
        if self.playback.as_mut().is_some_and(|p| !p.is_active()) {
            self.playback = None;
        }
        self.playback.as_mut()
    }

    /// Stop and release the playback handle.
    pub fn stop_playback(&mut self) -> HostResult<StopOutcome> {
        match self.playback.take() {
            Some(mut playback) => {
                if playback.is_active() {
                    playback.stop()?;
                    Ok(StopOutcome::Stopped)
                } else {
                    Ok(StopOutcome::NothingPlaying)
                }
            }
            None => Ok(StopOutcome::NothingPlaying),
        }
    }
}
