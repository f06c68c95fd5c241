//! Telegram Adapter
//!
//! Telegram Bot adapter using teloxide for long-polling message reception.
//! Implements the RemoteAdapter trait with proxy support, attachment
//! extraction and message splitting for Telegram's 4096 character limit.

use std::path::Path;

use super::RemoteAdapter;
use crate::services::remote::types::{
    Attachment, AttachmentKind, IncomingRemoteMessage, RemoteAdapterType, RemoteError,
    TelegramAdapterConfig,
};
use async_trait::async_trait;
use remote_assistant_core::split_message;
use teloxide::types::Message;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Telegram Bot adapter using teloxide with long-polling.
pub struct TelegramAdapter {
    pub(crate) config: TelegramAdapterConfig,
    pub(crate) bot: teloxide::Bot,
    pub(crate) cancel_token: CancellationToken,
}

impl TelegramAdapter {
    /// Create a new Telegram adapter.
    ///
    /// teloxide builds its own reqwest client, which reads `HTTPS_PROXY` /
    /// `HTTP_PROXY`; a configured proxy is exported there before the bot is
    /// created.
    pub fn new(config: TelegramAdapterConfig) -> Result<Self, RemoteError> {
        let bot_token = config
            .bot_token
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RemoteError::ConfigError("Bot token is required".to_string()))?;

        if let Some(proxy_cfg) = &config.proxy {
            proxy_cfg
                .validate()
                .map_err(|e| RemoteError::ConfigError(e.to_string()))?;
            let proxy_url = proxy_cfg.url_with_auth();
            std::env::set_var("HTTPS_PROXY", &proxy_url);
            std::env::set_var("HTTP_PROXY", &proxy_url);
            tracing::info!("[Telegram] using proxy {}", proxy_cfg.url());
        }

        let bot = teloxide::Bot::new(bot_token);

        Ok(Self {
            config,
            bot,
            cancel_token: CancellationToken::new(),
        })
    }
}

fn attachment_of(msg: &Message) -> Option<Attachment> {
    if let Some(audio) = msg.audio() {
        return Some(Attachment {
            kind: AttachmentKind::Audio,
            file_id: audio.file.id.0.clone(),
            file_name: audio.file_name.clone(),
            size: u64::from(audio.file.size),
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(Attachment {
            kind: AttachmentKind::Voice,
            file_id: voice.file.id.0.clone(),
            file_name: None,
            size: u64::from(voice.file.size),
        });
    }
    if let Some(document) = msg.document() {
        return Some(Attachment {
            kind: AttachmentKind::Document,
            file_id: document.file.id.0.clone(),
            file_name: document.file_name.clone(),
            size: u64::from(document.file.size),
        });
    }
    // Telegram sends several sizes; the last one is the largest
    msg.photo().and_then(|sizes| sizes.last()).map(|photo| Attachment {
        kind: AttachmentKind::Photo,
        file_id: photo.file.id.0.clone(),
        file_name: None,
        size: u64::from(photo.file.size),
    })
}

fn to_incoming(msg: &Message) -> IncomingRemoteMessage {
    let user = msg.from.as_ref();
    IncomingRemoteMessage {
        adapter_type: RemoteAdapterType::Telegram,
        chat_id: msg.chat.id.0,
        user_id: user.map(|u| u.id.0 as i64).unwrap_or(0),
        username: user.and_then(|u| u.username.clone()),
        text: msg
            .text()
            .or_else(|| msg.caption())
            .unwrap_or_default()
            .to_string(),
        message_id: i64::from(msg.id.0),
        timestamp: chrono::Utc::now(),
        attachment: attachment_of(msg),
        reply_attachment: msg.reply_to_message().and_then(attachment_of),
    }
}

/// Telegram's pre entity measures the text in UTF-16 code units.
fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[async_trait]
impl RemoteAdapter for TelegramAdapter {
    fn adapter_type(&self) -> RemoteAdapterType {
        RemoteAdapterType::Telegram
    }

    fn max_message_length(&self) -> usize {
        self.config.max_message_length
    }

    async fn start(
        &self,
        command_tx: mpsc::Sender<IncomingRemoteMessage>,
    ) -> Result<(), RemoteError> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::types::Update;

        let bot = self.bot.clone();
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let handler =
                Update::filter_message().endpoint(move |msg: Message, _bot: teloxide::Bot| {
                    let tx = command_tx.clone();
                    async move {
                        let incoming = to_incoming(&msg);
                        tracing::debug!(
                            "[Telegram] update {} from chat {}",
                            incoming.message_id,
                            incoming.chat_id
                        );
                        if tx.send(incoming).await.is_err() {
                            tracing::warn!("[Telegram] message channel closed, dropping update");
                        }
                        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                    }
                });

            let mut dispatcher = Dispatcher::builder(bot, handler).build();

            let shutdown_token = dispatcher.shutdown_token();
            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                cancel_clone.cancelled().await;
                let _ = shutdown_token.shutdown();
            });

            tracing::info!("[Telegram] long polling started");
            dispatcher.dispatch().await;
            tracing::info!("[Telegram] long polling stopped");
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), RemoteError> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        use teloxide::prelude::*;

        for chunk in split_message(text, self.config.max_message_length) {
            if chunk.is_empty() {
                continue;
            }
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn send_preformatted(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::MessageEntity;

        if text.is_empty() {
            return Ok(());
        }
        self.bot
            .send_message(ChatId(chat_id), text)
            .entities(vec![MessageEntity::pre(None, 0, utf16_len(text))])
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::InputFile;

        let mut request = self
            .bot
            .send_document(ChatId(chat_id), InputFile::file(path.to_path_buf()));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        request
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::InputFile;

        self.bot
            .send_photo(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64, RemoteError> {
        use teloxide::net::Download;
        use teloxide::prelude::*;
        use teloxide::types::FileId;

        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| RemoteError::DownloadFailed(e.to_string()))?;

        let mut target = tokio::fs::File::create(dest)
            .await
            .map_err(|e| RemoteError::DownloadFailed(format!("{}: {}", dest.display(), e)))?;
        self.bot
            .download_file(&file.path, &mut target)
            .await
            .map_err(|e| RemoteError::DownloadFailed(e.to_string()))?;

        let size = tokio::fs::metadata(dest)
            .await
            .map_err(|e| RemoteError::DownloadFailed(e.to_string()))?
            .len();
        tracing::debug!("[Telegram] downloaded {} bytes to {}", size, dest.display());
        Ok(size)
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        use teloxide::prelude::*;

        self.bot
            .get_me()
            .await
            .map_err(|e| RemoteError::ConfigError(format!("Bot health check failed: {}", e)))?;
        Ok(())
    }
}
