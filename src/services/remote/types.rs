//! Remote Control Types
//!
//! Transport configuration, inbound message model, attachment classification,
//! gateway status and the remote error taxonomy.

use remote_assistant_core::ProxyConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Adapter & Configuration Types
// ---------------------------------------------------------------------------

/// Remote adapter type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RemoteAdapterType {
    Telegram,
}

impl fmt::Display for RemoteAdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteAdapterType::Telegram => write!(f, "telegram"),
        }
    }
}

/// Telegram-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramAdapterConfig {
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    /// The one chat allowed to command the host
    pub peer_chat_id: i64,
    pub max_message_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for TelegramAdapterConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            peer_chat_id: 0,
            max_message_length: 4000,
            proxy: None,
        }
    }
}

/// Configuration for reconnect behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Base delay in milliseconds for exponential backoff (default: 1000)
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (default: 60000)
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 60000,
        }
    }
}

impl ReconnectConfig {
    /// Calculate the delay for a given reconnect attempt using exponential backoff.
    ///
    /// Formula: `min(2^attempt * base_delay_ms, max_delay_ms)`
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        delay.min(self.max_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Gateway runtime status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub running: bool,
    pub adapter_type: RemoteAdapterType,
    pub connected_since: Option<String>,
    pub total_commands_processed: u64,
    pub last_command_at: Option<String>,
    pub error: Option<String>,
}

impl Default for GatewayStatus {
    fn default() -> Self {
        Self {
            running: false,
            adapter_type: RemoteAdapterType::Telegram,
            connected_since: None,
            total_commands_processed: 0,
            last_command_at: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message Types
// ---------------------------------------------------------------------------

/// How the transport delivered a binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Audio,
    Voice,
    Photo,
    Document,
}

/// What the session does with an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentClass {
    Audio,
    Image,
    File,
}

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// A binary payload on an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_id: String,
    /// Name declared by the sender, if any
    pub file_name: Option<String>,
    pub size: u64,
}

impl Attachment {
    fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Classify by transport kind first, then by declared extension.
    pub fn classify(&self) -> AttachmentClass {
        match self.kind {
            AttachmentKind::Audio | AttachmentKind::Voice => AttachmentClass::Audio,
            AttachmentKind::Photo => AttachmentClass::Image,
            AttachmentKind::Document => match self.extension() {
                Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => AttachmentClass::Audio,
                Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => AttachmentClass::Image,
                _ => AttachmentClass::File,
            },
        }
    }
}

/// Incoming message from remote platform
#[derive(Debug, Clone)]
pub struct IncomingRemoteMessage {
    pub adapter_type: RemoteAdapterType,
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    /// Text or caption; empty for bare attachments
    pub text: String,
    pub message_id: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub attachment: Option<Attachment>,
    /// Attachment of the message this one replies to
    pub reply_attachment: Option<Attachment>,
}

impl IncomingRemoteMessage {
    /// A plain text message, as tests and the mock adapter build them.
    pub fn text(chat_id: i64, message_id: i64, text: &str) -> Self {
        Self {
            adapter_type: RemoteAdapterType::Telegram,
            chat_id,
            user_id: chat_id,
            username: None,
            text: text.to_string(),
            message_id,
            timestamp: chrono::Utc::now(),
            attachment: None,
            reply_attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn replying_to(mut self, attachment: Attachment) -> Self {
        self.reply_attachment = Some(attachment);
        self
    }
}

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// Remote control error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote gateway is not enabled")]
    NotEnabled,

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Failed to download file: {0}")]
    DownloadFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
