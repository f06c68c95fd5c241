//! Remote Adapters
//!
//! Trait definition for the chat transport. An adapter receives updates and
//! forwards them as [`IncomingRemoteMessage`]s, and sends text, pages and
//! files back to a chat.

pub mod mock;
pub mod telegram;

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{IncomingRemoteMessage, RemoteAdapterType, RemoteError};

/// Remote adapter trait for platform-specific message handling.
///
/// Adapters are responsible for:
/// - Receiving messages from the remote platform (long-polling)
/// - Sending text, monospaced pages, documents and photos
/// - Downloading attachments referenced by inbound messages
/// - Health checking connectivity
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// Adapter type identifier
    fn adapter_type(&self) -> RemoteAdapterType;

    /// Largest text the platform accepts in one message.
    fn max_message_length(&self) -> usize;

    /// Start the adapter (begin receiving messages).
    ///
    /// Every inbound message is forwarded through `command_tx` in arrival
    /// order; the adapter does no authorization of its own.
    async fn start(
        &self,
        command_tx: mpsc::Sender<IncomingRemoteMessage>,
    ) -> Result<(), RemoteError>;

    /// Stop the adapter gracefully.
    async fn stop(&self) -> Result<(), RemoteError>;

    /// Send plain text, split at line boundaries if it is too long.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), RemoteError>;

    /// Send one page of monospaced text. Callers keep it within
    /// [`max_message_length`](Self::max_message_length).
    async fn send_preformatted(&self, chat_id: i64, text: &str) -> Result<(), RemoteError>;

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), RemoteError>;

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), RemoteError>;

    /// Download an attachment into `dest`, returning the byte count.
    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64, RemoteError>;

    /// Check adapter health/connectivity.
    ///
    /// For Telegram, this calls the getMe API to verify the bot token.
    async fn health_check(&self) -> Result<(), RemoteError>;
}
