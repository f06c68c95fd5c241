//! Recording adapter for tests.
//!
//! Captures everything sent, serves downloads from registered in-memory
//! files, and lets tests inject inbound messages once started.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::RemoteAdapter;
use crate::services::remote::types::{IncomingRemoteMessage, RemoteAdapterType, RemoteError};

/// One outbound item.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
    },
    Preformatted {
        chat_id: i64,
        text: String,
    },
    Document {
        chat_id: i64,
        file_name: String,
        caption: Option<String>,
        bytes: Vec<u8>,
    },
    Photo {
        chat_id: i64,
        file_name: String,
    },
}

impl Sent {
    /// Text of a text or preformatted message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } | Sent::Preformatted { text, .. } => Some(text),
            _ => None,
        }
    }
}

pub struct MockAdapter {
    max_message_length: usize,
    sent: Mutex<Vec<Sent>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    inbound: Mutex<Option<mpsc::Sender<IncomingRemoteMessage>>>,
    /// Zero-based index of the document send that fails
    fail_document_at: Mutex<Option<usize>>,
    documents_attempted: AtomicU32,
    health_failures: AtomicU32,
    health_checks: AtomicU32,
    stopped: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new(4000)
    }
}

impl MockAdapter {
    pub fn new(max_message_length: usize) -> Self {
        Self {
            max_message_length,
            sent: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            inbound: Mutex::new(None),
            fail_document_at: Mutex::new(None),
            documents_attempted: AtomicU32::new(0),
            health_failures: AtomicU32::new(0),
            health_checks: AtomicU32::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Make `file_id` downloadable with the given content.
    pub fn register_file(&self, file_id: &str, content: &[u8]) {
        lock(&self.files).insert(file_id.to_string(), content.to_vec());
    }

    pub fn fail_document_at(&self, index: usize) {
        *lock(&self.fail_document_at) = Some(index);
    }

    /// The next `n` health checks fail.
    pub fn fail_health_checks(&self, n: u32) {
        self.health_failures.store(n, Ordering::SeqCst);
    }

    pub fn health_checks(&self) -> u32 {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.sent).clone()
    }

    /// Drain and return what was sent so far.
    pub fn take_sent(&self) -> Vec<Sent> {
        std::mem::take(&mut *lock(&self.sent))
    }

    /// All text bodies sent so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    /// Push an inbound message as if it came from the platform.
    pub async fn inject(&self, msg: IncomingRemoteMessage) -> Result<(), RemoteError> {
        let tx = lock(&self.inbound)
            .clone()
            .ok_or(RemoteError::NotEnabled)?;
        tx.send(msg)
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))
    }

    fn record(&self, item: Sent) {
        lock(&self.sent).push(item);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl RemoteAdapter for MockAdapter {
    fn adapter_type(&self) -> RemoteAdapterType {
        RemoteAdapterType::Telegram
    }

    fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    async fn start(
        &self,
        command_tx: mpsc::Sender<IncomingRemoteMessage>,
    ) -> Result<(), RemoteError> {
        *lock(&self.inbound) = Some(command_tx);
        Ok(())
    }

    async fn stop(&self) -> Result<(), RemoteError> {
        lock(&self.inbound).take();
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_preformatted(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        if text.len() > self.max_message_length {
            return Err(RemoteError::SendFailed(format!(
                "page of {} bytes exceeds {}",
                text.len(),
                self.max_message_length
            )));
        }
        self.record(Sent::Preformatted {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), RemoteError> {
        let index = self.documents_attempted.fetch_add(1, Ordering::SeqCst) as usize;
        if *lock(&self.fail_document_at) == Some(index) {
            return Err(RemoteError::SendFailed("injected failure".to_string()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        self.record(Sent::Document {
            chat_id,
            file_name: file_name(path),
            caption: caption.map(str::to_string),
            bytes,
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), RemoteError> {
        if !path.exists() {
            return Err(RemoteError::SendFailed(format!("{} missing", path.display())));
        }
        self.record(Sent::Photo {
            chat_id,
            file_name: file_name(path),
        });
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64, RemoteError> {
        // like the real transport, the destination is truncated before the fetch
        tokio::fs::File::create(dest)
            .await
            .map_err(|e| RemoteError::DownloadFailed(e.to_string()))?;
        let content = lock(&self.files)
            .get(file_id)
            .cloned()
            .ok_or_else(|| RemoteError::DownloadFailed(format!("unknown file {}", file_id)))?;
        tokio::fs::write(dest, &content)
            .await
            .map_err(|e| RemoteError::DownloadFailed(e.to_string()))?;
        Ok(content.len() as u64)
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        let remaining = self.health_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.health_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RemoteError::ConfigError("getMe failed".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inject_requires_start() {
        let adapter = MockAdapter::default();
        let msg = IncomingRemoteMessage::text(1, 1, "hi");
        assert!(adapter.inject(msg.clone()).await.is_err());

        let (tx, mut rx) = mpsc::channel(4);
        adapter.start(tx).await.unwrap();
        adapter.inject(msg).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().text, "hi");
    }

    #[tokio::test]
    async fn test_health_check_failures_count_down() {
        let adapter = MockAdapter::default();
        adapter.fail_health_checks(2);
        assert!(adapter.health_check().await.is_err());
        assert!(adapter.health_check().await.is_err());
        assert!(adapter.health_check().await.is_ok());
        assert_eq!(adapter.health_checks(), 3);
    }

    #[tokio::test]
    async fn test_download_registered_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = MockAdapter::default();
        adapter.register_file("f1", b"payload");
        let dest = dir.path().join("out.bin");
        assert_eq!(adapter.download_file("f1", &dest).await.unwrap(), 7);
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert!(adapter.download_file("nope", &dest).await.is_err());
    }
}
