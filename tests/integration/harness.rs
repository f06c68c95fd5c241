//! Shared gateway harness: a started gateway wired to the recording adapter
//! and mock host providers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use remote_assistant::services::host::mock::MockHost;
use remote_assistant::services::remote::adapters::mock::{MockAdapter, Sent};
use remote_assistant::services::remote::gateway::RemoteGatewayService;
use remote_assistant::services::remote::i18n::Language;
use remote_assistant::services::remote::session::Session;
use remote_assistant::services::remote::session_bridge::{BridgeSettings, SessionBridge};
use remote_assistant::services::remote::types::{Attachment, IncomingRemoteMessage};
use remote_assistant_transfer::{ChunkedTransfer, TransferLimits};

pub const PEER: i64 = 4242;
pub const STRANGER: i64 = 1313;

pub struct Options {
    pub max_message_length: usize,
    pub limits: TransferLimits,
    pub credential_ttl: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_message_length: 4000,
            limits: TransferLimits {
                direct_limit: 1024,
                chunk_size: 512,
            },
            credential_ttl: Duration::from_secs(300),
        }
    }
}

pub struct Harness {
    pub adapter: Arc<MockAdapter>,
    pub host: MockHost,
    pub gateway: RemoteGatewayService,
    pub dir: TempDir,
    next_id: i64,
}

impl Harness {
    pub async fn start(host: MockHost) -> Self {
        Self::start_with(host, Options::default()).await
    }

    pub async fn start_with(host: MockHost, options: Options) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("home")).unwrap();
        std::fs::create_dir_all(dir.path().join("scratch")).unwrap();

        let adapter = Arc::new(MockAdapter::new(options.max_message_length));
        let transfer = ChunkedTransfer::new(options.limits, dir.path().join("jobs")).unwrap();
        let bridge = SessionBridge::new(
            adapter.clone(),
            host.capabilities(),
            transfer,
            BridgeSettings {
                shell_timeout: Duration::from_secs(10),
                credential_ttl: options.credential_ttl,
                top_processes: 3,
                log_path: dir.path().join("agent.log"),
                scratch_dir: dir.path().join("scratch"),
            },
        );
        let session = Session::new(PEER, dir.path().join("home"), Language::En);
        let gateway = RemoteGatewayService::new(adapter.clone(), Arc::new(bridge), session);
        gateway.start().await.unwrap();

        Self {
            adapter,
            host,
            gateway,
            dir,
            next_id: 1,
        }
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.dir.path().join("jobs")
    }

    pub async fn cwd(&self) -> PathBuf {
        self.gateway.session().lock().await.cwd().to_path_buf()
    }

    fn next_message(&mut self, chat_id: i64, text: &str) -> IncomingRemoteMessage {
        let msg = IncomingRemoteMessage::text(chat_id, self.next_id, text);
        self.next_id += 1;
        msg
    }

    /// Deliver one message and wait until the gateway has handled it.
    pub async fn deliver(&mut self, msg: IncomingRemoteMessage) -> Vec<Sent> {
        let before = self.gateway.get_status().await.total_commands_processed;
        self.adapter.inject(msg).await.unwrap();
        for _ in 0..400 {
            if self.gateway.get_status().await.total_commands_processed > before {
                return self.adapter.take_sent();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("message was not processed");
    }

    pub async fn send(&mut self, text: &str) -> Vec<Sent> {
        let msg = self.next_message(PEER, text);
        self.deliver(msg).await
    }

    pub async fn send_from(&mut self, chat_id: i64, text: &str) -> Vec<Sent> {
        let msg = self.next_message(chat_id, text);
        self.deliver(msg).await
    }

    pub async fn send_attachment(&mut self, attachment: Attachment) -> Vec<Sent> {
        let msg = self.next_message(PEER, "").with_attachment(attachment);
        self.deliver(msg).await
    }

    /// Text replies to one message, joined by newlines.
    pub async fn reply(&mut self, text: &str) -> String {
        join_texts(&self.send(text).await)
    }

    pub async fn stop(self) {
        self.gateway.stop().await.unwrap();
    }
}

pub fn join_texts(sent: &[Sent]) -> String {
    sent.iter()
        .filter_map(|s| s.text())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Files left anywhere under `dir`.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(files_under(&path));
        } else {
            found.push(path);
        }
    }
    found
}
