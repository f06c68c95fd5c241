//! Remote Gateway Service
//!
//! Owns the adapter lifecycle and the single session worker. Messages from
//! the adapter are handled strictly one at a time, in arrival order: each is
//! routed by the [`Session`] state machine and then carried out by the
//! [`SessionBridge`] before the next one is taken off the channel.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::adapters::RemoteAdapter;
use super::session::Session;
use super::session_bridge::SessionBridge;
use super::types::{GatewayStatus, IncomingRemoteMessage, ReconnectConfig, RemoteError};

const CHANNEL_CAPACITY: usize = 100;

/// Remote Gateway Service managing adapter lifecycle and message processing.
pub struct RemoteGatewayService {
    adapter: Arc<dyn RemoteAdapter>,
    bridge: Arc<SessionBridge>,
    session: Arc<Mutex<Session>>,
    reconnect: ReconnectConfig,
    announce_on_start: bool,
    status: Arc<RwLock<GatewayStatus>>,
    cancel_token: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteGatewayService {
    pub fn new(adapter: Arc<dyn RemoteAdapter>, bridge: Arc<SessionBridge>, session: Session) -> Self {
        let status = GatewayStatus {
            adapter_type: adapter.adapter_type(),
            ..Default::default()
        };
        Self {
            adapter,
            bridge,
            session: Arc::new(Mutex::new(session)),
            reconnect: ReconnectConfig::default(),
            announce_on_start: false,
            status: Arc::new(RwLock::new(status)),
            cancel_token: CancellationToken::new(),
            worker: Mutex::new(None),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Send the startup greeting and `/info` report once connected.
    pub fn with_announce(mut self, announce: bool) -> Self {
        self.announce_on_start = announce;
        self
    }

    pub async fn get_status(&self) -> GatewayStatus {
        self.status.read().await.clone()
    }

    /// Shared handle to the session state.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        self.session.clone()
    }

    /// Connect the adapter and start the session worker.
    ///
    /// Retries the connectivity check with exponential backoff until it
    /// passes or the gateway is stopped. A stopped gateway cannot be started
    /// again.
    pub async fn start(&self) -> Result<(), RemoteError> {
        if self.status.read().await.running {
            return Err(RemoteError::ConfigError("Gateway already running".to_string()));
        }
        if self.cancel_token.is_cancelled() {
            return Err(RemoteError::NotEnabled);
        }

        self.connect().await?;

        let (tx, rx) = mpsc::channel::<IncomingRemoteMessage>(CHANNEL_CAPACITY);
        self.adapter.start(tx).await?;

        {
            let mut status = self.status.write().await;
            status.running = true;
            status.connected_since = Some(chrono::Utc::now().to_rfc3339());
            status.error = None;
        }
        tracing::info!("[RemoteGateway] {} adapter started", self.adapter.adapter_type());

        if self.announce_on_start {
            let session = self.session.lock().await;
            self.bridge.announce(&session).await;
        }

        let handle = tokio::spawn(Self::run_worker(
            rx,
            self.bridge.clone(),
            self.session.clone(),
            self.status.clone(),
            self.cancel_token.clone(),
        ));
        *self.worker.lock().await = Some(handle);

        Ok(())
    }

    async fn connect(&self) -> Result<(), RemoteError> {
        let mut attempt: u32 = 0;
        loop {
            match self.adapter.health_check().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    let delay = self.reconnect.delay_for_attempt(attempt);
                    tracing::warn!(
                        "[RemoteGateway] connect attempt {} failed: {}; retrying in {} ms",
                        attempt + 1,
                        e,
                        delay
                    );
                    self.status.write().await.error = Some(e.to_string());

                    tokio::select! {
                        _ = tokio::time::sleep(std::time::Duration::from_millis(delay)) => {}
                        _ = self.cancel_token.cancelled() => return Err(RemoteError::NotEnabled),
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn run_worker(
        mut rx: mpsc::Receiver<IncomingRemoteMessage>,
        bridge: Arc<SessionBridge>,
        session: Arc<Mutex<Session>>,
        status: Arc<RwLock<GatewayStatus>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        // shutdown abandons the message in flight
                        tokio::select! {
                            _ = Self::handle_message(&msg, &bridge, &session, &status) => {}
                            _ = cancel.cancelled() => {
                                tracing::warn!(
                                    "[RemoteGateway] shutdown interrupted message {}",
                                    msg.message_id
                                );
                                break;
                            }
                        }
                    }
                    None => {
                        tracing::info!("[RemoteGateway] adapter channel closed");
                        break;
                    }
                },
                _ = cancel.cancelled() => break,
            }
        }
    }

    async fn handle_message(
        msg: &IncomingRemoteMessage,
        bridge: &SessionBridge,
        session: &Mutex<Session>,
        status: &RwLock<GatewayStatus>,
    ) {
        let mut session = session.lock().await;
        let route = session.route(msg);

        let span = tracing::info_span!(
            "remote_message",
            request_id = %uuid::Uuid::new_v4(),
            chat_id = msg.chat_id,
            message_id = msg.message_id,
            route = route.label(),
        );
        bridge.execute(&mut session, msg, route).instrument(span).await;

        let mut s = status.write().await;
        s.total_commands_processed += 1;
        s.last_command_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Stop the gateway: halt the adapter, end the worker, release audio
    /// and forget the sudo password.
    pub async fn stop(&self) -> Result<(), RemoteError> {
        self.cancel_token.cancel();
        let stopped = self.adapter.stop().await;

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!("[RemoteGateway] worker ended abnormally: {}", e);
            }
        }

        {
            let mut session = self.session.lock().await;
            if let Err(e) = session.stop_playback() {
                tracing::warn!("[RemoteGateway] stopping playback failed: {}", e);
            }
            session.credential().clear();
        }

        let mut status = self.status.write().await;
        status.running = false;
        status.connected_since = None;
        tracing::info!("[RemoteGateway] stopped");
        stopped
    }
}
