// Remote Assistant - agent entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use remote_assistant::models::settings::AppConfig;
use remote_assistant::services::host::HostCapabilities;
use remote_assistant::services::logging::init_logging;
use remote_assistant::services::remote::adapters::telegram::TelegramAdapter;
use remote_assistant::services::remote::gateway::RemoteGatewayService;
use remote_assistant::services::remote::session::Session;
use remote_assistant::services::remote::session_bridge::{BridgeSettings, SessionBridge};
use remote_assistant::storage::config::ConfigService;
use remote_assistant::utils::paths::{config_path, start_dir};
use remote_assistant_transfer::{ChunkedTransfer, TransferLimits};

#[derive(Parser, Debug)]
#[command(name = "remote-assistant", version, about)]
struct Cli {
    /// Config file (default: ~/.remote-assistant/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => config_path().context("could not locate the home directory")?,
    };
    let mut service = ConfigService::open(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    service
        .apply_env_overrides()
        .context("invalid environment override")?;
    let config = service.into_config();
    config
        .validate_for_start()
        .map_err(anyhow::Error::msg)
        .context("configuration is incomplete")?;

    if cli.check {
        println!("{}: ok", path.display());
        return Ok(());
    }

    let logging = init_logging(&config.logging).context("failed to initialize logging")?;
    tracing::info!(
        "[Main] remote-assistant v{} starting, config {}",
        env!("CARGO_PKG_VERSION"),
        path.display()
    );

    let gateway = build_gateway(&config, logging.log_path().to_path_buf())?;
    gateway.start().await.context("failed to start the gateway")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("[Main] shutdown requested");

    gateway.stop().await.context("failed to stop the gateway")?;
    Ok(())
}

fn build_gateway(config: &AppConfig, log_path: PathBuf) -> Result<RemoteGatewayService> {
    let adapter = Arc::new(
        TelegramAdapter::new(config.telegram.clone()).context("failed to create Telegram adapter")?,
    );

    let scratch_dir = config
        .transfer
        .work_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let transfer = ChunkedTransfer::new(
        TransferLimits {
            direct_limit: config.transfer.direct_limit_bytes,
            chunk_size: config.transfer.chunk_size_bytes,
        },
        &scratch_dir,
    )
    .context("failed to prepare the transfer work directory")?;

    let bridge = SessionBridge::new(
        adapter.clone(),
        HostCapabilities::system(),
        transfer,
        BridgeSettings {
            shell_timeout: Duration::from_secs(config.session.shell_timeout_secs),
            credential_ttl: Duration::from_secs(config.session.credential_ttl_secs),
            top_processes: config.session.top_processes,
            log_path,
            scratch_dir,
        },
    );

    let session = Session::new(
        config.telegram.peer_chat_id,
        start_dir(),
        config.session.language,
    );

    Ok(RemoteGatewayService::new(adapter, Arc::new(bridge), session)
        .with_reconnect(config.reconnect.clone())
        .with_announce(config.session.announce_on_start))
}
