//! Settings Models
//!
//! Agent configuration stored in config.json.

use std::path::PathBuf;

use remote_assistant_core::check_page_limit;
use serde::{Deserialize, Serialize};

use crate::services::remote::i18n::Language;
use crate::services::remote::types::{ReconnectConfig, TelegramAdapterConfig};

/// Environment variable overriding `telegram.bot_token`
pub const ENV_BOT_TOKEN: &str = "REMOTE_ASSISTANT_BOT_TOKEN";
/// Environment variable overriding `telegram.peer_chat_id`
pub const ENV_PEER_ID: &str = "REMOTE_ASSISTANT_PEER_ID";

/// Largest document the Bot API accepts from a bot.
pub const TRANSPORT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramAdapterConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Session behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Bound on a single shell command
    pub shell_timeout_secs: u64,
    /// Lifetime of the sudo credential
    pub credential_ttl_secs: u64,
    /// Row count of `/top`
    pub top_processes: usize,
    /// Send the system-info report to the peer after connecting
    pub announce_on_start: bool,
    pub language: Language,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            shell_timeout_secs: 30,
            credential_ttl_secs: 300,
            top_processes: 10,
            announce_on_start: true,
            language: Language::En,
        }
    }
}

/// Chunked transfer limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Regular files up to this size are sent directly
    pub direct_limit_bytes: u64,
    /// Size of each part of a chunked transfer
    pub chunk_size_bytes: u64,
    /// Where per-job archive directories are created (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            direct_limit_bytes: 20 * MIB,
            chunk_size_bytes: 20 * MIB,
            work_dir: None,
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file path (<tmp>/remote-assistant.log if unset)
    pub file: Option<PathBuf>,
    /// Rotation threshold
    pub max_bytes: u64,
    /// Default filter when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            max_bytes: 3 * MIB,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Apply `REMOTE_ASSISTANT_*` overrides from the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = Some(token.trim().to_string());
        }
        if let Some(peer) = lookup(ENV_PEER_ID) {
            self.telegram.peer_chat_id = peer
                .trim()
                .parse()
                .map_err(|_| format!("{} must be an integer chat id, got '{}'", ENV_PEER_ID, peer))?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        check_page_limit(self.telegram.max_message_length)
            .map_err(|e| format!("telegram.max_message_length: {}", e))?;

        if let Some(proxy) = &self.telegram.proxy {
            proxy
                .validate()
                .map_err(|e| format!("telegram.proxy: {}", e))?;
        }

        if self.session.shell_timeout_secs == 0 {
            return Err("session.shell_timeout_secs must be at least 1".to_string());
        }

        if self.session.credential_ttl_secs == 0 {
            return Err("session.credential_ttl_secs must be at least 1".to_string());
        }

        if self.transfer.chunk_size_bytes == 0 {
            return Err("transfer.chunk_size_bytes must be non-zero".to_string());
        }

        if self.transfer.chunk_size_bytes > TRANSPORT_MAX_FILE_BYTES {
            return Err(format!(
                "transfer.chunk_size_bytes cannot exceed {} bytes",
                TRANSPORT_MAX_FILE_BYTES
            ));
        }

        if self.transfer.direct_limit_bytes > TRANSPORT_MAX_FILE_BYTES {
            return Err(format!(
                "transfer.direct_limit_bytes cannot exceed {} bytes",
                TRANSPORT_MAX_FILE_BYTES
            ));
        }

        if self.logging.max_bytes == 0 {
            return Err("logging.max_bytes must be non-zero".to_string());
        }

        if self.reconnect.base_delay_ms == 0 || self.reconnect.max_delay_ms < self.reconnect.base_delay_ms {
            return Err("reconnect delays must satisfy 0 < base_delay_ms <= max_delay_ms".to_string());
        }

        Ok(())
    }

    /// Check the settings needed to actually connect.
    pub fn validate_for_start(&self) -> Result<(), String> {
        self.validate()?;
        if self.telegram.bot_token.as_deref().map_or(true, |t| t.is_empty()) {
            return Err(format!(
                "telegram bot token is not set (config file or {})",
                ENV_BOT_TOKEN
            ));
        }
        if self.telegram.peer_chat_id == 0 {
            return Err(format!(
                "telegram.peer_chat_id is not set (config file or {})",
                ENV_PEER_ID
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.session.shell_timeout_secs, 30);
        assert_eq!(config.session.credential_ttl_secs, 300);
        assert_eq!(config.transfer.chunk_size_bytes, 20 * MIB);
        assert_eq!(config.logging.max_bytes, 3 * MIB);
        assert_eq!(config.telegram.max_message_length, 4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"telegram": {"peer_chat_id": 42}, "session": {"language": "ru"}}"#)
                .unwrap();
        assert_eq!(config.telegram.peer_chat_id, 42);
        assert_eq!(config.session.language, Language::Ru);
        assert_eq!(config.session.top_processes, 10);
        assert_eq!(config.transfer.direct_limit_bytes, 20 * MIB);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(lookup(&[(ENV_BOT_TOKEN, " 123:abc "), (ENV_PEER_ID, "-1001")]))
            .unwrap();
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.telegram.peer_chat_id, -1001);
    }

    #[test]
    fn test_env_override_rejects_bad_peer() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(lookup(&[(ENV_PEER_ID, "alice")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_chunks() {
        let mut config = AppConfig::default();
        config.transfer.chunk_size_bytes = TRANSPORT_MAX_FILE_BYTES + 1;
        assert!(config.validate().is_err());
        config.transfer.chunk_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_message_length_bounds() {
        let mut config = AppConfig::default();
        config.telegram.max_message_length = 5000;
        assert!(config.validate().is_err());
        config.telegram.max_message_length = 0;
        assert_eq!(
            config.validate(),
            Err("telegram.max_message_length: Message length must be between 1 and 4096 bytes, got 0"
                .to_string())
        );
        config.telegram.max_message_length = 4096;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_for_start_requires_token_and_peer() {
        let mut config = AppConfig::default();
        assert!(config.validate_for_start().is_err());
        config.telegram.bot_token = Some("123:abc".to_string());
        assert!(config.validate_for_start().is_err());
        config.telegram.peer_chat_id = 7;
        assert!(config.validate_for_start().is_ok());
    }
}
