//! Proxy Configuration Types
//!
//! Outbound proxy settings for the chat transport's HTTP client.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Proxy configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Only read from the config file; never written back out.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Build the proxy URL string with embedded credentials (if any).
    pub fn url_with_auth(&self) -> String {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                format!("{}://{}:{}@{}:{}", self.protocol.scheme(), u, p, self.host, self.port)
            }
            (Some(u), None) => {
                format!("{}://{}@{}:{}", self.protocol.scheme(), u, self.host, self.port)
            }
            _ => self.url(),
        }
    }

    /// Reject settings that would build a broken proxy URL.
    pub fn validate(&self) -> CoreResult<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(CoreError::InvalidProxy("host must not be empty".to_string()));
        }
        if host.contains("://") || host.contains(char::is_whitespace) {
            return Err(CoreError::InvalidProxy(format!(
                "host must be a bare host name, got '{}'",
                self.host
            )));
        }
        if self.port == 0 {
            return Err(CoreError::InvalidProxy("port must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
