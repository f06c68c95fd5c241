//! Remote Assistant Core
//!
//! Shared types for the remote-assistant workspace. No dependency on the
//! transport, the host, or the async runtime.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration for the transport's HTTP client
//! - `text` - Paging of long reports into transport-sized messages and the page size check

pub mod error;
pub mod proxy;
pub mod text;

pub use error::{CoreError, CoreResult};
pub use proxy::{ProxyConfig, ProxyProtocol};
pub use text::{check_page_limit, split_message, truncate, MAX_PAGE_BYTES};
