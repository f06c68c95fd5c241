//! Remote Control
//!
//! Lets one operator drive this host from a chat. Telegram is the only
//! adapter.
//!
//! ## Architecture
//!
//! ```text
//! Telegram → RemoteAdapter → mpsc → RemoteGatewayService (one worker)
//!                                            ↓
//!                                   Session.route()  (auth, prompts, confirm)
//!                                            ↓
//!                                   SessionBridge    (host providers, transfer)
//!                                            ↓
//!                                   ResponseMapper → RemoteAdapter.send_*()
//! ```

pub mod adapters;
pub mod command_router;
pub mod credential;
pub mod gateway;
pub mod i18n;
pub mod response_mapper;
pub mod session;
pub mod session_bridge;
pub mod types;

pub use types::*;
