//! Remote Assistant
//!
//! Single-operator remote control agent. One authorized Telegram chat drives
//! the host: shell commands, process control, file transfer, desktop actions
//! and audio playback.
//!
//! - [`services::remote`]: transport, session state machine and dispatch
//! - [`services::host`]: host capability providers
//! - [`storage`]: JSON config file
//! - [`models`]: configuration data structures

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::AppConfig;
pub use utils::error::{AppError, AppResult};
