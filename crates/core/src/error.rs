//! Core Error Types
//!
//! Failures raised by the shared types of this crate. The application maps
//! them into its own `AppError`.

use thiserror::Error;

/// Rejected proxy or paging settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Proxy settings that cannot produce a usable URL
    #[error("Invalid proxy setting: {0}")]
    InvalidProxy(String),

    /// Page size the transport cannot carry
    #[error("Message length must be between 1 and {max} bytes, got {got}")]
    PageLimit { got: usize, max: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
