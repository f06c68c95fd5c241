//! Transfer Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or delivering a transfer.
///
/// Any of these aborts the whole job; intermediates are removed regardless.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Zip error: {0}")]
    Archive(String),

    #[error("Split error: {0}")]
    Split(String),

    #[error("Delivery failed at part {part}: {message}")]
    Delivery { part: usize, message: String },

    #[error("Invalid transfer limits: {0}")]
    InvalidLimits(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransferResult<T> = Result<T, TransferError>;

impl From<zip::result::ZipError> for TransferError {
    fn from(err: zip::result::ZipError) -> Self {
        TransferError::Archive(err.to_string())
    }
}
