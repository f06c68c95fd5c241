//! Remote Assistant Chunked Transfer
//!
//! Delivers a file or a directory over a transport that caps the size of a
//! single file. Small regular files go out as-is; anything else is zipped,
//! split into fixed-size parts and sent part by part. Every intermediate lives
//! in a per-job directory that is removed when the job is dropped, whether the
//! delivery succeeded or not.
//!
//! ## Module Organization
//!
//! - `error` - `TransferError`
//! - `archive` - zip container creation
//! - `split` - fixed-size part splitting
//! - `codec` - `ChunkedTransfer`, `TransferPlan`, `TransferJob`, `FileSink`

pub mod archive;
pub mod codec;
pub mod error;
pub mod split;

pub use codec::{ChunkedTransfer, FileSink, TransferJob, TransferLimits, TransferPlan, TransferReport};
pub use error::{TransferError, TransferResult};
