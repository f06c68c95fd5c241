//! Storage Layer
//!
//! JSON config persistence. Session state is never persisted.

pub mod config;

pub use config::*;
