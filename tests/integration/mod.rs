//! Integration Tests Module
//!
//! End-to-end tests that run the gateway against the recording adapter and
//! mock host providers.

// Shared gateway harness
mod harness;

// Routing, prompts, confirmation, credential and paging
mod session_flow_test;

// Chunked download, upload and log delivery
mod transfer_test;
