//! Utility functions and helpers for ecochat.
//!
//! This module provides cross-cutting concerns like structured logging,
//! token sanitization, and retry logic with backoff.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with token redaction.
//! - `retry`: Retry mechanisms that respect backend loading hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
