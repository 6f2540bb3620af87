//! Structured logging and token redaction utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing a helper that keeps API
//! tokens (Hugging Face `hf_...` tokens, bearer credentials) out of logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{EcoChatError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    static ref HF_TOKEN: Regex = Regex::new(r"hf_[A-Za-z0-9]{8,}").unwrap();
    static ref BEARER: Regex = Regex::new(r"(?i)bearer\s+[A-Za-z0-9._\-]+").unwrap();
}

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| EcoChatError::Internal(format!("Failed to initialize logging: {}", e)))
}

/// Replaces API credentials in `input` with placeholders.
///
/// # Arguments
///
/// * `input` - The raw string that may contain a token, such as a backend
///   error body or a request dump.
///
/// # Returns
///
/// A new string where every detected credential has been replaced.
pub fn sanitize(input: &str) -> String {
    let redacted = HF_TOKEN.replace_all(input, "[REDACTED_HF_TOKEN]");
    BEARER
        .replace_all(&redacted, "Bearer [REDACTED]")
        .into_owned()
}
