//! Configuration data structures for ecochat.
//!
//! This module defines the schema for the application settings: the HTTP
//! front-end, the inference backend, the response cache documents, the
//! emissions tracker and the default generation parameters.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream inference backend settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Locations of the persistent response cache documents.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Emissions tracking and log settings.
    #[serde(default)]
    pub emissions: EmissionsConfig,

    /// Default generation parameters used when a caller omits them.
    #[serde(default)]
    pub chat: ChatDefaults,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `7860`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for the chat-completions backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of an OpenAI-compatible API (the `/chat/completions` path is appended).
    /// Default: Hugging Face inference router.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Model identifier sent with every request.
    /// Default: `HuggingFaceH4/zephyr-7b-beta`
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token. Falls back to the `HF_TOKEN` environment variable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    /// Default: `120`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of attempts for retryable backend failures.
    /// Default: `3`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Request a server-sent event stream and assemble it, instead of a single JSON body.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub stream: bool,
}

/// Locations of the two cache documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Fingerprint -> generated text.
    /// Default: `response_cache.json`
    #[serde(default = "default_response_path")]
    pub response_path: PathBuf,

    /// Fingerprint -> carbon cost of producing that text.
    /// Default: `cost_cache.json`
    #[serde(default = "default_cost_path")]
    pub cost_path: PathBuf,
}

/// Settings for the emissions tracker and the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionsConfig {
    /// Directory holding emissions CSV logs.
    /// Default: `./emissions`
    #[serde(default = "default_emissions_dir")]
    pub output_dir: PathBuf,

    /// Value written to the `project_name` column.
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Average power draw attributed to one generation call, in watts.
    /// Default: `250.0`
    #[serde(default = "default_power_watts")]
    pub power_watts: f64,

    /// Grid carbon intensity in kg CO2eq per kWh.
    /// Default: `0.475` (world average)
    #[serde(default = "default_carbon_intensity")]
    pub carbon_intensity_kg_per_kwh: f64,
}

/// Defaults mirrored from the chat UI controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDefaults {
    #[serde(default = "default_system_message")]
    pub system_message: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API tokens in backend error bodies before they are
    /// logged or returned to callers.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            api_token: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            stream: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_path: default_response_path(),
            cost_path: default_cost_path(),
        }
    }
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_emissions_dir(),
            project_name: default_project_name(),
            power_watts: default_power_watts(),
            carbon_intensity_kg_per_kwh: default_carbon_intensity(),
        }
    }
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            system_message: default_system_message(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://router.huggingface.co/v1".to_string()
}

fn default_model() -> String {
    "HuggingFaceH4/zephyr-7b-beta".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_response_path() -> PathBuf {
    PathBuf::from("response_cache.json")
}

fn default_cost_path() -> PathBuf {
    PathBuf::from("cost_cache.json")
}

fn default_emissions_dir() -> PathBuf {
    PathBuf::from("emissions")
}

fn default_project_name() -> String {
    "ecochat".to_string()
}

fn default_power_watts() -> f64 {
    250.0
}

fn default_carbon_intensity() -> f64 {
    0.475
}

fn default_system_message() -> String {
    "You are a friendly Chatbot.".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.95
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
