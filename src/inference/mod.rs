// Inference backend module
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod streaming;

pub use client::InferenceClient;

use crate::error::Result;
use crate::models::{ChatMessage, GenerationOptions};
use async_trait::async_trait;

/// Anything that can turn a role-tagged conversation into generated text.
///
/// The HTTP [`InferenceClient`] is the production implementation; tests plug
/// in scripted backends.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String>;

    /// Short human-readable description for health checks and logs.
    fn describe(&self) -> String {
        "custom backend".to_string()
    }
}
