// Chat completions HTTP client
// Author: kelexine (https://github.com/kelexine)

use super::streaming::{collect_text, parse_sse_stream};
use super::InferenceBackend;
use crate::config::InferenceConfig;
use crate::error::{EcoChatError, Result};
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GenerationOptions};
use crate::utils::logging::sanitize;
use crate::utils::retry::with_retry;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Handles authentication and retries, and either reads a single JSON body
/// or assembles a server-sent event stream into the full response text.
pub struct InferenceClient {
    http_client: Client,
    config: InferenceConfig,
    api_token: Option<String>,
    sanitize_errors: bool,
}

impl InferenceClient {
    /// Create a new client. The bearer token comes from the config or, failing
    /// that, from the `HF_TOKEN` environment variable.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| EcoChatError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let api_token = config
            .api_token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());

        if api_token.is_none() {
            info!("No inference API token configured, sending unauthenticated requests");
        }

        Ok(Self {
            http_client,
            config: config.clone(),
            api_token,
            sanitize_errors: true,
        })
    }

    /// Whether backend error bodies are scrubbed of tokens before they are
    /// logged and returned. On by default.
    pub fn sanitize_errors(mut self, enabled: bool) -> Self {
        self.sanitize_errors = enabled;
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.api_base_url.trim_end_matches('/'))
    }

    /// Send the request, retrying on 429/5xx, and return the successful response.
    async fn send(&self, request: &ChatCompletionRequest) -> Result<Response> {
        let url = self.completions_url();
        debug!(
            "Calling {} with {} messages (stream={})",
            url,
            request.messages.len(),
            request.stream
        );

        with_retry("Chat completion", self.config.max_retries, || async {
            let mut builder = self.http_client.post(&url).json(request);
            if request.stream {
                builder = builder.header("Accept", "text/event-stream");
            }
            if let Some(token) = &self.api_token {
                builder = builder.bearer_auth(token);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| (503, format!("HTTP error: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err((status.as_u16(), error_text));
            }
            Ok(response)
        })
        .await
        .map_err(|(status, body)| {
            let body = if self.sanitize_errors {
                sanitize(&body)
            } else {
                body
            };
            error!("Inference backend error: HTTP {} - {}", status, body);
            match status {
                429 => EcoChatError::TooManyRequests(format!("Inference quota exceeded: {}", body)),
                503 | 504 => EcoChatError::ServiceUnavailable(format!("Backend unavailable: {}", body)),
                _ => EcoChatError::Inference(format!("HTTP {}: {}", status, body)),
            }
        })
    }

    /// Request a whole completion in one JSON body.
    pub async fn complete(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let request = self.build_request(messages, options, false);
        let response = self.send(&request).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| EcoChatError::Inference(format!("Response parsing error: {}", e)))?;

        if let Some(usage) = body.usage {
            debug!(
                "Backend usage: {} prompt tokens, {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(body.into_text())
    }

    /// Request a streamed completion and assemble it into one string.
    pub async fn stream_complete(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = self.build_request(messages, options, true);
        let response = self.send(&request).await?;
        collect_text(parse_sse_stream(response.bytes_stream())).await
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
        stream: bool,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stream,
        }
    }
}

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let start = Instant::now();
        let result = if self.config.stream {
            self.stream_complete(messages, options).await
        } else {
            self.complete(messages, options).await
        };
        crate::metrics::record_inference_call(&self.config.model, result.is_ok(), start.elapsed().as_secs_f64());
        result
    }

    fn describe(&self) -> String {
        format!("{} @ {}", self.config.model, self.config.api_base_url)
    }
}
