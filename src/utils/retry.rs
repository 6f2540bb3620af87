// Retry logic with inference-backend loading hint support
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Upper bound for any server-suggested wait.
const MAX_HINT_SECONDS: f64 = 60.0;

/// Parse the `estimated_time` hint that Hugging Face style backends attach to
/// a 503 while the model is loading (e.g. `{"error":"...","estimated_time":20.0}`).
/// Returns the suggested wait, capped at 60 seconds.
pub fn parse_retry_delay(error_json: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_json).ok()?;

    let seconds = parsed
        .get("estimated_time")
        .or_else(|| parsed.get("error")?.get("estimated_time"))?
        .as_f64()?;

    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let capped_seconds = seconds.min(MAX_HINT_SECONDS);
    Some(Duration::from_millis((capped_seconds * 1000.0) as u64))
}

/// Create exponential backoff configuration for retries
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),     // Start at 500ms
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,                        // Add jitter
        multiplier: 2.0,                                  // Double each time
        max_interval: Duration::from_secs(30),            // Cap at 30s
        max_elapsed_time: Some(Duration::from_secs(120)), // Give up after 2 minutes
        ..Default::default()
    }
}

/// Determine if an HTTP status code is retryable
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Execute operation with retry logic
/// - Uses the backend's `estimated_time` hint if available
/// - Falls back to exponential backoff
/// - Gives up after `max_attempts` or on a non-retryable status
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let mut backoff = create_backoff();
    let mut attempt = 0;
    let max_attempts = max_attempts.max(1);

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err((status, error_body)) => {
                if !is_retryable(status) || attempt >= max_attempts {
                    return Err((status, error_body));
                }

                let delay = if let Some(hint) = parse_retry_delay(&error_body) {
                    debug!(
                        "{} failed with {} (attempt {}), backend suggests waiting {}ms",
                        operation_name,
                        status,
                        attempt,
                        hint.as_millis()
                    );
                    hint
                } else {
                    let backoff_delay = backoff.next_backoff().unwrap_or(Duration::from_secs(30));
                    debug!(
                        "{} failed with {} (attempt {}), retrying after {}ms",
                        operation_name,
                        status,
                        attempt,
                        backoff_delay.as_millis()
                    );
                    backoff_delay
                };

                tokio::time::sleep(delay).await;
            }
        }
    }
}
