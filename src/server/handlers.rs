// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::chat::{ChatRequest, SessionStats};
use crate::emissions::{EmissionsSummary, TimeSeriesPoint};
use crate::error::{EcoChatError, Result};
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    let (entries, backend) = {
        let chat = state.chat.lock().await;
        (chat.store().len(), chat.backend().describe())
    };
    checks.insert(
        "response_cache".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} cached responses", entries),
        },
    );

    checks.insert(
        "inference_backend".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: backend,
        },
    );

    let emissions_dir = state.config.emissions.output_dir.clone();
    let emissions_check = if emissions_dir.is_dir() {
        HealthCheck {
            status: "ok".to_string(),
            message: format!("Emissions log: {}", emissions_dir.display()),
        }
    } else {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: format!("Emissions directory {} is missing", emissions_dir.display()),
        }
    };
    checks.insert("emissions_log".to_string(), emissions_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}

/// Body of `POST /v1/chat`. Omitted parameters take the configured defaults.
#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
    pub system_message: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub text: String,
    pub cached: bool,
    pub emissions_kg: f64,
    pub energy_kwh: f64,
    pub annotation: String,
}

/// Handler for `/v1/chat`: one conversational turn.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: String, // Get raw JSON as string first
) -> Result<Json<ChatApiResponse>> {
    // Manually deserialize to get better error messages
    let api_req: ChatApiRequest = serde_json::from_str(&body)
        .map_err(|e| EcoChatError::InvalidRequest(format!("JSON deserialization error: {}", e)))?;

    let defaults = &state.config.chat;
    let request = ChatRequest {
        message: api_req.message,
        history: api_req.history,
        system_message: api_req
            .system_message
            .unwrap_or_else(|| defaults.system_message.clone()),
        max_tokens: api_req.max_tokens.unwrap_or(defaults.max_tokens),
        temperature: api_req.temperature.unwrap_or(defaults.temperature),
        top_p: api_req.top_p.unwrap_or(defaults.top_p),
    };
    request.validate()?;

    info!(
        "Received chat request: history={}, max_tokens={}",
        request.history.len(),
        request.max_tokens
    );

    let reply = state.chat.lock().await.respond(&request).await?;
    let cost = reply.cost();

    debug!("Replying with {} chars (cached={})", reply.text.len(), reply.is_cached());

    Ok(Json(ChatApiResponse {
        cached: reply.is_cached(),
        emissions_kg: cost.emissions_kg,
        energy_kwh: cost.energy_kwh,
        annotation: reply.annotation(),
        text: reply.text,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub stats: SessionStats,
    pub cache_entries: usize,
}

/// Counters of the running process.
pub async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let chat = state.chat.lock().await;
    Json(SessionResponse {
        stats: chat.stats(),
        cache_entries: chat.store().len(),
    })
}

/// Totals over the durable emissions log, re-read on every call.
pub async fn emissions_summary_handler(State(state): State<AppState>) -> Json<EmissionsSummary> {
    let mut analyzer = state.analyzer.lock().await;
    Json(analyzer.refresh().summary())
}

pub async fn emissions_timeseries_handler(
    State(state): State<AppState>,
) -> Json<Vec<TimeSeriesPoint>> {
    let mut analyzer = state.analyzer.lock().await;
    Json(analyzer.refresh().time_series())
}
