// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    chat_handler, emissions_summary_handler, emissions_timeseries_handler, health_handler,
    metrics_handler, session_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::emissions::EmissionsAnalyzer;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// One turn at a time: the cache store assumes a single writer.
    pub chat: Arc<Mutex<ChatService>>,
    pub analyzer: Arc<Mutex<EmissionsAnalyzer>>,
}

impl AppState {
    pub fn new(config: AppConfig, chat: ChatService, analyzer: EmissionsAnalyzer) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(Mutex::new(chat)),
            analyzer: Arc::new(Mutex::new(analyzer)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/chat", post(chat_handler))
        .route("/v1/session", get(session_handler))
        .route("/v1/emissions/summary", get(emissions_summary_handler))
        .route("/v1/emissions/timeseries", get(emissions_timeseries_handler))
        .route_layer(middleware::from_fn(track_metrics))
        // Chat payloads carry the whole visible history
        .layer(tower_http::limit::RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
