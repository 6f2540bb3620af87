// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, Gauge, HistogramVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ecochat_requests_total", "Total number of API requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("ecochat_request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "endpoint"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CHAT / CACHE METRICS
    // ============================================================================

    /// Chat turns by outcome
    pub static ref CHAT_TURNS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ecochat_chat_turns_total", "Chat turns by outcome"),
        &["outcome"], // outcome: hit, miss, error
        REGISTRY
    ).unwrap();

    /// Current cache entries
    pub static ref CACHE_ENTRIES: Gauge = register_gauge_with_registry!(
        Opts::new("ecochat_cache_entries", "Current number of cached responses"),
        REGISTRY
    ).unwrap();

    // ============================================================================
    // INFERENCE METRICS
    // ============================================================================

    /// Inference backend calls
    pub static ref INFERENCE_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ecochat_inference_calls_total", "Total inference backend calls"),
        &["model", "status"], // status: success, failure
        REGISTRY
    ).unwrap();

    /// Inference call duration
    pub static ref INFERENCE_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("ecochat_inference_duration_seconds", "Inference backend call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["model"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CARBON METRICS
    // ============================================================================

    /// Emissions in kg CO2eq
    pub static ref EMISSIONS_KG: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ecochat_emissions_kg_total", "Estimated emissions in kg CO2eq"),
        &["kind"], // kind: incurred, avoided
        REGISTRY
    ).unwrap();

    /// Energy in kWh
    pub static ref ENERGY_KWH: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ecochat_energy_kwh_total", "Estimated energy in kWh"),
        &["kind"], // kind: incurred, avoided
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
