// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

use crate::cache::CarbonCost;

pub use registry::{
    gather_metrics,
    CACHE_ENTRIES,
    CHAT_TURNS,
    EMISSIONS_KG,
    ENERGY_KWH,
    INFERENCE_CALLS,
    INFERENCE_DURATION,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
};

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Helper to record inference backend calls
pub fn record_inference_call(model: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failure" };
    INFERENCE_CALLS.with_label_values(&[model, status]).inc();
    INFERENCE_DURATION
        .with_label_values(&[model])
        .observe(duration_secs);
}

/// Helper to record a cache hit and the cost it avoided
pub fn record_cache_hit(avoided: CarbonCost) {
    CHAT_TURNS.with_label_values(&["hit"]).inc();
    record_cost("avoided", avoided);
}

pub fn record_cache_miss() {
    CHAT_TURNS.with_label_values(&["miss"]).inc();
}

pub fn record_chat_error() {
    CHAT_TURNS.with_label_values(&["error"]).inc();
}

/// Helper to record the cost of a fresh generation
pub fn record_generation(cost: CarbonCost) {
    record_cost("incurred", cost);
}

pub fn update_cache_entries(count: usize) {
    CACHE_ENTRIES.set(count as f64);
}

fn record_cost(kind: &str, cost: CarbonCost) {
    // Counters reject negative increments
    if cost.emissions_kg > 0.0 {
        EMISSIONS_KG.with_label_values(&[kind]).inc_by(cost.emissions_kg);
    }
    if cost.energy_kwh > 0.0 {
        ENERGY_KWH.with_label_values(&[kind]).inc_by(cost.energy_kwh);
    }
}
