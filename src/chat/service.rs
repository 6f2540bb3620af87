// Chat orchestrator - cache lookup, measured generation, session accounting
// Author: kelexine (https://github.com/kelexine)

use super::models::{ChatReply, ChatRequest, ReplyOrigin, SessionStats};
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::emissions::{measure, EmissionsMeter, EmissionsTracker};
use crate::error::Result;
use crate::inference::{InferenceBackend, InferenceClient};
use crate::metrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves chat turns from the cache when possible and from the backend otherwise.
///
/// Owns the cache store and the session counters. Requests are handled one at
/// a time (`&mut self`); two identical requests issued concurrently through
/// separate services would both miss.
pub struct ChatService {
    store: CacheStore,
    backend: Arc<dyn InferenceBackend>,
    meter: Arc<dyn EmissionsMeter>,
    stats: SessionStats,
}

impl ChatService {
    pub fn new(
        store: CacheStore,
        backend: Arc<dyn InferenceBackend>,
        meter: Arc<dyn EmissionsMeter>,
    ) -> Self {
        metrics::update_cache_entries(store.len());
        Self {
            store,
            backend,
            meter,
            stats: SessionStats::default(),
        }
    }

    /// Wire up the production collaborators: the cache documents, the HTTP
    /// inference client and the duration-based emissions tracker.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = CacheStore::open(&config.cache)?;
        let backend = InferenceClient::new(&config.inference)?
            .sanitize_errors(config.logging.sanitize_tokens);
        let tracker = EmissionsTracker::new(&config.emissions)?;
        Ok(Self::new(store, Arc::new(backend), Arc::new(tracker)))
    }

    /// Answer one turn.
    ///
    /// A hit returns the stored text and counts the stored cost as avoided. A
    /// miss calls the backend inside an emissions measurement and stores the
    /// text with its measured cost before returning. If the backend fails the
    /// measurement is still stopped, nothing is cached and the counters are
    /// left untouched.
    pub async fn respond(&mut self, request: &ChatRequest) -> Result<ChatReply> {
        let fingerprint = request.fingerprint();
        let key = fingerprint.as_str();

        if let Some(text) = self.store.get(key) {
            let avoided = self.store.get_cost(key);
            info!(
                "Cache HIT {} - avoided {:.8} kg CO2eq",
                fingerprint.digest(),
                avoided.emissions_kg
            );
            let text = text.to_string();
            self.stats.record_hit(avoided);
            metrics::record_cache_hit(avoided);

            return Ok(ChatReply {
                text,
                fingerprint,
                origin: ReplyOrigin::Cached { avoided },
            });
        }

        info!("Cache MISS {} - calling inference backend", fingerprint.digest());
        metrics::record_cache_miss();

        let messages = request.messages();
        let options = request.options();
        debug!(
            "Generating with {} messages, max_tokens={}, temperature={}, top_p={}",
            messages.len(),
            options.max_tokens,
            options.temperature,
            options.top_p
        );

        let measured = match measure(
            self.meter.as_ref(),
            self.backend.generate(&messages, &options),
        )
        .await
        {
            Ok(measured) => measured,
            Err(e) => {
                warn!("Generation failed for {}: {}", fingerprint.digest(), e);
                metrics::record_chat_error();
                return Err(e);
            }
        };

        self.store.set(key, measured.value.clone(), measured.cost)?;
        self.stats.record_fresh(measured.cost);
        metrics::record_generation(measured.cost);
        metrics::update_cache_entries(self.store.len());

        info!(
            "Generated {} chars for {} - {:.8} kg CO2eq, {:.8} kWh",
            measured.value.len(),
            fingerprint.digest(),
            measured.cost.emissions_kg,
            measured.cost.energy_kwh
        );

        Ok(ChatReply {
            text: measured.value,
            fingerprint,
            origin: ReplyOrigin::Fresh { cost: measured.cost },
        })
    }

    /// Snapshot of the counters accumulated since this service was created.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn backend(&self) -> &dyn InferenceBackend {
        self.backend.as_ref()
    }
}
