// Shared test doubles for the integration tests
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use ecochat::cache::{CacheStore, CarbonCost};
use ecochat::chat::ChatService;
use ecochat::emissions::{EmissionsMeter, Measurement, RunOutcome};
use ecochat::error::{EcoChatError, Result};
use ecochat::inference::InferenceBackend;
use ecochat::models::{ChatMessage, GenerationOptions};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Backend that replays queued results and records what it was asked.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    pub fn replying(texts: &[&str]) -> Arc<Self> {
        let backend = Self::default();
        {
            let mut replies = backend.replies.lock().unwrap();
            for text in texts {
                replies.push_back(Ok(text.to_string()));
            }
        }
        Arc::new(backend)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let backend = Self::default();
        backend
            .replies
            .lock()
            .unwrap()
            .push_back(Err(EcoChatError::Inference(message.to_string())));
        Arc::new(backend)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn generate(&self, messages: &[ChatMessage], _options: &GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EcoChatError::Inference("no scripted reply left".to_string())))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Meter that charges a fixed cost per measurement and counts start/stop pairs.
pub struct FixedMeter {
    cost: CarbonCost,
    started: AtomicUsize,
    outcomes: Mutex<Vec<RunOutcome>>,
}

impl FixedMeter {
    pub fn new(emissions_kg: f64, energy_kwh: f64) -> Arc<Self> {
        Arc::new(Self {
            cost: CarbonCost::new(emissions_kg, energy_kwh),
            started: AtomicUsize::new(0),
            outcomes: Mutex::new(Vec::new()),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl EmissionsMeter for FixedMeter {
    fn start(&self) -> Measurement {
        self.started.fetch_add(1, Ordering::SeqCst);
        Measurement::begin()
    }

    fn stop(&self, _measurement: Measurement, outcome: RunOutcome) -> Result<CarbonCost> {
        self.outcomes.lock().unwrap().push(outcome);
        Ok(self.cost)
    }
}

pub fn open_store(dir: &Path) -> CacheStore {
    CacheStore::open_paths(dir.join("response_cache.json"), dir.join("cost_cache.json")).unwrap()
}

pub fn service(dir: &Path, backend: Arc<ScriptedBackend>, meter: Arc<FixedMeter>) -> ChatService {
    ChatService::new(open_store(dir), backend, meter)
}
