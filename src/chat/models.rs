//! Request, reply and session counter types for the chat orchestrator.

// Author: kelexine (https://github.com/kelexine)

use crate::cache::{fingerprint, CarbonCost, Fingerprint};
use crate::config::ChatDefaults;
use crate::error::{EcoChatError, Result};
use crate::models::{ChatMessage, GenerationOptions};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One conversational turn as supplied by a front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior `(user, assistant)` turns, oldest first. Not part of the cache key.
    #[serde(default)]
    pub history: Vec<(String, String)>,
    pub system_message: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl ChatRequest {
    /// A request with no history and the configured default parameters.
    pub fn new(message: impl Into<String>, defaults: &ChatDefaults) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            system_message: defaults.system_message.clone(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            top_p: defaults.top_p,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(
            &self.message,
            &self.system_message,
            self.max_tokens,
            self.temperature,
            self.top_p,
        )
    }

    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    /// System message, then prior turns (empty sides skipped), then the new message.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + self.history.len() * 2);
        messages.push(ChatMessage::system(self.system_message.clone()));
        for (user, assistant) in &self.history {
            if !user.is_empty() {
                messages.push(ChatMessage::user(user.clone()));
            }
            if !assistant.is_empty() {
                messages.push(ChatMessage::assistant(assistant.clone()));
            }
        }
        messages.push(ChatMessage::user(self.message.clone()));
        messages
    }

    /// Range checks matching the chat UI controls. The orchestrator itself
    /// accepts any values; front-ends call this before submitting.
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(EcoChatError::InvalidRequest("message must not be empty".to_string()));
        }
        if !(1..=2048).contains(&self.max_tokens) {
            return Err(EcoChatError::InvalidRequest(format!(
                "max_tokens must be between 1 and 2048, got {}",
                self.max_tokens
            )));
        }
        if !(0.1..=4.0).contains(&self.temperature) {
            return Err(EcoChatError::InvalidRequest(format!(
                "temperature must be between 0.1 and 4.0, got {}",
                self.temperature
            )));
        }
        if !(0.1..=1.0).contains(&self.top_p) {
            return Err(EcoChatError::InvalidRequest(format!(
                "top_p must be between 0.1 and 1.0, got {}",
                self.top_p
            )));
        }
        Ok(())
    }
}

/// Where a reply came from and what it cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyOrigin {
    /// Generated by the backend on this call.
    Fresh { cost: CarbonCost },
    /// Served from the cache; `avoided` is the cost recorded when it was generated.
    Cached { avoided: CarbonCost },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub fingerprint: Fingerprint,
    pub origin: ReplyOrigin,
}

impl ChatReply {
    pub fn is_cached(&self) -> bool {
        matches!(self.origin, ReplyOrigin::Cached { .. })
    }

    /// Incurred cost for a fresh reply, avoided cost for a cached one.
    pub fn cost(&self) -> CarbonCost {
        match self.origin {
            ReplyOrigin::Fresh { cost } => cost,
            ReplyOrigin::Cached { avoided } => avoided,
        }
    }

    /// Human-readable line front-ends show under the reply.
    pub fn annotation(&self) -> String {
        match self.origin {
            ReplyOrigin::Cached { avoided } => format!(
                "Served from cache, avoided {:.8} kg CO2eq ({:.8} kWh)",
                avoided.emissions_kg, avoided.energy_kwh
            ),
            ReplyOrigin::Fresh { cost } => format!(
                "Freshly generated, cost {:.8} kg CO2eq ({:.8} kWh)",
                cost.emissions_kg, cost.energy_kwh
            ),
        }
    }
}

/// Counters for the lifetime of one orchestrator. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Emissions actually incurred by fresh generations.
    pub total_emissions_kg: f64,
    pub total_energy_kwh: f64,
    /// Emissions avoided by cache hits.
    pub emissions_saved_kg: f64,
    pub energy_saved_kwh: f64,
    /// Fresh generations.
    pub calls: u64,
    /// Cache hits.
    pub cached_calls: u64,
}

impl SessionStats {
    pub(crate) fn record_fresh(&mut self, cost: CarbonCost) {
        self.calls += 1;
        self.total_emissions_kg += cost.emissions_kg;
        self.total_energy_kwh += cost.energy_kwh;
    }

    pub(crate) fn record_hit(&mut self, avoided: CarbonCost) {
        self.cached_calls += 1;
        self.emissions_saved_kg += avoided.emissions_kg;
        self.energy_saved_kwh += avoided.energy_kwh;
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Session: {} generated, {} from cache", self.calls, self.cached_calls);
        let _ = writeln!(
            out,
            "Incurred: {:.8} kg CO2eq, {:.8} kWh",
            self.total_emissions_kg, self.total_energy_kwh
        );
        let _ = write!(
            out,
            "Avoided:  {:.8} kg CO2eq, {:.8} kWh",
            self.emissions_saved_kg, self.energy_saved_kwh
        );
        out
    }
}
