// Request fingerprinting - canonical cache keys
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical identifier of one combination of prompt and generation parameters.
///
/// The string form is a JSON object whose keys are sorted, so two parameter
/// sets with equal fields always produce the same fingerprint no matter in
/// which order they were assembled. Conversation history is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from named fields in any order.
    ///
    /// A field name given twice keeps the last value.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let canonical: BTreeMap<&str, Value> = fields.into_iter().collect();
        // Serializing a map of strings to JSON values cannot fail
        Self(serde_json::to_string(&canonical).unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Short SHA-256 prefix for log lines, so prompts stay out of the logs.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(&hash[..8])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fingerprint the parameters that define a cached response.
pub fn fingerprint(
    message: &str,
    system_message: &str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
) -> Fingerprint {
    Fingerprint::from_fields([
        ("message", Value::from(message)),
        ("system_message", Value::from(system_message)),
        ("max_tokens", Value::from(max_tokens)),
        ("temperature", Value::from(temperature)),
        ("top_p", Value::from(top_p)),
    ])
}
