// Response cache tests - public store and fingerprint APIs
// Author: kelexine (https://github.com/kelexine)

use ecochat::cache::{fingerprint, CacheStore, CarbonCost, Fingerprint};
use ecochat::config::CacheConfig;
use ecochat::error::EcoChatError;
use proptest::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn config_in(dir: &Path) -> CacheConfig {
    CacheConfig {
        response_path: dir.join("response_cache.json"),
        cost_path: dir.join("cost_cache.json"),
    }
}

#[test]
fn test_roundtrip_through_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let key = fingerprint("What is climate change?", "You are a friendly Chatbot.", 512, 0.7, 0.95);

    {
        let mut store = CacheStore::open(&config).unwrap();
        store
            .set(key.as_str(), "A long-term shift in temperatures.", CarbonCost::new(0.002, 0.01))
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    let reopened = CacheStore::open(&config).unwrap();
    assert!(reopened.contains(key.as_str()));
    assert_eq!(reopened.get(key.as_str()), Some("A long-term shift in temperatures."));
    assert_eq!(reopened.get_cost(key.as_str()), CarbonCost::new(0.002, 0.01));
}

#[test]
fn test_documents_are_plain_json_objects() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let key = fingerprint("hi", "sys", 512, 0.7, 0.95);

    let mut store = CacheStore::open(&config).unwrap();
    store.set(key.as_str(), "hello", CarbonCost::new(0.5, 1.5)).unwrap();

    let responses: Value =
        serde_json::from_str(&fs::read_to_string(&config.response_path).unwrap()).unwrap();
    assert_eq!(responses[key.as_str()], "hello");

    let costs: Value = serde_json::from_str(&fs::read_to_string(&config.cost_path).unwrap()).unwrap();
    assert_eq!(costs[key.as_str()]["emissions_kg"], 0.5);
    assert_eq!(costs[key.as_str()]["energy_kwh"], 1.5);

    // No temp file is left behind after a successful write
    assert!(!dir.path().join("response_cache.json.tmp").exists());
}

#[test]
fn test_overwrite_replaces_text_and_cost() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CacheStore::open(&config_in(dir.path())).unwrap();

    store.set("k", "first", CarbonCost::new(1.0, 1.0)).unwrap();
    store.set("k", "second", CarbonCost::new(2.0, 3.0)).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("k"), Some("second"));
    assert_eq!(store.get_cost("k"), CarbonCost::new(2.0, 3.0));
}

#[test]
fn test_text_without_cost_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::write(&config.response_path, r#"{"legacy":"old answer"}"#).unwrap();

    let store = CacheStore::open(&config).unwrap();
    assert_eq!(store.get("legacy"), Some("old answer"));
    assert!(store.get_cost("legacy").is_zero());
}

#[test]
fn test_empty_text_is_still_a_hit() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CacheStore::open(&config_in(dir.path())).unwrap();
    store.set("k", "", CarbonCost::ZERO).unwrap();
    assert!(store.contains("k"));
    assert_eq!(store.get("k"), Some(""));
}

#[test]
fn test_corrupt_document_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::write(&config.cost_path, "{ not json").unwrap();

    let err = CacheStore::open(&config).unwrap_err();
    match err {
        EcoChatError::CacheCorrupt { path, .. } => assert_eq!(path, config.cost_path),
        other => panic!("expected CacheCorrupt, got {other:?}"),
    }
    // The corrupt document is left as it was
    assert_eq!(fs::read_to_string(&config.cost_path).unwrap(), "{ not json");
}

#[test]
fn test_failed_write_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut store = CacheStore::open(&config).unwrap();
    store.set("kept", "ok", CarbonCost::new(1.0, 1.0)).unwrap();

    // A directory in place of the cost document makes the rename fail
    fs::remove_file(&config.cost_path).unwrap();
    fs::create_dir_all(&config.cost_path).unwrap();

    let err = store.set("new", "lost", CarbonCost::new(2.0, 2.0));
    assert!(err.is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("new"), None);
    assert_eq!(store.get("kept"), Some("ok"));
    assert_eq!(store.get_cost("kept"), CarbonCost::new(1.0, 1.0));
    drop(store);

    // Nothing from the failed write survives on disk either
    fs::remove_dir_all(&config.cost_path).unwrap();
    let reopened = CacheStore::open(&config).unwrap();
    assert_eq!(reopened.get("new"), None);
    assert_eq!(reopened.get("kept"), Some("ok"));
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_each_max_tokens_is_its_own_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CacheStore::open(&config_in(dir.path())).unwrap();

    for max_tokens in [128, 256, 512] {
        let key = fingerprint("same prompt", "sys", max_tokens, 0.7, 0.95);
        store
            .set(key.as_str(), format!("answer in {max_tokens} tokens"), CarbonCost::ZERO)
            .unwrap();
    }

    assert_eq!(store.len(), 3);
    let key = fingerprint("same prompt", "sys", 256, 0.7, 0.95);
    assert_eq!(store.get(key.as_str()), Some("answer in 256 tokens"));
}

fn fields(
    message: &str,
    system_message: &str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
) -> Vec<(&'static str, Value)> {
    vec![
        ("message", Value::from(message)),
        ("system_message", Value::from(system_message)),
        ("max_tokens", Value::from(max_tokens)),
        ("temperature", Value::from(temperature)),
        ("top_p", Value::from(top_p)),
    ]
}

proptest! {
    #[test]
    fn prop_fingerprint_ignores_field_order(
        message in ".*",
        system_message in ".*",
        max_tokens in 1u32..=2048,
        temperature in 0.1f64..=4.0,
        top_p in 0.1f64..=1.0,
        rotation in 0usize..5,
    ) {
        let mut shuffled = fields(&message, &system_message, max_tokens, temperature, top_p);
        shuffled.rotate_left(rotation);
        shuffled.reverse();

        prop_assert_eq!(
            Fingerprint::from_fields(shuffled),
            fingerprint(&message, &system_message, max_tokens, temperature, top_p)
        );
    }

    #[test]
    fn prop_changing_one_field_changes_fingerprint(
        message in "[a-z ]{1,40}",
        max_tokens in 1u32..2048,
        temperature in 0.1f64..=4.0,
    ) {
        let base = fingerprint(&message, "sys", max_tokens, temperature, 0.95);

        prop_assert_ne!(&base, &fingerprint(&format!("{message}?"), "sys", max_tokens, temperature, 0.95));
        prop_assert_ne!(&base, &fingerprint(&message, "other", max_tokens, temperature, 0.95));
        prop_assert_ne!(&base, &fingerprint(&message, "sys", max_tokens + 1, temperature, 0.95));
        prop_assert_ne!(&base, &fingerprint(&message, "sys", max_tokens, temperature + 0.5, 0.95));
        prop_assert_ne!(&base, &fingerprint(&message, "sys", max_tokens, temperature, 0.5));
    }
}
