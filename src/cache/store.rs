// Persistent response cache with carbon-cost metadata
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::CarbonCost;
use crate::config::CacheConfig;
use crate::error::{EcoChatError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Write-through key-value store backed by two JSON documents.
///
/// One document maps fingerprints to generated text, the other maps the same
/// fingerprints to the cost of generating that text. Both are loaded fully at
/// open and rewritten fully on every [`CacheStore::set`], so a write costs
/// O(total cache size). Entries are never evicted.
///
/// There is no locking: a single owning process is assumed.
#[derive(Debug)]
pub struct CacheStore {
    response_path: PathBuf,
    cost_path: PathBuf,
    responses: BTreeMap<String, String>,
    costs: BTreeMap<String, CarbonCost>,
}

impl CacheStore {
    /// Open the store described by the cache configuration.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        Self::open_paths(&config.response_path, &config.cost_path)
    }

    /// Open a store from explicit document paths.
    ///
    /// Missing or blank documents start empty. A document that exists but
    /// does not parse is reported as [`EcoChatError::CacheCorrupt`] and
    /// nothing is discarded.
    pub fn open_paths(response_path: impl Into<PathBuf>, cost_path: impl Into<PathBuf>) -> Result<Self> {
        let response_path = response_path.into();
        let cost_path = cost_path.into();

        let responses: BTreeMap<String, String> = load_document(&response_path)?;
        let costs: BTreeMap<String, CarbonCost> = load_document(&cost_path)?;

        info!(
            "Loaded response cache: {} entries ({}), {} cost records ({})",
            responses.len(),
            response_path.display(),
            costs.len(),
            cost_path.display()
        );

        Ok(Self {
            response_path,
            cost_path,
            responses,
            costs,
        })
    }

    /// Cached text for a fingerprint, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.responses.get(key).map(String::as_str)
    }

    /// Cost recorded for a fingerprint, or zero when none was recorded.
    pub fn get_cost(&self, key: &str) -> CarbonCost {
        self.costs.get(key).copied().unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.responses.contains_key(key)
    }

    /// Insert or overwrite an entry and its cost, then persist both documents.
    ///
    /// If persisting fails the in-memory state is restored, so callers never
    /// observe an entry that is not on disk.
    pub fn set(&mut self, key: &str, text: impl Into<String>, cost: CarbonCost) -> Result<()> {
        let previous_text = self.responses.insert(key.to_string(), text.into());
        let previous_cost = self.costs.insert(key.to_string(), cost);

        if let Err(e) = self.persist() {
            restore(&mut self.responses, key, previous_text);
            restore(&mut self.costs, key, previous_cost);
            // The response document may already have been swapped in
            if let Err(undo) = write_document(&self.response_path, &self.responses) {
                warn!(
                    "Failed to restore {} after a failed cache write: {}",
                    self.response_path.display(),
                    undo
                );
            }
            return Err(e);
        }

        debug!(
            "Cached response ({} entries, {:.8} kg CO2eq attributed)",
            self.responses.len(),
            cost.emissions_kg
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn response_path(&self) -> &Path {
        &self.response_path
    }

    pub fn cost_path(&self) -> &Path {
        &self.cost_path
    }

    /// Stage both documents before replacing either, so a failed
    /// serialization or temp-file write leaves both files untouched.
    fn persist(&self) -> Result<()> {
        let responses_tmp = stage_document(&self.response_path, &self.responses)?;
        let costs_tmp = match stage_document(&self.cost_path, &self.costs) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&responses_tmp);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&responses_tmp, &self.response_path) {
            let _ = fs::remove_file(&responses_tmp);
            let _ = fs::remove_file(&costs_tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&costs_tmp, &self.cost_path) {
            let _ = fs::remove_file(&costs_tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn restore<V>(map: &mut BTreeMap<String, V>, key: &str, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
}

fn load_document<T>(path: &Path) -> Result<BTreeMap<String, T>>
where
    T: DeserializeOwned,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Cache document {} not found, starting empty", path.display());
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&raw).map_err(|source| EcoChatError::CacheCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with the serialized document via a sibling temp file and a rename.
fn write_document<T>(path: &Path, document: &BTreeMap<String, T>) -> Result<()>
where
    T: Serialize,
{
    let tmp_path = stage_document(path, document)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Serialize `document` into `<path>.tmp` and return the temp path.
fn stage_document<T>(path: &Path, document: &BTreeMap<String, T>) -> Result<PathBuf>
where
    T: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let json = serde_json::to_vec(document)?;
    fs::write(&tmp_path, json)?;
    Ok(tmp_path)
}
