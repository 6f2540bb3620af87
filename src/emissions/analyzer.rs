// Emissions log aggregation
// Author: kelexine (https://github.com/kelexine)

use super::models::{EmissionsRecord, EmissionsSummary, TimeSeriesPoint};
use crate::error::{EcoChatError, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "emissions", "energy_consumed"];

/// Every emissions record found in the log directory, in file-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTable {
    pub records: Vec<EmissionsRecord>,
}

impl CostTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> EmissionsSummary {
        if self.records.is_empty() {
            return EmissionsSummary::empty();
        }

        let total_emissions_kg: f64 = self.records.iter().map(|r| r.emissions_kg).sum();
        let total_energy_kwh: f64 = self.records.iter().map(|r| r.energy_kwh).sum();
        let call_count = self.records.len();
        let average_emissions_per_call_kg = if call_count > 0 {
            total_emissions_kg / call_count as f64
        } else {
            0.0
        };

        let last_updated = self
            .records
            .iter()
            .filter_map(|r| r.timestamp)
            .max()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        EmissionsSummary {
            total_emissions_kg,
            total_energy_kwh,
            call_count,
            average_emissions_per_call_kg,
            last_updated,
        }
    }

    /// One point per record, oldest first. Records whose timestamp did not
    /// parse keep their log order after every timestamped point.
    pub fn time_series(&self) -> Vec<TimeSeriesPoint> {
        let mut points: Vec<TimeSeriesPoint> = self
            .records
            .iter()
            .map(|r| TimeSeriesPoint {
                timestamp: r.timestamp,
                emissions_kg: r.emissions_kg,
                energy_kwh: r.energy_kwh,
            })
            .collect();
        // Stable sort: `None` last, ties keep file order
        points.sort_by_key(|p| (p.timestamp.is_none(), p.timestamp));
        points
    }
}

/// Reads the CSV emissions logs in a directory and reports on them.
///
/// Unreadable files and rows are skipped with a warning; an absent or empty
/// directory is simply "no data".
#[derive(Debug)]
pub struct EmissionsAnalyzer {
    dir: PathBuf,
    table: CostTable,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    emissions: f64,
    energy_consumed: f64,
}

impl EmissionsAnalyzer {
    /// Create the analyzer, making sure the log directory exists, and load it.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let table = load_dir(&dir);
        Ok(Self { dir, table })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read every record currently on disk.
    pub fn load(&self) -> CostTable {
        load_dir(&self.dir)
    }

    /// Re-read the directory, replacing the cached table.
    pub fn refresh(&mut self) -> &CostTable {
        self.table = self.load();
        &self.table
    }

    pub fn table(&self) -> &CostTable {
        &self.table
    }

    pub fn summary(&self) -> EmissionsSummary {
        self.table.summary()
    }

    pub fn time_series(&self) -> Vec<TimeSeriesPoint> {
        self.table.time_series()
    }
}

fn load_dir(dir: &Path) -> CostTable {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return CostTable::default(),
        Err(e) => {
            warn!("Error reading emissions directory {}: {}", dir.display(), e);
            return CostTable::default();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();

    let mut records = Vec::new();
    for file in &files {
        match load_file(file) {
            Ok(mut file_records) => {
                debug!("Read {} emissions records from {}", file_records.len(), file.display());
                records.append(&mut file_records);
            }
            Err(e) => warn!("Error reading {}: {}", file.display(), e),
        }
    }

    CostTable { records }
}

fn load_file(path: &Path) -> Result<Vec<EmissionsRecord>> {
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(EcoChatError::EmissionsLog(format!("missing column '{}'", missing)));
    }

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
        match row {
            Ok(raw) => records.push(EmissionsRecord {
                timestamp: parse_timestamp(&raw.timestamp),
                emissions_kg: raw.emissions,
                energy_kwh: raw.energy_consumed,
                source_file: source_file.clone(),
            }),
            // Header is line 1
            Err(e) => warn!("Skipping unreadable row {} in {}: {}", line + 2, source_file, e),
        }
    }
    Ok(records)
}

/// Lenient timestamp parsing; anything unrecognised becomes `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
