// Emissions measurement around a unit of work
// Author: kelexine (https://github.com/kelexine)

use crate::cache::CarbonCost;
use crate::config::EmissionsConfig;
use crate::error::{EcoChatError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Name of the log file the tracker appends to inside its output directory.
pub const EMISSIONS_FILE: &str = "emissions.csv";

const KWH_PER_WATT_SECOND: f64 = 1.0 / 3_600_000.0;

/// A started, not yet stopped, measurement.
#[derive(Debug)]
pub struct Measurement {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Measurement {
    pub fn begin() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// How the measured work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Observes resource use of a unit of work and turns it into a cost estimate.
///
/// `stop` is called exactly once for every `start`, whether the work succeeded
/// or failed.
pub trait EmissionsMeter: Send + Sync {
    fn start(&self) -> Measurement;

    fn stop(&self, measurement: Measurement, outcome: RunOutcome) -> Result<CarbonCost>;
}

/// Result of measured work together with what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured<T> {
    pub value: T,
    pub cost: CarbonCost,
}

/// Run `work` inside a measurement.
///
/// The measurement is always stopped before returning. A failure to stop the
/// meter is only logged: failed work keeps its own error, and successful work
/// is returned with a zero cost rather than discarded.
pub async fn measure<M, F, T>(meter: &M, work: F) -> Result<Measured<T>>
where
    M: EmissionsMeter + ?Sized,
    F: Future<Output = Result<T>>,
{
    let measurement = meter.start();
    match work.await {
        Ok(value) => {
            let cost = match meter.stop(measurement, RunOutcome::Success) {
                Ok(cost) => cost,
                Err(stop_err) => {
                    warn!("Failed to finalize emissions measurement, recording zero cost: {}", stop_err);
                    CarbonCost::ZERO
                }
            };
            Ok(Measured { value, cost })
        }
        Err(e) => {
            if let Err(stop_err) = meter.stop(measurement, RunOutcome::Failed) {
                warn!("Failed to finalize emissions measurement: {}", stop_err);
            }
            Err(e)
        }
    }
}

/// Duration-based estimator that appends one CSV row per measured call.
///
/// Energy is `power_watts x duration`, emissions are energy times the grid
/// carbon intensity. Rows carry `timestamp`, `emissions` and
/// `energy_consumed`, the columns the aggregator reads.
#[derive(Debug, Clone)]
pub struct EmissionsTracker {
    output_dir: PathBuf,
    project_name: String,
    power_watts: f64,
    carbon_intensity: f64,
}

#[derive(Debug, Serialize)]
struct EmissionsRow<'a> {
    timestamp: String,
    run_id: String,
    project_name: &'a str,
    duration: f64,
    emissions: f64,
    energy_consumed: f64,
    outcome: RunOutcome,
}

impl EmissionsTracker {
    pub fn new(config: &EmissionsConfig) -> Result<Self> {
        if !(config.power_watts >= 0.0 && config.carbon_intensity_kg_per_kwh >= 0.0) {
            return Err(EcoChatError::Config(
                "emissions.power_watts and emissions.carbon_intensity_kg_per_kwh must be non-negative"
                    .to_string(),
            ));
        }

        Ok(Self {
            output_dir: config.output_dir.clone(),
            project_name: config.project_name.clone(),
            power_watts: config.power_watts,
            carbon_intensity: config.carbon_intensity_kg_per_kwh,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(EMISSIONS_FILE)
    }

    /// Cost of running for `seconds` at the configured power draw.
    pub fn estimate(&self, seconds: f64) -> CarbonCost {
        let energy_kwh = self.power_watts * seconds.max(0.0) * KWH_PER_WATT_SECOND;
        CarbonCost::new(energy_kwh * self.carbon_intensity, energy_kwh)
    }

    fn append_row(&self, path: &Path, row: &EmissionsRow<'_>) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

impl EmissionsMeter for EmissionsTracker {
    fn start(&self) -> Measurement {
        let measurement = Measurement::begin();
        debug!("Started emissions measurement {}", measurement.run_id);
        measurement
    }

    fn stop(&self, measurement: Measurement, outcome: RunOutcome) -> Result<CarbonCost> {
        let duration = measurement.elapsed_secs();
        let cost = self.estimate(duration);

        let run_id = measurement.run_id.to_string();
        let row = EmissionsRow {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            run_id,
            project_name: &self.project_name,
            duration,
            emissions: cost.emissions_kg,
            energy_consumed: cost.energy_kwh,
            outcome,
        };

        // The estimate stands even if the log row is lost
        if let Err(e) = self.append_row(&self.log_path(), &row) {
            warn!(
                "Failed to append emissions log {}: {}",
                self.log_path().display(),
                e
            );
        }

        debug!(
            "Stopped emissions measurement {} after {:.3}s: {:.8} kg CO2eq, {:.8} kWh ({:?})",
            measurement.run_id, duration, cost.emissions_kg, cost.energy_kwh, outcome
        );
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(dir: &Path) -> EmissionsTracker {
        EmissionsTracker::new(&EmissionsConfig {
            output_dir: dir.to_path_buf(),
            project_name: "test".to_string(),
            power_watts: 3600.0,
            carbon_intensity_kg_per_kwh: 0.5,
        })
        .unwrap()
    }

    #[test]
    fn test_estimate() {
        let dir = tempfile::tempdir().unwrap();
        // 3600 W for 10 s = 0.01 kWh
        let cost = tracker(dir.path()).estimate(10.0);
        assert!((cost.energy_kwh - 0.01).abs() < 1e-12);
        assert!((cost.emissions_kg - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_negative_settings_rejected() {
        let config = EmissionsConfig {
            power_watts: -1.0,
            ..EmissionsConfig::default()
        };
        assert!(EmissionsTracker::new(&config).is_err());
    }

    #[test]
    fn test_stop_appends_rows_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());

        let m = tracker.start();
        tracker.stop(m, RunOutcome::Success).unwrap();
        let m = tracker.start();
        tracker.stop(m, RunOutcome::Failed).unwrap();

        let log = fs::read_to_string(tracker.log_path()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,run_id,project_name,duration,emissions,energy_consumed,outcome"
        );
        assert!(lines[1].ends_with(",success"));
        assert!(lines[2].ends_with(",failed"));
    }

    #[test]
    fn test_unwritable_log_still_returns_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());
        // A directory where the log file should be
        fs::create_dir_all(tracker.log_path()).unwrap();

        let m = tracker.start();
        let cost = tracker.stop(m, RunOutcome::Success).unwrap();
        assert!(cost.energy_kwh >= 0.0);
        assert!(tracker.log_path().is_dir());
    }

    struct BrokenMeter;

    impl EmissionsMeter for BrokenMeter {
        fn start(&self) -> Measurement {
            Measurement::begin()
        }

        fn stop(&self, _measurement: Measurement, _outcome: RunOutcome) -> Result<CarbonCost> {
            Err(EcoChatError::Measurement("sensor unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_measure_keeps_value_when_stop_fails() {
        let measured = measure(&BrokenMeter, async { Ok("generated") }).await.unwrap();
        assert_eq!(measured.value, "generated");
        assert!(measured.cost.is_zero());
    }

    #[tokio::test]
    async fn test_measure_stops_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(dir.path());

        let result: Result<Measured<()>> =
            measure(&tracker, async { Err(EcoChatError::Inference("boom".into())) }).await;
        assert!(matches!(result, Err(EcoChatError::Inference(_))));

        let log = fs::read_to_string(tracker.log_path()).unwrap();
        assert_eq!(log.lines().count(), 2);
    }
}
