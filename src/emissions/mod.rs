//! Carbon accounting: measuring generation calls and reporting on the log.
//!
//! - `tracker`: the measurement capability. [`EmissionsTracker`] estimates the
//!   cost of a call from its duration and appends a row to `emissions.csv`.
//! - `analyzer`: reads every CSV log in a directory into a [`CostTable`] and
//!   derives the summary and time series shown by the dashboard.
//! - `models`: record and report types.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod analyzer;
pub mod models;
pub mod tracker;

pub use analyzer::{CostTable, EmissionsAnalyzer};
pub use models::{EmissionsRecord, EmissionsSummary, TimeSeriesPoint};
pub use tracker::{measure, EmissionsMeter, EmissionsTracker, Measured, Measurement, RunOutcome};
