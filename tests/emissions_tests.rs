// Emissions aggregation tests - CSV logs on disk, summary and time series
// Author: kelexine (https://github.com/kelexine)

use chrono::NaiveDateTime;
use ecochat::config::EmissionsConfig;
use ecochat::emissions::{measure, EmissionsAnalyzer, EmissionsMeter, EmissionsTracker};
use std::fs;
use std::path::Path;

const HEADER: &str = "timestamp,run_id,project_name,duration,emissions,energy_consumed,outcome";

fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn write_log(dir: &Path, name: &str, rows: &[&str]) {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_empty_directory_has_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = EmissionsAnalyzer::new(dir.path()).unwrap();

    let summary = analyzer.summary();
    assert_eq!(summary.call_count, 0);
    assert_eq!(summary.total_emissions_kg, 0.0);
    assert_eq!(summary.last_updated, "No Data");
    assert!(analyzer.time_series().is_empty());
}

#[test]
fn test_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("nested").join("emissions");

    let analyzer = EmissionsAnalyzer::new(&logs).unwrap();
    assert!(logs.is_dir());
    assert!(analyzer.table().is_empty());
}

#[test]
fn test_summary_over_several_files() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "emissions.csv",
        &[
            "2024-05-01T10:00:00Z,a,ecochat,1.0,0.002,0.01,success",
            "2024-05-01T11:00:00Z,b,ecochat,1.0,0.004,0.02,success",
        ],
    );
    write_log(
        dir.path(),
        "older_run.csv",
        &["2024-04-30T09:00:00Z,c,ecochat,1.0,0.003,0.015,success"],
    );

    let summary = EmissionsAnalyzer::new(dir.path()).unwrap().summary();
    assert_eq!(summary.call_count, 3);
    assert!((summary.total_emissions_kg - 0.009).abs() < 1e-12);
    assert!((summary.total_energy_kwh - 0.045).abs() < 1e-12);
    assert!((summary.average_emissions_per_call_kg - 0.003).abs() < 1e-12);
    assert_eq!(summary.last_updated, "2024-05-01 11:00:00");
}

#[test]
fn test_time_series_sorted_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "a.csv",
        &["2024-05-02T08:00:00Z,a,ecochat,1.0,0.2,2.0,success"],
    );
    write_log(
        dir.path(),
        "b.csv",
        &[
            "2024-05-01T08:00:00Z,b,ecochat,1.0,0.1,1.0,success",
            "2024-05-03T08:00:00Z,c,ecochat,1.0,0.3,3.0,success",
        ],
    );

    let series = EmissionsAnalyzer::new(dir.path()).unwrap().time_series();
    let stamps: Vec<Option<NaiveDateTime>> = series.iter().map(|p| p.timestamp).collect();
    assert_eq!(
        stamps,
        vec![
            Some(ts("2024-05-01 08:00:00")),
            Some(ts("2024-05-02 08:00:00")),
            Some(ts("2024-05-03 08:00:00"))
        ]
    );
    assert_eq!(series[1].emissions_kg, 0.2);
    assert_eq!(series[1].energy_kwh, 2.0);
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "good.csv",
        &["2024-05-01T10:00:00Z,a,ecochat,1.0,0.002,0.01,success"],
    );
    fs::write(dir.path().join("bad.csv"), "run,value\n1,2\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a log").unwrap();

    let analyzer = EmissionsAnalyzer::new(dir.path()).unwrap();
    assert_eq!(analyzer.table().len(), 1);
    assert_eq!(analyzer.table().records[0].source_file, "good.csv");
}

#[test]
fn test_unreadable_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "emissions.csv",
        &[
            "2024-05-01T10:00:00Z,a,ecochat,1.0,0.002,0.01,success",
            "2024-05-01T10:05:00Z,b,ecochat,1.0,not-a-number,0.01,success",
            "2024-05-01T10:10:00Z,c,ecochat,1.0,0.004,0.02,success",
        ],
    );

    let summary = EmissionsAnalyzer::new(dir.path()).unwrap().summary();
    assert_eq!(summary.call_count, 2);
    assert!((summary.total_emissions_kg - 0.006).abs() < 1e-12);
}

#[test]
fn test_bad_timestamps_are_kept_in_every_view() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "emissions.csv",
        &[
            "sometime,a,ecochat,1.0,0.002,0.01,success",
            "2024-05-01T10:00:00Z,b,ecochat,1.0,0.004,0.02,success",
        ],
    );

    let analyzer = EmissionsAnalyzer::new(dir.path()).unwrap();
    assert_eq!(analyzer.summary().call_count, 2);
    assert_eq!(analyzer.summary().last_updated, "2024-05-01 10:00:00");

    // One point per record; the undated one sorts after the dated one
    let series = analyzer.time_series();
    assert_eq!(series.len(), analyzer.table().len());
    assert_eq!(series[0].timestamp, Some(ts("2024-05-01 10:00:00")));
    assert_eq!(series[0].emissions_kg, 0.004);
    assert_eq!(series[1].timestamp, None);
    assert_eq!(series[1].emissions_kg, 0.002);
}

#[test]
fn test_minimal_columns_are_enough() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("external.csv"),
        "energy_consumed,timestamp,emissions\n0.5,2024-01-01 00:00:00,0.25\n",
    )
    .unwrap();

    let summary = EmissionsAnalyzer::new(dir.path()).unwrap().summary();
    assert_eq!(summary.call_count, 1);
    assert_eq!(summary.total_emissions_kg, 0.25);
    assert_eq!(summary.total_energy_kwh, 0.5);
}

#[test]
fn test_refresh_sees_new_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut analyzer = EmissionsAnalyzer::new(dir.path()).unwrap();
    assert!(analyzer.table().is_empty());

    write_log(
        dir.path(),
        "emissions.csv",
        &["2024-05-01T10:00:00Z,a,ecochat,1.0,0.002,0.01,success"],
    );
    // Snapshot is only updated on refresh
    assert!(analyzer.table().is_empty());
    assert_eq!(analyzer.refresh().len(), 1);
    assert_eq!(analyzer.summary().call_count, 1);
}

#[tokio::test]
async fn test_tracker_rows_feed_the_analyzer() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EmissionsTracker::new(&EmissionsConfig {
        output_dir: dir.path().to_path_buf(),
        project_name: "ecochat-test".to_string(),
        power_watts: 250.0,
        carbon_intensity_kg_per_kwh: 0.475,
    })
    .unwrap();

    let first = measure(&tracker, async { Ok("one") }).await.unwrap();
    let second = measure(&tracker, async { Ok("two") }).await.unwrap();
    let m = tracker.start();
    tracker.stop(m, ecochat::emissions::RunOutcome::Failed).unwrap();

    let summary = EmissionsAnalyzer::new(dir.path()).unwrap().summary();
    assert_eq!(summary.call_count, 3);
    assert!(summary.total_emissions_kg >= first.cost.emissions_kg + second.cost.emissions_kg);
    assert_ne!(summary.last_updated, "Unknown");
    assert_ne!(summary.last_updated, "No Data");
}
