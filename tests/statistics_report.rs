//! Integration tests for the statistics aggregator and its reports

mod common;

use anyhow::Result;
use common::init_tracing;
use serde_json::{json, Map, Value};
use sim_tally::tally_stats::{ProcessedStatistics, SimulationCounts};
use sim_tally::{Encoder, StatisticsActor, StatisticsConfig, StatisticsOutput};
use std::fs;

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_overlay_overwrites_never_sums() -> Result<()> {
    let mut stats = StatisticsOutput::new("stats", StatisticsConfig::default());
    stats.store_data(object(json!({"events": 100, "steps": 10})))?;
    stats.store_data(object(json!({"events": 40})))?;

    let data = stats.get_data(None);
    assert_eq!(data.events, 40);
    assert_eq!(data.steps, 10);
    Ok(())
}

#[test]
fn test_zero_duration_rates() -> Result<()> {
    let mut stats = StatisticsOutput::new("stats", StatisticsConfig::default());
    stats.store_data(object(json!({"events": 10, "tracks": 20, "steps": 30})))?;
    assert_eq!((stats.pps(), stats.tps(), stats.sps()), (0, 0, 0));

    let report = stats.get_processed_output();
    assert_eq!(report.pps.value, 0);
    assert_eq!(report.duration.value, 0.0);
    Ok(())
}

#[test]
fn test_json_report_round_trips_byte_for_byte() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = StatisticsConfig::default().with_track_types(true);
    let mut actor = StatisticsActor::new("stats", config).with_output_dir(dir.path());
    actor.output_mut().set_output_filename("reports/stats.json");
    actor.start_simulation(8);

    let counts = object(json!({
        "runs": 3,
        "events": 123_457,
        "tracks": 9_876_543,
        "steps": 45_678_901,
        "duration": 12_345_678_901.0,
        "init": 987_654_321.0,
        "start_time": "Mon Oct 19 09:00:00 2026",
        "stop_time": "Mon Oct 19 09:00:12 2026",
        "track_types": {"gamma": 5_000_000, "e-": 4_876_543},
    }));
    let path = actor
        .end_simulation(counts, &[(0.0, 0.7e9), (0.7e9, 1.3e9)], 8)?
        .expect("write requested by explicit filename");
    assert_eq!(path, dir.path().join("reports").join("stats.json"));

    let text = fs::read_to_string(&path)?;
    let parsed = ProcessedStatistics::from_json(&text)?;
    assert_eq!(parsed.to_json()?, text);
    assert_eq!(parsed, actor.output().get_processed_output());
    assert_eq!(parsed.threads.value, 8);
    assert_eq!(parsed.pps.value, 10_000);
    assert_eq!(parsed.sim_stop_time.unit.as_deref(), Some("s"));
    Ok(())
}

#[test]
fn test_legacy_report_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = StatisticsConfig::default()
        .with_encoder(Encoder::Legacy)
        .with_output_filename("stats.txt");
    let mut stats = StatisticsOutput::new("stats", config).with_output_dir(dir.path());
    stats.store_data(object(json!({"runs": 1, "events": 50, "duration": 5.0e8})))?;

    let path = stats.write_data_if_requested()?.expect("filename enables writing");
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "runs                1 ");
    assert_eq!(lines[1], "events              50 ");
    assert_eq!(lines[5], "duration            500.0 ms");
    assert_eq!(lines[6], "pps                 100 ");
    assert!(lines.iter().all(|l| l.len() >= 20));
    assert!(!text.ends_with('\n'));
    Ok(())
}

#[test]
fn test_unknown_fields_survive_in_raw_data() -> Result<()> {
    let mut counts = SimulationCounts::default();
    counts.overlay(object(json!({"sim_start": 1.0, "biasing": "none"})))?;
    let raw = serde_json::to_value(&counts)?;
    assert_eq!(raw["biasing"], json!("none"));
    assert_eq!(raw["nb_threads"], json!(1));
    Ok(())
}
