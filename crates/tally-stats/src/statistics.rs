//! Simulation statistics aggregation
//!
//! [`SimulationCounts`] is an open set of named fields. Storing new data
//! overlays the incoming fields onto the current ones (last write wins); the
//! engine is expected to hand over already-merged totals. [`StatisticsOutput`]
//! derives the per-second rates and encodes the processed record as JSON or as
//! fixed-width text.

use crate::config::{Encoder, StatisticsConfig};
use crate::error::{Error, Result};
use crate::units::{best_time_unit, SECOND};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Selector naming the merged data
pub const MERGED: &str = "merged";

/// Column at which legacy values start
const LEGACY_COLUMN: usize = 20;

/// Indentation of track-type entries in the legacy text
const TRACK_TYPE_INDENT: usize = 24;

/// Named counters and timings of a simulation
///
/// Times are in internal units (nanoseconds). Keys without a dedicated field
/// are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationCounts {
    pub runs: u64,
    pub events: u64,
    pub tracks: u64,
    pub steps: u64,
    pub duration: f64,
    pub init: f64,
    pub start_time: String,
    pub stop_time: String,
    pub sim_start_time: f64,
    pub sim_stop_time: f64,
    pub track_types: BTreeMap<String, u64>,
    pub nb_threads: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SimulationCounts {
    fn default() -> Self {
        Self {
            runs: 0,
            events: 0,
            tracks: 0,
            steps: 0,
            duration: 0.0,
            init: 0.0,
            start_time: String::new(),
            stop_time: String::new(),
            sim_start_time: 0.0,
            sim_stop_time: 0.0,
            track_types: BTreeMap::new(),
            nb_threads: 1,
            extra: Map::new(),
        }
    }
}

impl SimulationCounts {
    /// Overlay `fields` onto the current values.
    ///
    /// Present keys overwrite, absent keys are kept. A field of the wrong
    /// type fails the whole overlay and leaves `self` unchanged.
    pub fn overlay(&mut self, fields: Map<String, Value>) -> Result<()> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidField(format!(
                    "statistics serialized to a non-object value: {other}"
                )))
            }
        };
        current.extend(fields);
        *self = serde_json::from_value(Value::Object(current))
            .map_err(|e| Error::InvalidField(e.to_string()))?;
        Ok(())
    }

    fn rate(&self, count: u64) -> u64 {
        if self.duration == 0.0 {
            return 0;
        }
        (count as f64 / (self.duration / SECOND)) as u64
    }

    /// Primaries (events) per second
    pub fn pps(&self) -> u64 {
        self.rate(self.events)
    }

    /// Tracks per second
    pub fn tps(&self) -> u64 {
        self.rate(self.tracks)
    }

    /// Steps per second
    pub fn sps(&self) -> u64 {
        self.rate(self.steps)
    }
}

/// A reported value with its unit label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity<T> {
    pub value: T,
    pub unit: Option<String>,
}

impl<T> Quantity<T> {
    pub fn unitless(value: T) -> Self {
        Self { value, unit: None }
    }
}

impl Quantity<f64> {
    /// Time value expressed in its best unit
    pub fn time(value: f64) -> Self {
        let (value, unit) = best_time_unit(value);
        Self {
            value,
            unit: Some(unit.to_string()),
        }
    }
}

/// Processed statistics record, in report order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedStatistics {
    pub runs: Quantity<u64>,
    pub events: Quantity<u64>,
    pub tracks: Quantity<u64>,
    pub steps: Quantity<u64>,
    pub init: Quantity<f64>,
    pub duration: Quantity<f64>,
    pub pps: Quantity<u64>,
    pub tps: Quantity<u64>,
    pub sps: Quantity<u64>,
    pub start_time: Quantity<String>,
    pub stop_time: Quantity<String>,
    pub sim_start_time: Quantity<f64>,
    pub sim_stop_time: Quantity<f64>,
    pub threads: Quantity<u32>,
    pub arch: Quantity<String>,
    pub version: Quantity<String>,
    pub track_types: Quantity<BTreeMap<String, u64>>,
}

impl ProcessedStatistics {
    pub fn from_counts(counts: &SimulationCounts) -> Self {
        Self {
            runs: Quantity::unitless(counts.runs),
            events: Quantity::unitless(counts.events),
            tracks: Quantity::unitless(counts.tracks),
            steps: Quantity::unitless(counts.steps),
            init: Quantity::time(counts.init),
            duration: Quantity::time(counts.duration),
            pps: Quantity::unitless(counts.pps()),
            tps: Quantity::unitless(counts.tps()),
            sps: Quantity::unitless(counts.sps()),
            start_time: Quantity::unitless(counts.start_time.clone()),
            stop_time: Quantity::unitless(counts.stop_time.clone()),
            sim_start_time: Quantity::time(counts.sim_start_time),
            sim_stop_time: Quantity::time(counts.sim_stop_time),
            threads: Quantity::unitless(counts.nb_threads),
            arch: Quantity::unitless(system_name().to_string()),
            version: Quantity::unitless(crate::VERSION.to_string()),
            track_types: Quantity::unitless(counts.track_types.clone()),
        }
    }

    /// Pretty JSON with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| Error::InvalidField(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Scalar entries as `(name, value, unit)`, in report order
    fn scalar_entries(&self) -> Vec<(&'static str, String, Option<&str>)> {
        fn entry<'a, T: ToString>(
            name: &'static str,
            q: &'a Quantity<T>,
        ) -> (&'static str, String, Option<&'a str>) {
            (name, q.value.to_string(), q.unit.as_deref())
        }
        fn float<'a>(
            name: &'static str,
            q: &'a Quantity<f64>,
        ) -> (&'static str, String, Option<&'a str>) {
            (name, legacy_float(q.value), q.unit.as_deref())
        }

        vec![
            entry("runs", &self.runs),
            entry("events", &self.events),
            entry("tracks", &self.tracks),
            entry("steps", &self.steps),
            float("init", &self.init),
            float("duration", &self.duration),
            entry("pps", &self.pps),
            entry("tps", &self.tps),
            entry("sps", &self.sps),
            entry("start_time", &self.start_time),
            entry("stop_time", &self.stop_time),
            float("sim_start_time", &self.sim_start_time),
            float("sim_stop_time", &self.sim_stop_time),
            entry("threads", &self.threads),
            entry("arch", &self.arch),
            entry("version", &self.version),
        ]
    }
}

/// Fixed-width text, one field per line
impl fmt::Display for ProcessedStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        for (name, value, unit) in self.scalar_entries() {
            lines.push(format!(
                "{name:<width$}{value} {}",
                unit.unwrap_or(""),
                width = LEGACY_COLUMN
            ));
        }
        if !self.track_types.value.is_empty() {
            lines.push("track_types".to_string());
            let indent = " ".repeat(TRACK_TYPE_INDENT);
            for (particle, count) in &self.track_types.value {
                lines.push(format!("{indent}{particle}: {count}"));
            }
        }
        f.write_str(&lines.join("\n"))
    }
}

/// Shortest round-trip float text with a signed, two-digit exponent
/// (`2.0`, `1e-07`, `1.5e+16`)
fn legacy_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let shortest = format!("{value:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}

/// OS family name as reported in the `arch` field
fn system_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        other => other,
    }
}

/// Merged statistics of one actor plus its output configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsOutput {
    name: String,
    config: StatisticsConfig,
    output_dir: PathBuf,
    merged: SimulationCounts,
}

impl StatisticsOutput {
    pub fn new(name: impl Into<String>, config: StatisticsConfig) -> Self {
        Self {
            name: name.into(),
            config,
            output_dir: PathBuf::from("."),
            merged: SimulationCounts::default(),
        }
    }

    /// Directory that relative and automatic file names resolve against
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut StatisticsConfig {
        &mut self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Set the report file name; a non-empty name also enables writing
    pub fn set_output_filename(&mut self, name: impl Into<String>) {
        self.config.set_output_filename(name);
    }

    pub fn merged_data(&self) -> &SimulationCounts {
        &self.merged
    }

    pub fn merged_data_mut(&mut self) -> &mut SimulationCounts {
        &mut self.merged
    }

    /// Stored data; only merged data is kept, any other selector is ignored
    pub fn get_data(&self, which: Option<&str>) -> &SimulationCounts {
        if let Some(which) = which.filter(|w| *w != MERGED) {
            warn!(
                actor = %self.name,
                which,
                "statistics output only stores merged data, selector ignored"
            );
        }
        &self.merged
    }

    /// Overlay engine-provided fields onto the merged data
    pub fn store_data(&mut self, fields: Map<String, Value>) -> Result<()> {
        debug!(actor = %self.name, fields = fields.len(), "storing statistics");
        self.merged.overlay(fields)
    }

    pub fn pps(&self) -> u64 {
        self.merged.pps()
    }

    pub fn tps(&self) -> u64 {
        self.merged.tps()
    }

    pub fn sps(&self) -> u64 {
        self.merged.sps()
    }

    pub fn get_processed_output(&self) -> ProcessedStatistics {
        ProcessedStatistics::from_counts(&self.merged)
    }

    pub fn output_path(&self) -> Result<PathBuf> {
        self.config.resolve_output_path(&self.output_dir, &self.name)
    }

    /// Report text in the configured encoding
    pub fn encode(&self) -> Result<String> {
        let processed = self.get_processed_output();
        match self.config.encoder {
            Encoder::Json => processed.to_json(),
            Encoder::Legacy => Ok(processed.to_string()),
        }
    }

    /// Write the report, returning its path
    #[instrument(skip(self), fields(actor = %self.name, encoder = %self.config.encoder))]
    pub fn write_data(&self) -> Result<PathBuf> {
        let path = self.output_path()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.encode()?)?;
        debug!(path = %path.display(), "statistics written");
        Ok(path)
    }

    /// Write the report only when writing to disk is enabled
    pub fn write_data_if_requested(&self) -> Result<Option<PathBuf>> {
        if self.config.write_to_disk {
            self.write_data().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl fmt::Display for StatisticsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get_processed_output().fmt(f)
    }
}
