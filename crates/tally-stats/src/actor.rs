//! Simulation statistics actor
//!
//! Drives a [`StatisticsOutput`] from the simulation lifecycle: the thread
//! count is recorded at start, and at the end the engine's counters and the
//! run timing intervals are stored and the report is written if requested.

use crate::config::StatisticsConfig;
use crate::error::{Error, Result};
use crate::statistics::{SimulationCounts, StatisticsOutput};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Start and stop time of one run, in internal time units
pub type TimingInterval = (f64, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsActor {
    output: StatisticsOutput,
}

impl StatisticsActor {
    pub fn new(name: impl Into<String>, config: StatisticsConfig) -> Self {
        Self {
            output: StatisticsOutput::new(name, config),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output = self.output.with_output_dir(dir);
        self
    }

    pub fn name(&self) -> &str {
        self.output.name()
    }

    pub fn output(&self) -> &StatisticsOutput {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut StatisticsOutput {
        &mut self.output
    }

    pub fn output_dir(&self) -> &Path {
        self.output.output_dir()
    }

    /// Merged counts
    pub fn counts(&self) -> &SimulationCounts {
        self.output.merged_data()
    }

    pub fn start_simulation(&mut self, nb_threads: u32) {
        debug!(actor = %self.name(), nb_threads, "simulation started");
        self.output.merged_data_mut().nb_threads = nb_threads;
    }

    /// Store the engine's final counters and write the report if requested.
    ///
    /// The simulated start/stop times come from the first and last run
    /// timing interval, or zero when there are none. Intervals with a
    /// non-finite bound are rejected before anything is stored. Returns the
    /// written report path, if any.
    #[instrument(skip(self, engine_counts, run_timing_intervals), fields(actor = %self.name()))]
    pub fn end_simulation(
        &mut self,
        mut engine_counts: Map<String, Value>,
        run_timing_intervals: &[TimingInterval],
        nb_threads: u32,
    ) -> Result<Option<PathBuf>> {
        if let Some((start, stop)) = run_timing_intervals
            .iter()
            .find(|(start, stop)| !start.is_finite() || !stop.is_finite())
        {
            return Err(Error::InvalidField(format!(
                "run timing interval ({start}, {stop}) must have finite bounds"
            )));
        }
        if !self.output.config().track_types_flag {
            engine_counts.remove("track_types");
        }
        self.output.store_data(engine_counts)?;

        let sim_start = run_timing_intervals.first().map_or(0.0, |run| run.0);
        let sim_stop = run_timing_intervals.last().map_or(0.0, |run| run.1);
        let mut window = Map::new();
        window.insert("sim_start".to_string(), Value::from(sim_start));
        window.insert("sim_stop".to_string(), Value::from(sim_stop));
        self.output.store_data(window)?;

        let merged = self.output.merged_data_mut();
        merged.sim_start_time = sim_start;
        merged.sim_stop_time = sim_stop;
        merged.nb_threads = nb_threads;

        self.output.write_data_if_requested()
    }
}

impl fmt::Display for StatisticsActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.output.fmt(f)
    }
}
