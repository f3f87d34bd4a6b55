//! Simulation statistics aggregation and reporting
//!
//! Collects run/event/track/step counters and timings reported by a
//! simulation engine, derives per-second rates, and writes a report either as
//! a structured JSON document or as fixed-width text.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tally_stats::{StatisticsConfig, StatisticsOutput};
//!
//! let mut stats = StatisticsOutput::new("stats", StatisticsConfig::default());
//! let fields = json!({"events": 2000, "duration": 4.0e9});
//! stats.store_data(fields.as_object().unwrap().clone()).unwrap();
//! assert_eq!(stats.pps(), 500);
//!
//! let report = stats.get_processed_output();
//! assert_eq!(report.duration.unit.as_deref(), Some("s"));
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod statistics;
pub mod units;

pub use actor::{StatisticsActor, TimingInterval};
pub use config::{Encoder, StatisticsConfig};
pub use error::{Error, Result};
pub use statistics::{ProcessedStatistics, Quantity, SimulationCounts, StatisticsOutput};
pub use units::{best_time_unit, UnitCategory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Encoder, ProcessedStatistics, SimulationCounts, StatisticsActor, StatisticsConfig,
        StatisticsOutput,
    };
}
