//! # sim-tally
//!
//! Folding per-worker simulation results into one merged result and writing
//! it out under predictable file names.
//!
//! ## Crates
//!
//! - [`tally_core`]: array and image payloads, the [`OutputItem`]
//!   merge/ratio/write contract, output naming
//! - [`tally_composite`]: fixed-arity composites with derived
//!   outputs such as image quotients
//! - [`tally_stats`]: run statistics, derived rates and reports
//!
//! ## Example
//!
//! ```rust
//! use sim_tally::prelude::*;
//!
//! // one partial dose image per worker
//! let workers: Vec<PayloadValue> = (1..=3u8)
//!     .map(|i| Image3D::create_empty([4, 4, 4], [1.0; 3], f64::from(i)).unwrap().into())
//!     .collect();
//!
//! let merged = merge_all(workers).unwrap().unwrap();
//! assert!(merged.as_image().unwrap().voxels().iter().all(|&v| v == 6.0));
//! ```

pub use tally_composite;
pub use tally_core;
pub use tally_stats;

pub use tally_composite::{AnyItem, CompositeItem, CompositeLayout, DerivedOutput, ItemKind};
pub use tally_core::{
    insert_suffix, merge_all, ArrayData, Broadcast, DataItem, Error, Image3D, OutputItem,
    OutputSelector, PayloadKind, PayloadValue, Result,
};
pub use tally_stats::{Encoder, StatisticsActor, StatisticsConfig, StatisticsOutput};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use tally_composite::prelude::*;
    pub use tally_core::prelude::*;
    pub use tally_stats::prelude::*;
}
