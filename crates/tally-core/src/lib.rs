//! Core types for merging per-worker simulation results
//!
//! Independent simulation workers each produce partial results: numeric
//! arrays, dose images, derived ratios. This crate provides the payload kinds
//! and the uniform item contract used to fold those partial results into one
//! merged result and to write it out under predictable file names.
//!
//! # Layers
//!
//! 1. **Payload kinds** - [`ArrayData`] and [`Image3D`] implement the
//!    [`Payload`] primitives (element-wise add/divide, native file encoding)
//! 2. **Data items** - [`DataItem`] wraps one possibly-unset payload and
//!    guards every operation against missing data
//! 3. **Kind registry** - [`PayloadKind`] and [`PayloadValue`] erase the
//!    concrete kind so composite items can mix members
//!
//! Everything implements [`OutputItem`], so an orchestrator folding worker
//! results never needs to know which kind it holds.
//!
//! # Example
//!
//! ```rust
//! use tally_core::{merge_all, ArrayData, DataItem, OutputItem};
//!
//! let workers = vec![
//!     DataItem::with_data(ArrayData::from_vec(vec![1.0, 2.0])),
//!     DataItem::with_data(ArrayData::from_vec(vec![3.0, 4.0])),
//! ];
//! let merged = merge_all(workers).unwrap().unwrap();
//! assert_eq!(merged.data().unwrap().values(), &[4.0, 6.0]);
//! ```

pub mod array;
pub mod error;
pub mod image;
pub mod item;
pub mod kind;
pub mod naming;
pub mod ops;
pub mod payload;
pub mod value;

pub use error::{Error, Result};

pub use array::ArrayData;
pub use image::Image3D;
pub use item::{merge_all, DataItem, OutputItem};
pub use kind::{PayloadKind, RawPayload};
pub use naming::{insert_suffix, OutputSelector};
pub use payload::Payload;
pub use value::{Broadcast, PayloadValue};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        insert_suffix, merge_all, ArrayData, Broadcast, DataItem, Error, Image3D, OutputItem,
        OutputSelector, Payload, PayloadKind, PayloadValue, RawPayload, Result,
    };
}
