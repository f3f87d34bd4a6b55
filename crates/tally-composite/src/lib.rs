//! Composite output items
//!
//! A composite bundles a fixed number of payload values (for example a dose
//! numerator and denominator) that are merged member by member and written to
//! one file per member. Outputs derived from the stored members, such as the
//! quotient of two images, are computed on demand and written alongside.
//!
//! # Example
//!
//! ```rust
//! use tally_composite::CompositeItem;
//! use tally_core::{Image3D, OutputItem};
//! use std::path::Path;
//!
//! let num = Image3D::create_empty([2, 2, 2], [1.0; 3], 6.0).unwrap();
//! let den = Image3D::create_empty([2, 2, 2], [1.0; 3], 3.0).unwrap();
//! let item = CompositeItem::quotient_image(num, den);
//!
//! let quotient = item.quotient().unwrap();
//! assert!(quotient.as_image().unwrap().voxels().iter().all(|&v| v == 2.0));
//!
//! let path = item
//!     .resolve_output_path(Path::new("dose.mhd"), &"quotient".into())
//!     .unwrap();
//! assert_eq!(path, Path::new("dose_quotient.mhd"));
//! ```

pub mod any;
pub mod composite;
pub mod layout;

pub use any::{AnyItem, ItemKind};
pub use composite::{CompositeItem, MemberInit};
pub use layout::{CompositeLayout, DerivedOutput};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AnyItem, CompositeItem, CompositeLayout, DerivedOutput, ItemKind, MemberInit};
}
