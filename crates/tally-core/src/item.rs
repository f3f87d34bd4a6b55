//! Output items: the uniform merge/ratio/write contract
//!
//! [`OutputItem`] is implemented by single payload wrappers and by composite
//! items, so whoever folds per-worker results never branches on payload kind.

use crate::error::{Error, Result};
use crate::image::Image3D;
use crate::naming::OutputSelector;
use crate::payload::Payload;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Merge, ratio and write operations shared by every output item
pub trait OutputItem: Sized {
    /// True when the item (or any of its members) holds no data
    fn is_unset(&self) -> bool;

    /// Sum of `self` and `other` as a new item
    fn merge(&self, other: &Self) -> Result<Self>;

    /// Add `other` into `self`
    fn merge_in_place(&mut self, other: &Self) -> Result<()>;

    /// Quotient of `self` and `other` as a new item
    fn ratio(&self, other: &Self) -> Result<Self>;

    /// Divide `self` by `other` in place
    fn ratio_in_place(&mut self, other: &Self) -> Result<()>;

    /// Write every output of this item derived from `path`, returning the
    /// paths actually written
    fn write(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Path of the output addressed by `selector`
    fn resolve_output_path(&self, base: &Path, selector: &OutputSelector) -> Result<PathBuf>;
}

/// Fold per-worker results into one accumulator.
///
/// Merges are applied sequentially in iteration order; the first item becomes
/// the accumulator. Returns `None` for an empty input.
pub fn merge_all<I, It>(items: It) -> Result<Option<I>>
where
    I: OutputItem,
    It: IntoIterator<Item = I>,
{
    let mut iter = items.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(None);
    };
    let mut merged = 1usize;
    for item in iter {
        acc.merge_in_place(&item)?;
        merged += 1;
    }
    debug!(merged, "folded worker results");
    Ok(Some(acc))
}

/// Wrapper around a single, possibly unset payload
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem<P> {
    data: Option<P>,
}

impl<P> Default for DataItem<P> {
    fn default() -> Self {
        Self { data: None }
    }
}

impl<P: Payload> DataItem<P> {
    /// Create an item without data
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an item holding `data`
    pub fn with_data(data: P) -> Self {
        Self { data: Some(data) }
    }

    /// Replace the stored payload
    pub fn set_data(&mut self, data: P) {
        self.data = Some(data);
    }

    /// Drop the stored payload
    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn data(&self) -> Option<&P> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut P> {
        self.data.as_mut()
    }

    pub fn into_data(self) -> Option<P> {
        self.data
    }

    /// Stored payload, or an unset error
    pub fn require(&self) -> Result<&P> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::unset(P::KIND.payload_name()))
    }

    fn require_mut(&mut self) -> Result<&mut P> {
        self.data
            .as_mut()
            .ok_or_else(|| Error::unset(P::KIND.payload_name()))
    }

    /// Both operands set and combinable
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        self.require()?.check_compatible(other.require()?)
    }
}

impl DataItem<Image3D> {
    /// Update image metadata; does nothing while the item is unset
    pub fn set_image_properties(&mut self, spacing: Option<[f64; 3]>, origin: Option<[f64; 3]>) {
        if let Some(image) = self.data.as_mut() {
            if let Some(spacing) = spacing {
                image.set_spacing(spacing);
            }
            if let Some(origin) = origin {
                image.set_origin(origin);
            }
        }
    }

    /// Replace the stored image with a freshly allocated one
    pub fn create_empty_image(
        &mut self,
        size: [usize; 3],
        spacing: [f64; 3],
        fill_value: f64,
    ) -> Result<()> {
        self.data = Some(Image3D::create_empty(size, spacing, fill_value)?);
        Ok(())
    }
}

impl<P: Payload> From<P> for DataItem<P> {
    fn from(data: P) -> Self {
        Self::with_data(data)
    }
}

impl<P: Payload> OutputItem for DataItem<P> {
    fn is_unset(&self) -> bool {
        self.data.is_none()
    }

    fn merge(&self, other: &Self) -> Result<Self> {
        let lhs = self.require()?;
        Ok(Self::with_data(lhs.add(other.require()?)?))
    }

    fn merge_in_place(&mut self, other: &Self) -> Result<()> {
        let rhs = other.require()?;
        self.require_mut()?.add_assign(rhs)
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        let lhs = self.require()?;
        Ok(Self::with_data(lhs.divide(other.require()?)?))
    }

    fn ratio_in_place(&mut self, other: &Self) -> Result<()> {
        let rhs = other.require()?;
        self.require_mut()?.divide_assign(rhs)
    }

    fn write(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.require()?.write(path)?;
        Ok(vec![path.to_path_buf()])
    }

    fn resolve_output_path(&self, base: &Path, _selector: &OutputSelector) -> Result<PathBuf> {
        Ok(base.to_path_buf())
    }
}
