//! The opaque payload contract
//!
//! A payload is one unit of mergeable simulation output. Concrete kinds only
//! supply the arithmetic primitives and their file encoding; the unset guard,
//! naming and kind dispatch live in [`crate::item`] and [`crate::value`].

use crate::error::Result;
use crate::kind::PayloadKind;
use std::fmt;
use std::path::Path;

/// Primitive operations every payload kind provides
///
/// `add` must be commutative and associative so that per-worker results can
/// be folded in any order.
pub trait Payload: Clone + fmt::Debug {
    /// Registry entry this payload belongs to
    const KIND: PayloadKind;

    /// Fail if `other` cannot be combined with `self` element by element
    fn check_compatible(&self, other: &Self) -> Result<()>;

    /// Element-wise sum into `self`
    fn add_assign(&mut self, other: &Self) -> Result<()>;

    /// Element-wise quotient into `self`
    fn divide_assign(&mut self, other: &Self) -> Result<()>;

    /// Element-wise sum as a new payload
    fn add(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    /// Element-wise quotient as a new payload
    fn divide(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.divide_assign(other)?;
        Ok(out)
    }

    /// Serialize using the kind's native encoding
    fn write(&self, path: &Path) -> Result<()>;

    /// Dimensions of the payload
    fn shape(&self) -> Vec<usize>;
}
