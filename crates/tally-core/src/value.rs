//! Kind-erased payload values
//!
//! [`PayloadValue`] is what composite members and orchestrators hold: one
//! variant per registered kind. Kind-specific functionality is reachable
//! only through the enumerated capabilities below; anything a kind does not
//! provide fails with [`Error::UnknownAttribute`].

use crate::array::ArrayData;
use crate::error::{Error, Result};
use crate::image::Image3D;
use crate::item::{DataItem, OutputItem};
use crate::kind::{PayloadKind, RawPayload};
use crate::naming::OutputSelector;
use std::path::{Path, PathBuf};

/// Mutating calls that may be broadcast over payload values
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    /// Update spacing and/or origin of image payloads
    SetImageProperties {
        spacing: Option<[f64; 3]>,
        origin: Option<[f64; 3]>,
    },
    /// Replace image payloads with a freshly allocated image
    CreateEmptyImage {
        size: [usize; 3],
        spacing: [f64; 3],
        fill_value: f64,
    },
}

impl Broadcast {
    /// Name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetImageProperties { .. } => "set_image_properties",
            Self::CreateEmptyImage { .. } => "create_empty_image",
        }
    }
}

/// A payload of any registered kind
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Array(DataItem<ArrayData>),
    Image(DataItem<Image3D>),
}

impl PayloadValue {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Array(_) => PayloadKind::Array,
            Self::Image(_) => PayloadKind::Image,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayData> {
        match self {
            Self::Array(item) => item.data(),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image3D> {
        match self {
            Self::Image(item) => item.data(),
            Self::Array(_) => None,
        }
    }

    /// Replace the stored data, keeping the kind
    pub fn set_data(&mut self, raw: impl Into<RawPayload>) -> Result<()> {
        *self = self.kind().construct(raw.into())?;
        Ok(())
    }

    /// Shape of the stored payload, `None` while unset
    pub fn shape(&self) -> Option<Vec<usize>> {
        use crate::payload::Payload;
        match self {
            Self::Array(item) => item.data().map(Payload::shape),
            Self::Image(item) => item.data().map(Payload::shape),
        }
    }

    /// Image spacing
    pub fn spacing(&self) -> Result<[f64; 3]> {
        match self {
            Self::Image(item) => Ok(item.require()?.spacing()),
            Self::Array(_) => Err(self.unsupported("spacing")),
        }
    }

    /// Image origin
    pub fn origin(&self) -> Result<[f64; 3]> {
        match self {
            Self::Image(item) => Ok(item.require()?.origin()),
            Self::Array(_) => Err(self.unsupported("origin")),
        }
    }

    /// Whether this value's kind provides `call`
    pub fn supports(&self, call: &Broadcast) -> bool {
        match call {
            Broadcast::SetImageProperties { .. } | Broadcast::CreateEmptyImage { .. } => {
                matches!(self, Self::Image(_))
            }
        }
    }

    /// Apply a capability call to this value
    pub fn apply(&mut self, call: &Broadcast) -> Result<()> {
        match (self, call) {
            (Self::Image(item), Broadcast::SetImageProperties { spacing, origin }) => {
                item.set_image_properties(*spacing, *origin);
                Ok(())
            }
            (
                Self::Image(item),
                Broadcast::CreateEmptyImage {
                    size,
                    spacing,
                    fill_value,
                },
            ) => item.create_empty_image(*size, *spacing, *fill_value),
            (value, call) => Err(value.unsupported(call.name())),
        }
    }

    /// Both operands set, of the same kind, and combinable
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        self.ensure_set()?;
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.check_compatible(b),
            (Self::Image(a), Self::Image(b)) => a.check_compatible(b),
            _ => Err(self.mismatch(other)),
        }
    }

    fn ensure_set(&self) -> Result<()> {
        if self.is_unset() {
            return Err(Error::unset(self.kind().payload_name()));
        }
        Ok(())
    }

    fn mismatch(&self, other: &Self) -> Error {
        Error::KindMismatch {
            expected: self.kind().name(),
            actual: other.kind().name(),
        }
    }

    fn unsupported(&self, attribute: &str) -> Error {
        Error::UnknownAttribute(format!("{attribute} is not provided by {} payloads", self.kind()))
    }
}

impl From<ArrayData> for PayloadValue {
    fn from(array: ArrayData) -> Self {
        Self::Array(DataItem::with_data(array))
    }
}

impl From<Image3D> for PayloadValue {
    fn from(image: Image3D) -> Self {
        Self::Image(DataItem::with_data(image))
    }
}

impl OutputItem for PayloadValue {
    fn is_unset(&self) -> bool {
        match self {
            Self::Array(item) => item.is_unset(),
            Self::Image(item) => item.is_unset(),
        }
    }

    fn merge(&self, other: &Self) -> Result<Self> {
        self.ensure_set()?;
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Ok(Self::Array(a.merge(b)?)),
            (Self::Image(a), Self::Image(b)) => Ok(Self::Image(a.merge(b)?)),
            _ => Err(self.mismatch(other)),
        }
    }

    fn merge_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_set()?;
        let mismatch = self.mismatch(other);
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.merge_in_place(b),
            (Self::Image(a), Self::Image(b)) => a.merge_in_place(b),
            _ => Err(mismatch),
        }
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        self.ensure_set()?;
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Ok(Self::Array(a.ratio(b)?)),
            (Self::Image(a), Self::Image(b)) => Ok(Self::Image(a.ratio(b)?)),
            _ => Err(self.mismatch(other)),
        }
    }

    fn ratio_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_set()?;
        let mismatch = self.mismatch(other);
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.ratio_in_place(b),
            (Self::Image(a), Self::Image(b)) => a.ratio_in_place(b),
            _ => Err(mismatch),
        }
    }

    fn write(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self {
            Self::Array(item) => item.write(path),
            Self::Image(item) => item.write(path),
        }
    }

    fn resolve_output_path(&self, base: &Path, _selector: &OutputSelector) -> Result<PathBuf> {
        Ok(base.to_path_buf())
    }
}
