//! Registry of payload kinds
//!
//! Composite items declare one kind per member position. Kinds are resolved
//! through this closed registry; raw data is coerced by the kind's
//! constructor rather than by inspecting runtime types.

use crate::array::ArrayData;
use crate::error::{Error, Result};
use crate::image::Image3D;
use crate::item::DataItem;
use crate::value::PayloadValue;
use std::fmt;
use std::str::FromStr;

/// Every payload kind a member position may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Numeric array, merged element-wise
    Array,
    /// 3D image, merged voxel-wise
    Image,
}

impl PayloadKind {
    /// All registered kinds
    pub const ALL: [PayloadKind; 2] = [PayloadKind::Array, PayloadKind::Image];

    /// Registry name of the kind
    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Image => "image",
        }
    }

    pub(crate) fn payload_name(self) -> &'static str {
        match self {
            Self::Array => "array payload",
            Self::Image => "image payload",
        }
    }

    /// An unset value of this kind
    pub fn empty(self) -> PayloadValue {
        match self {
            Self::Array => PayloadValue::Array(DataItem::new()),
            Self::Image => PayloadValue::Image(DataItem::new()),
        }
    }

    /// Coerce raw data into a value of this kind
    pub fn construct(self, raw: RawPayload) -> Result<PayloadValue> {
        match (self, raw) {
            (_, RawPayload::Empty) => Ok(self.empty()),
            (Self::Array, RawPayload::Values(values)) => {
                Ok(PayloadValue::Array(DataItem::with_data(ArrayData::from_vec(values))))
            }
            (Self::Array, RawPayload::Array(array)) => {
                Ok(PayloadValue::Array(DataItem::with_data(array)))
            }
            (Self::Image, RawPayload::Image(image)) => {
                Ok(PayloadValue::Image(DataItem::with_data(image)))
            }
            (kind, raw) => Err(Error::KindMismatch {
                expected: kind.name(),
                actual: raw.kind_name(),
            }),
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PayloadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "array" | "singlearraydataitem" => Ok(Self::Array),
            "image" | "singleitkimage" | "singleitkimagedataitem" => Ok(Self::Image),
            _ => Err(Error::Configuration(format!(
                "illegal payload kind '{s}', available kinds are {:?}",
                Self::ALL.map(Self::name)
            ))),
        }
    }
}

/// Raw data handed over by the simulation engine before coercion
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawPayload {
    /// No data yet
    #[default]
    Empty,
    /// Flat list of values, coerced into a one-dimensional array
    Values(Vec<f64>),
    /// Already shaped array
    Array(ArrayData),
    /// Image with metadata
    Image(Image3D),
}

impl RawPayload {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Values(_) | Self::Array(_) => PayloadKind::Array.name(),
            Self::Image(_) => PayloadKind::Image.name(),
        }
    }
}

impl From<Vec<f64>> for RawPayload {
    fn from(values: Vec<f64>) -> Self {
        Self::Values(values)
    }
}

impl From<ArrayData> for RawPayload {
    fn from(array: ArrayData) -> Self {
        Self::Array(array)
    }
}

impl From<Image3D> for RawPayload {
    fn from(image: Image3D) -> Self {
        Self::Image(image)
    }
}
