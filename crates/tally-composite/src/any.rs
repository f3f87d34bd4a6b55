//! Item registry
//!
//! [`ItemKind`] names every item type an actor can declare as its output, and
//! [`AnyItem`] holds one instance of any of them behind the common
//! [`OutputItem`] contract.

use crate::composite::CompositeItem;
use crate::layout::CompositeLayout;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tally_core::{Error, OutputItem, OutputSelector, PayloadKind, PayloadValue, Result};

/// Registered item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    SingleArray,
    SingleImage,
    PairedArray,
    QuotientImage,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::SingleArray,
        ItemKind::SingleImage,
        ItemKind::PairedArray,
        ItemKind::QuotientImage,
    ];

    /// Registry name
    pub fn name(self) -> &'static str {
        match self {
            Self::SingleArray => "SingleArrayDataItem",
            Self::SingleImage => "SingleItkImageDataItem",
            Self::PairedArray => "DoubleArrayDataItem",
            Self::QuotientImage => "QuotientItkImageDataItem",
        }
    }

    /// Fresh item of this type with no data
    pub fn empty(self) -> AnyItem {
        match self {
            Self::SingleArray => AnyItem::Single(PayloadKind::Array.empty()),
            Self::SingleImage => AnyItem::Single(PayloadKind::Image.empty()),
            Self::PairedArray => AnyItem::Composite(CompositeItem::paired_array()),
            Self::QuotientImage => {
                AnyItem::Composite(CompositeItem::new(CompositeLayout::quotient_image()))
            }
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // short registry keys used by older actor configurations
        if s.eq_ignore_ascii_case("SingleItkImage") {
            return Ok(Self::SingleImage);
        }
        if s.eq_ignore_ascii_case("QuotientImageDataItem") {
            return Ok(Self::QuotientImage);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Configuration(format!("unknown item type '{s}'")))
    }
}

/// An output item of any registered type
#[derive(Debug, Clone, PartialEq)]
pub enum AnyItem {
    Single(PayloadValue),
    Composite(CompositeItem),
}

impl AnyItem {
    pub fn as_single(&self) -> Option<&PayloadValue> {
        match self {
            Self::Single(value) => Some(value),
            Self::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeItem> {
        match self {
            Self::Composite(item) => Some(item),
            Self::Single(_) => None,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Single(_) => "single item",
            Self::Composite(_) => "composite item",
        }
    }

    /// An unset receiver is reported before any variant mismatch
    fn ensure_set(&self) -> Result<()> {
        if self.is_unset() {
            return Err(Error::unset(self.variant_name()));
        }
        Ok(())
    }

    fn mismatch(&self, other: &Self) -> Error {
        Error::KindMismatch {
            expected: self.variant_name(),
            actual: other.variant_name(),
        }
    }
}

impl From<PayloadValue> for AnyItem {
    fn from(value: PayloadValue) -> Self {
        Self::Single(value)
    }
}

impl From<CompositeItem> for AnyItem {
    fn from(item: CompositeItem) -> Self {
        Self::Composite(item)
    }
}

impl OutputItem for AnyItem {
    fn is_unset(&self) -> bool {
        match self {
            Self::Single(value) => value.is_unset(),
            Self::Composite(item) => item.is_unset(),
        }
    }

    fn merge(&self, other: &Self) -> Result<Self> {
        self.ensure_set()?;
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => Ok(Self::Single(a.merge(b)?)),
            (Self::Composite(a), Self::Composite(b)) => Ok(Self::Composite(a.merge(b)?)),
            _ => Err(self.mismatch(other)),
        }
    }

    fn merge_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_set()?;
        let mismatch = self.mismatch(other);
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => a.merge_in_place(b),
            (Self::Composite(a), Self::Composite(b)) => a.merge_in_place(b),
            _ => Err(mismatch),
        }
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        self.ensure_set()?;
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => Ok(Self::Single(a.ratio(b)?)),
            (Self::Composite(a), Self::Composite(b)) => Ok(Self::Composite(a.ratio(b)?)),
            _ => Err(self.mismatch(other)),
        }
    }

    fn ratio_in_place(&mut self, other: &Self) -> Result<()> {
        self.ensure_set()?;
        let mismatch = self.mismatch(other);
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => a.ratio_in_place(b),
            (Self::Composite(a), Self::Composite(b)) => a.ratio_in_place(b),
            _ => Err(mismatch),
        }
    }

    fn write(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self {
            Self::Single(value) => value.write(path),
            Self::Composite(item) => item.write(path),
        }
    }

    fn resolve_output_path(&self, base: &Path, selector: &OutputSelector) -> Result<PathBuf> {
        match self {
            Self::Single(value) => value.resolve_output_path(base, selector),
            Self::Composite(item) => item.resolve_output_path(base, selector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ArrayData;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(
            "DoubleArrayDataItem".parse::<ItemKind>().unwrap(),
            ItemKind::PairedArray
        );
        assert_eq!(
            "quotientitkimagedataitem".parse::<ItemKind>().unwrap(),
            ItemKind::QuotientImage
        );
        let registry_keys = [
            ("SingleItkImage", ItemKind::SingleImage),
            ("QuotientImageDataItem", ItemKind::QuotientImage),
            ("SingleArrayDataItem", ItemKind::SingleArray),
            ("DoubleArrayDataItem", ItemKind::PairedArray),
        ];
        for (key, kind) in registry_keys {
            assert_eq!(key.parse::<ItemKind>().unwrap(), kind);
        }
        assert!(matches!(
            "TripleArrayDataItem".parse::<ItemKind>(),
            Err(Error::Configuration(_))
        ));
        for kind in ItemKind::ALL {
            assert_eq!(kind.to_string().parse::<ItemKind>().unwrap(), kind);
            assert!(kind.empty().is_unset());
        }
    }

    #[test]
    fn test_variant_mismatch() {
        let single = AnyItem::from(PayloadValue::from(ArrayData::from_vec(vec![1.0])));
        let mut composite = AnyItem::from(
            CompositeItem::with_data(CompositeLayout::paired_array(), [vec![1.0], vec![2.0]])
                .unwrap(),
        );
        assert!(matches!(
            single.merge(&composite),
            Err(Error::KindMismatch { .. })
        ));
        assert!(matches!(
            composite.ratio_in_place(&single),
            Err(Error::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_unset_reported_before_variant_mismatch() {
        let single = AnyItem::from(PayloadValue::from(ArrayData::from_vec(vec![1.0])));
        let mut composite = ItemKind::QuotientImage.empty();
        assert!(matches!(
            composite.merge_in_place(&single),
            Err(Error::UnsetPayload(_))
        ));
        assert!(matches!(composite.ratio(&single), Err(Error::UnsetPayload(_))));

        let mut unset_single = ItemKind::SingleArray.empty();
        assert!(matches!(
            unset_single.merge(&composite),
            Err(Error::UnsetPayload(_))
        ));
        assert!(matches!(
            unset_single.ratio_in_place(&composite),
            Err(Error::UnsetPayload(_))
        ));
    }

    #[test]
    fn test_forwarding() {
        let a = AnyItem::from(PayloadValue::from(ArrayData::from_vec(vec![1.0, 2.0])));
        let b = AnyItem::from(PayloadValue::from(ArrayData::from_vec(vec![2.0, 2.0])));
        let merged = a.merge(&b).unwrap();
        let values = merged.as_single().unwrap().as_array().unwrap().values().to_vec();
        assert_eq!(values, vec![3.0, 4.0]);

        let composite = ItemKind::QuotientImage.empty();
        let path = composite
            .resolve_output_path(Path::new("dose.mhd"), &OutputSelector::derived("quotient"))
            .unwrap();
        assert_eq!(path, PathBuf::from("dose_quotient.mhd"));
    }
}
