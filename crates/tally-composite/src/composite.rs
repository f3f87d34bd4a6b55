//! Composite items
//!
//! A [`CompositeItem`] is a fixed-arity tuple of payload values merged and
//! written member by member. Every output (stored member or derived output)
//! is written to its own file, named by inserting the output's suffix into a
//! single base path.

use crate::layout::CompositeLayout;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tally_core::{
    insert_suffix, ArrayData, Broadcast, Error, Image3D, OutputItem, OutputSelector, PayloadKind,
    PayloadValue, RawPayload, Result,
};
use tracing::{debug, instrument, warn};

/// Initial data for one member position
#[derive(Debug, Clone, PartialEq)]
pub enum MemberInit {
    /// Already typed value; its kind must match the declared kind
    Typed(PayloadValue),
    /// Raw data, coerced into the declared kind
    Raw(RawPayload),
}

impl MemberInit {
    fn into_value(self, kind: PayloadKind) -> Result<PayloadValue> {
        match self {
            Self::Typed(value) if value.kind() == kind => Ok(value),
            Self::Typed(value) => Err(Error::KindMismatch {
                expected: kind.name(),
                actual: value.kind().name(),
            }),
            Self::Raw(raw) => kind.construct(raw),
        }
    }
}

impl From<PayloadValue> for MemberInit {
    fn from(value: PayloadValue) -> Self {
        Self::Typed(value)
    }
}

impl From<RawPayload> for MemberInit {
    fn from(raw: RawPayload) -> Self {
        Self::Raw(raw)
    }
}

impl From<ArrayData> for MemberInit {
    fn from(array: ArrayData) -> Self {
        Self::Raw(RawPayload::Array(array))
    }
}

impl From<Image3D> for MemberInit {
    fn from(image: Image3D) -> Self {
        Self::Raw(RawPayload::Image(image))
    }
}

impl From<Vec<f64>> for MemberInit {
    fn from(values: Vec<f64>) -> Self {
        Self::Raw(RawPayload::Values(values))
    }
}

/// Fixed-arity tuple of payload values
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeItem {
    layout: CompositeLayout,
    members: Vec<PayloadValue>,
    suffixes: BTreeMap<OutputSelector, String>,
}

impl CompositeItem {
    /// Composite with every member unset
    pub fn new(layout: CompositeLayout) -> Self {
        let members = layout.kinds().iter().map(|k| k.empty()).collect();
        let suffixes = layout.suffixes().clone();
        Self {
            layout,
            members,
            suffixes,
        }
    }

    /// Composite with one initial value per member position
    pub fn with_data<I>(layout: CompositeLayout, data: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<MemberInit>,
    {
        let mut item = Self::new(layout);
        item.set_data(data)?;
        Ok(item)
    }

    /// Composite whose member kinds are resolved by registry name
    pub fn from_kind_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Ok(Self::new(CompositeLayout::from_names(names)?))
    }

    /// Two unset array members
    pub fn paired_array() -> Self {
        Self::new(CompositeLayout::paired_array())
    }

    /// Numerator and denominator images with a derived quotient
    pub fn quotient_image(numerator: Image3D, denominator: Image3D) -> Self {
        let layout = CompositeLayout::quotient_image();
        Self {
            suffixes: layout.suffixes().clone(),
            members: vec![numerator.into(), denominator.into()],
            layout,
        }
    }

    /// Replace all members at once
    pub fn set_data<I>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<MemberInit>,
    {
        let inits: Vec<MemberInit> = data.into_iter().map(Into::into).collect();
        if inits.len() != self.arity() {
            return Err(Error::size_mismatch(
                self.arity(),
                inits.len(),
                "composite initial data",
            ));
        }
        let members = inits
            .into_iter()
            .zip(self.layout.kinds())
            .map(|(init, &kind)| init.into_value(kind))
            .collect::<Result<Vec<_>>>()?;
        self.members = members;
        Ok(())
    }

    /// Replace one member
    pub fn set_member(&mut self, index: usize, data: impl Into<MemberInit>) -> Result<()> {
        let kind = *self.layout.kinds().get(index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "member index {index} out of range for {} members",
                self.arity()
            ))
        })?;
        self.members[index] = data.into().into_value(kind)?;
        Ok(())
    }

    pub fn layout(&self) -> &CompositeLayout {
        &self.layout
    }

    pub fn arity(&self) -> usize {
        self.members.len()
    }

    pub fn kinds(&self) -> &[PayloadKind] {
        self.layout.kinds()
    }

    pub fn members(&self) -> &[PayloadValue] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&PayloadValue> {
        self.members.get(index)
    }

    pub fn member_mut(&mut self, index: usize) -> Option<&mut PayloadValue> {
        self.members.get_mut(index)
    }

    /// Stored member written under `suffix`, e.g. `"numerator"`
    pub fn member_named(&self, suffix: &str) -> Option<&PayloadValue> {
        self.suffixes.iter().find_map(|(selector, s)| match selector {
            OutputSelector::Index(i) if s == suffix => self.members.get(*i),
            _ => None,
        })
    }

    /// Compute a derived output by name
    pub fn derived(&self, name: &str) -> Result<PayloadValue> {
        let output = self.layout.derived(name).ok_or_else(|| {
            Error::UnknownAttribute(format!("no derived output named '{name}'"))
        })?;
        output.compute(&self.members)
    }

    /// `numerator / denominator` for quotient layouts
    pub fn quotient(&self) -> Result<PayloadValue> {
        self.derived("quotient")
    }

    /// Override the suffix of one output of this instance
    pub fn set_output_suffix(
        &mut self,
        selector: impl Into<OutputSelector>,
        suffix: impl Into<String>,
    ) {
        self.suffixes.insert(selector.into(), suffix.into());
    }

    /// Effective naming map: overrides merged over the `item_{i}` defaults
    pub fn naming_map(&self) -> BTreeMap<OutputSelector, String> {
        let mut map = self.suffixes.clone();
        for i in 0..self.arity() {
            let selector = OutputSelector::Index(i);
            if !map.contains_key(&selector) {
                let suffix = selector.default_suffix();
                map.insert(selector, suffix);
            }
        }
        map
    }

    /// Apply `call` to every member that supports it.
    ///
    /// Fails with [`Error::UnknownAttribute`] if no member does.
    pub fn broadcast(&mut self, call: &Broadcast) -> Result<()> {
        if !self.members.iter().any(|m| m.supports(call)) {
            return Err(Error::UnknownAttribute(format!(
                "{} is not provided by any member",
                call.name()
            )));
        }
        for member in self.members.iter_mut().filter(|m| m.supports(call)) {
            member.apply(call)?;
        }
        Ok(())
    }

    /// Validate both operands before any member is touched
    fn check_operands(&self, other: &Self) -> Result<()> {
        if self.is_unset() {
            return Err(Error::unset("composite item"));
        }
        if other.arity() != self.arity() {
            return Err(Error::size_mismatch(self.arity(), other.arity(), "composite members"));
        }
        for (lhs, rhs) in self.members.iter().zip(&other.members) {
            lhs.check_compatible(rhs)?;
        }
        Ok(())
    }

    fn rebuild(&self, members: Vec<PayloadValue>) -> Self {
        Self {
            layout: self.layout.clone(),
            members,
            suffixes: self.suffixes.clone(),
        }
    }
}

impl OutputItem for CompositeItem {
    fn is_unset(&self) -> bool {
        self.members.iter().any(|m| m.is_unset())
    }

    fn merge(&self, other: &Self) -> Result<Self> {
        self.check_operands(other)?;
        let members = self
            .members
            .iter()
            .zip(&other.members)
            .map(|(a, b)| a.merge(b))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.rebuild(members))
    }

    fn merge_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_operands(other)?;
        for (a, b) in self.members.iter_mut().zip(&other.members) {
            a.merge_in_place(b)?;
        }
        Ok(())
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        self.check_operands(other)?;
        let members = self
            .members
            .iter()
            .zip(&other.members)
            .map(|(a, b)| a.ratio(b))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.rebuild(members))
    }

    fn ratio_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_operands(other)?;
        for (a, b) in self.members.iter_mut().zip(&other.members) {
            a.ratio_in_place(b)?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(arity = self.arity()))]
    fn write(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (selector, suffix) in self.naming_map() {
            let full_path = insert_suffix(path, &suffix);
            match selector {
                OutputSelector::Index(i) => match self.members.get(i) {
                    Some(member) => written.extend(member.write(&full_path)?),
                    None => {
                        warn!(index = i, "no data for item number {i}, cannot write this output");
                    }
                },
                OutputSelector::Derived(name) => {
                    written.extend(self.derived(&name)?.write(&full_path)?);
                }
            }
        }
        debug!(files = written.len(), "composite written");
        Ok(written)
    }

    fn resolve_output_path(&self, base: &Path, selector: &OutputSelector) -> Result<PathBuf> {
        let map = self.naming_map();
        let suffix = map.get(selector).ok_or_else(|| {
            Error::UnknownAttribute(format!("no output named '{selector}'"))
        })?;
        Ok(insert_suffix(base, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DerivedOutput;

    fn image(fill: f64) -> Image3D {
        Image3D::create_empty([2, 2, 2], [1.0; 3], fill).unwrap()
    }

    fn pair(a: &[f64], b: &[f64]) -> CompositeItem {
        CompositeItem::with_data(
            CompositeLayout::paired_array(),
            [a.to_vec(), b.to_vec()],
        )
        .unwrap()
    }

    #[test]
    fn test_construction_coerces_members() {
        let item = pair(&[1.0, 2.0], &[3.0]);
        assert_eq!(item.arity(), 2);
        assert!(!item.is_unset());
        assert_eq!(item.member(1).unwrap().shape(), Some(vec![1]));
    }

    #[test]
    fn test_construction_checks_arity_and_kind() {
        let err =
            CompositeItem::with_data(CompositeLayout::paired_array(), [vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let typed: PayloadValue = image(1.0).into();
        let err = CompositeItem::with_data(
            CompositeLayout::paired_array(),
            [MemberInit::Typed(typed), MemberInit::from(vec![1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));

        let err = CompositeItem::from_kind_names(&["array", "voxels"]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_unset_if_any_member_unset() {
        let mut item = CompositeItem::paired_array();
        assert!(item.is_unset());
        item.set_member(0, vec![1.0]).unwrap();
        assert!(item.is_unset());
        item.set_member(1, vec![2.0]).unwrap();
        assert!(!item.is_unset());
        assert!(item.set_member(2, vec![2.0]).is_err());
    }

    #[test]
    fn test_unset_guard() {
        let mut unset = CompositeItem::paired_array();
        unset.set_member(0, vec![1.0]).unwrap();
        let set = pair(&[1.0], &[1.0]);

        assert!(matches!(unset.merge(&set), Err(Error::UnsetPayload(_))));
        assert!(matches!(unset.merge_in_place(&set), Err(Error::UnsetPayload(_))));
        assert!(matches!(unset.ratio(&set), Err(Error::UnsetPayload(_))));
        assert!(matches!(unset.ratio_in_place(&set), Err(Error::UnsetPayload(_))));
    }

    #[test]
    fn test_in_place_merge_is_all_or_nothing() {
        let mut acc = pair(&[1.0, 1.0], &[2.0]);
        let before = acc.clone();

        // second member has the wrong shape: nothing may be merged
        let bad = pair(&[1.0, 1.0], &[2.0, 2.0]);
        assert!(acc.merge_in_place(&bad).is_err());
        assert_eq!(acc, before);

        // other operand partially unset
        let mut partial = CompositeItem::paired_array();
        partial.set_member(0, vec![5.0, 5.0]).unwrap();
        assert!(matches!(acc.merge_in_place(&partial), Err(Error::UnsetPayload(_))));
        assert_eq!(acc, before);
    }

    #[test]
    fn test_merge_and_ratio_forward_per_member() {
        let a = pair(&[1.0, 2.0], &[10.0]);
        let b = pair(&[3.0, 4.0], &[5.0]);

        let sum = a.merge(&b).unwrap();
        assert_eq!(sum.member(0).unwrap().as_array().unwrap().values(), &[4.0, 6.0]);
        assert_eq!(sum.member(1).unwrap().as_array().unwrap().values(), &[15.0]);
        // inputs untouched
        assert_eq!(a.member(0).unwrap().as_array().unwrap().values(), &[1.0, 2.0]);

        let mut q = sum.clone();
        q.ratio_in_place(&b).unwrap();
        assert_eq!(q.member(1).unwrap().as_array().unwrap().values(), &[3.0]);
        assert_eq!(q, sum.ratio(&b).unwrap());
    }

    #[test]
    fn test_naming_map_defaults_and_overrides() {
        let mut item = CompositeItem::paired_array();
        let map = item.naming_map();
        assert_eq!(map[&OutputSelector::Index(0)], "item_0");
        assert_eq!(map[&OutputSelector::Index(1)], "item_1");

        item.set_output_suffix(1, "counts");
        assert_eq!(item.naming_map()[&OutputSelector::Index(1)], "counts");

        // overrides are per instance
        assert_eq!(
            CompositeItem::paired_array().naming_map()[&OutputSelector::Index(1)],
            "item_1"
        );
    }

    #[test]
    fn test_resolve_output_path() {
        let item = CompositeItem::quotient_image(image(1.0), image(2.0));
        let base = Path::new("out/dose.mhd");
        assert_eq!(
            item.resolve_output_path(base, &OutputSelector::Index(0)).unwrap(),
            PathBuf::from("out/dose_numerator.mhd")
        );
        assert_eq!(
            item.resolve_output_path(base, &OutputSelector::derived("quotient"))
                .unwrap(),
            PathBuf::from("out/dose_quotient.mhd")
        );
        assert!(matches!(
            item.resolve_output_path(base, &OutputSelector::derived("variance")),
            Err(Error::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_quotient_is_computed_on_demand() {
        let mut item = CompositeItem::quotient_image(image(3.0), image(2.0));
        let q = item.quotient().unwrap();
        assert!(q.as_image().unwrap().voxels().iter().all(|&v| v == 1.5));

        item.merge_in_place(&CompositeItem::quotient_image(image(1.0), image(0.0)))
            .unwrap();
        let q = item.quotient().unwrap();
        assert!(q.as_image().unwrap().voxels().iter().all(|&v| v == 2.0));

        assert_eq!(item.member_named("numerator"), item.member(0));
        assert_eq!(item.member_named("denominator"), item.member(1));
        assert!(item.derived("variance").is_err());
    }

    #[test]
    fn test_write_skips_missing_members() {
        let dir = tempfile::tempdir().unwrap();
        let mut item = pair(&[1.0, 2.0], &[3.0]);
        item.set_output_suffix(5, "ghost");

        let written = item.write(&dir.path().join("hits.txt")).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("hits_item_0.txt"), dir.path().join("hits_item_1.txt")]
        );
        assert!(!dir.path().join("hits_ghost.txt").exists());

        let back = ArrayData::read_text(&written[0]).unwrap();
        assert_eq!(back.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_broadcast() {
        let mut item = CompositeItem::quotient_image(image(1.0), image(1.0));
        item.broadcast(&Broadcast::SetImageProperties {
            spacing: Some([2.0, 2.0, 4.0]),
            origin: Some([1.0, 1.0, 1.0]),
        })
        .unwrap();
        for member in item.members() {
            assert_eq!(member.spacing().unwrap(), [2.0, 2.0, 4.0]);
            assert_eq!(member.origin().unwrap(), [1.0, 1.0, 1.0]);
        }

        let mut arrays = pair(&[1.0], &[1.0]);
        let err = arrays
            .broadcast(&Broadcast::SetImageProperties {
                spacing: None,
                origin: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute(_)));
    }

    #[test]
    fn test_broadcast_allocates_unset_images() {
        let mut item = CompositeItem::new(CompositeLayout::quotient_image());
        assert!(item.is_unset());
        item.broadcast(&Broadcast::CreateEmptyImage {
            size: [4, 4, 1],
            spacing: [1.0; 3],
            fill_value: 0.0,
        })
        .unwrap();
        assert!(!item.is_unset());
        assert_eq!(item.member(1).unwrap().shape(), Some(vec![4, 4, 1]));
    }

    #[test]
    fn test_broadcast_rejects_overflowing_size() {
        let mut item = CompositeItem::new(CompositeLayout::quotient_image());
        let err = item
            .broadcast(&Broadcast::CreateEmptyImage {
                size: [usize::MAX, 2, 1],
                spacing: [1.0; 3],
                fill_value: 0.0,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(item.is_unset());
    }

    #[test]
    fn test_custom_layout_with_derived_output() {
        let layout = CompositeLayout::paired_array()
            .with_derived(DerivedOutput::Quotient {
                numerator: 1,
                denominator: 0,
            })
            .unwrap()
            .with_suffix(0, "hits");
        let item = CompositeItem::with_data(layout, [vec![2.0], vec![5.0]]).unwrap();
        let q = item.quotient().unwrap();
        assert_eq!(q.as_array().unwrap().values(), &[2.5]);
        assert_eq!(item.naming_map()[&OutputSelector::Index(0)], "hits");
    }
}
