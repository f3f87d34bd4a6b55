//! Composite layouts
//!
//! A layout fixes the member kinds of a composite, the suffixes its outputs
//! are written under, and the outputs derived from stored members.

use std::collections::BTreeMap;
use tally_core::{Error, OutputItem, OutputSelector, PayloadKind, PayloadValue, Result};

/// Output computed on demand from stored members
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedOutput {
    /// Element-wise `members[numerator] / members[denominator]`
    Quotient { numerator: usize, denominator: usize },
}

impl DerivedOutput {
    /// Name under which the output is addressed and written
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quotient { .. } => "quotient",
        }
    }

    /// Compute the output from the current members
    pub fn compute(&self, members: &[PayloadValue]) -> Result<PayloadValue> {
        match *self {
            Self::Quotient {
                numerator,
                denominator,
            } => {
                let num = member(members, numerator)?;
                let den = member(members, denominator)?;
                num.ratio(den)
            }
        }
    }

    fn members(&self) -> Vec<usize> {
        match *self {
            Self::Quotient {
                numerator,
                denominator,
            } => vec![numerator, denominator],
        }
    }
}

fn member(members: &[PayloadValue], index: usize) -> Result<&PayloadValue> {
    members
        .get(index)
        .ok_or_else(|| Error::UnknownAttribute(format!("no member at index {index}")))
}

/// Member kinds, output suffixes and derived outputs of a composite
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLayout {
    kinds: Vec<PayloadKind>,
    suffixes: BTreeMap<OutputSelector, String>,
    derived: Vec<DerivedOutput>,
}

impl CompositeLayout {
    /// Layout with the given member kinds, default suffixes and no derived outputs
    pub fn new(kinds: Vec<PayloadKind>) -> Result<Self> {
        if kinds.is_empty() {
            return Err(Error::Configuration(
                "a composite needs at least one member".to_string(),
            ));
        }
        Ok(Self {
            kinds,
            suffixes: BTreeMap::new(),
            derived: Vec::new(),
        })
    }

    /// Resolve member kinds by registry name
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let kinds = names
            .iter()
            .map(|name| name.as_ref().parse::<PayloadKind>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(kinds)
    }

    /// Two array members, written as `item_0` / `item_1`
    pub fn paired_array() -> Self {
        Self {
            kinds: vec![PayloadKind::Array, PayloadKind::Array],
            suffixes: BTreeMap::new(),
            derived: Vec::new(),
        }
    }

    /// Two image members written as `numerator` / `denominator`, plus their
    /// quotient written as `quotient`
    pub fn quotient_image() -> Self {
        let quotient = DerivedOutput::Quotient {
            numerator: 0,
            denominator: 1,
        };
        let suffixes = BTreeMap::from([
            (OutputSelector::Index(0), "numerator".to_string()),
            (OutputSelector::Index(1), "denominator".to_string()),
            (OutputSelector::derived(quotient.name()), quotient.name().to_string()),
        ]);
        Self {
            kinds: vec![PayloadKind::Image, PayloadKind::Image],
            suffixes,
            derived: vec![quotient],
        }
    }

    /// Override the suffix of one output
    pub fn with_suffix(
        mut self,
        selector: impl Into<OutputSelector>,
        suffix: impl Into<String>,
    ) -> Self {
        self.suffixes.insert(selector.into(), suffix.into());
        self
    }

    /// Register a derived output, written under its own name
    pub fn with_derived(mut self, output: DerivedOutput) -> Result<Self> {
        let members = output.members();
        if let Some(&bad) = members.iter().find(|&&i| i >= self.kinds.len()) {
            return Err(Error::Configuration(format!(
                "derived output '{}' refers to member {bad}, but the layout has {} members",
                output.name(),
                self.kinds.len()
            )));
        }
        if let [first, rest @ ..] = members.as_slice() {
            if rest.iter().any(|&i| self.kinds[i] != self.kinds[*first]) {
                return Err(Error::Configuration(format!(
                    "derived output '{}' combines members of different kinds",
                    output.name()
                )));
            }
        }
        if self.derived.iter().any(|d| d.name() == output.name()) {
            return Err(Error::Configuration(format!(
                "derived output '{}' registered twice",
                output.name()
            )));
        }
        self.suffixes
            .entry(OutputSelector::derived(output.name()))
            .or_insert_with(|| output.name().to_string());
        self.derived.push(output);
        Ok(self)
    }

    pub fn kinds(&self) -> &[PayloadKind] {
        &self.kinds
    }

    pub fn arity(&self) -> usize {
        self.kinds.len()
    }

    /// Suffix overrides carried by the layout
    pub fn suffixes(&self) -> &BTreeMap<OutputSelector, String> {
        &self.suffixes
    }

    pub fn derived_outputs(&self) -> &[DerivedOutput] {
        &self.derived
    }

    /// Look up a derived output by name
    pub fn derived(&self, name: &str) -> Option<&DerivedOutput> {
        self.derived.iter().find(|d| d.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layouts() {
        let pair = CompositeLayout::paired_array();
        assert_eq!(pair.kinds(), &[PayloadKind::Array, PayloadKind::Array]);
        assert!(pair.suffixes().is_empty());
        assert!(pair.derived_outputs().is_empty());

        let quotient = CompositeLayout::quotient_image();
        assert_eq!(quotient.arity(), 2);
        assert_eq!(quotient.suffixes()[&OutputSelector::Index(0)], "numerator");
        assert_eq!(quotient.suffixes()[&OutputSelector::Index(1)], "denominator");
        assert_eq!(
            quotient.suffixes()[&OutputSelector::derived("quotient")],
            "quotient"
        );
        assert!(quotient.derived("quotient").is_some());
    }

    #[test]
    fn test_from_names_rejects_unknown_kind() {
        let layout = CompositeLayout::from_names(&["array", "image"]).unwrap();
        assert_eq!(layout.kinds(), &[PayloadKind::Array, PayloadKind::Image]);

        let err = CompositeLayout::from_names(&["array", "histogram"]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = CompositeLayout::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_with_derived_validation() {
        let layout = CompositeLayout::paired_array()
            .with_derived(DerivedOutput::Quotient {
                numerator: 0,
                denominator: 1,
            })
            .unwrap();
        assert_eq!(
            layout.suffixes()[&OutputSelector::derived("quotient")],
            "quotient"
        );

        let out_of_range = CompositeLayout::paired_array().with_derived(DerivedOutput::Quotient {
            numerator: 0,
            denominator: 2,
        });
        assert!(matches!(out_of_range, Err(Error::Configuration(_))));

        let mixed = CompositeLayout::from_names(&["array", "image"])
            .unwrap()
            .with_derived(DerivedOutput::Quotient {
                numerator: 0,
                denominator: 1,
            });
        assert!(matches!(mixed, Err(Error::Configuration(_))));

        let twice = layout.with_derived(DerivedOutput::Quotient {
            numerator: 1,
            denominator: 0,
        });
        assert!(matches!(twice, Err(Error::Configuration(_))));
    }
}
