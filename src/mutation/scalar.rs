// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{
    Mutator,
    strategy::{self, Strategy},
};
use crate::{error::Error, traversal::ScalarSlot};
use smallvec::SmallVec;
use tracing::debug;

/// How a nested value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStrategy {
    /// Replace it with a freshly allocated default.
    Fabricate,
    /// Replace it with a pooled value of the same type.
    Reuse,
    /// Replace it with a mutation of itself.
    Modify,
    Clear,
}

impl Strategy for ScalarStrategy {
    const CATALOG: &'static str = "scalar";
    const ALL: &'static [Self] = &[
        ScalarStrategy::Fabricate,
        ScalarStrategy::Reuse,
        ScalarStrategy::Modify,
        ScalarStrategy::Clear,
    ];

    fn name(self) -> &'static str {
        match self {
            ScalarStrategy::Fabricate => "fabricate",
            ScalarStrategy::Reuse => "reuse",
            ScalarStrategy::Modify => "modify",
            ScalarStrategy::Clear => "clear",
        }
    }
}

pub(super) fn mutate(
    mutator: &mut Mutator<'_>,
    name: &'static str,
    slot: &mut dyn ScalarSlot,
) -> Result<(), Error> {
    let current = slot.get();
    let tag = mutator.element_tag(slot.default_tag(), current.iter());
    let reusable = match tag {
        Some(tag) => mutator.reusable(tag, current.as_ref()),
        None => Vec::new(),
    };
    let modifiable = match &current {
        Some(current) => super::has_properties(current)?,
        None => false,
    };

    let weights = &mutator.config.scalar;
    let weighted: SmallVec<[(ScalarStrategy, u32); 4]> = ScalarStrategy::ALL
        .iter()
        .map(|&strategy| {
            let (enabled, weight) = match strategy {
                ScalarStrategy::Fabricate => (tag.is_some(), weights.fabricate),
                ScalarStrategy::Reuse => (!reusable.is_empty(), weights.reuse),
                ScalarStrategy::Modify => (modifiable, weights.modify),
                ScalarStrategy::Clear => (current.is_some(), weights.clear),
            };
            (strategy, if enabled { weight } else { 0 })
        })
        .collect();
    let strategy = strategy::choose(&mut mutator.rng, name, weighted)?;
    debug!(property = name, strategy = strategy.name(), "changing nested value");

    let after = match strategy {
        ScalarStrategy::Fabricate => {
            let tag = tag.ok_or_else(|| Error::MissingTypeTag {
                property: name.to_string(),
            })?;
            Some(mutator.fabricate(tag)?)
        }
        ScalarStrategy::Reuse => Some(mutator.pick(tag.unwrap_or(name), &reusable)?),
        ScalarStrategy::Modify => {
            let current = current.as_ref().ok_or_else(|| Error::ModifyAbsent {
                property: name.to_string(),
            })?;
            Some(mutator.mutate_nested(current)?)
        }
        ScalarStrategy::Clear => None,
    };
    slot.set(after).map_err(|err| err.at(name))
}
