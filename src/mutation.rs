// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Weighted-random mutation of modeled values.
//!
//! A [`Mutator`] never changes its input. It clones the value, changes one randomly picked
//! property of the clone and checks with the [comparator](crate::comparison) that the result
//! differs from the input. If it does not (a cleared property that was already empty, a
//! fabricated value equal to the old one), the attempt is discarded and another one is made.
//!
//! How a property changes depends on its kind:
//!
//! - primitives and verbatims are resampled from a catalog of generators;
//! - nested values, arrays and maps pick a strategy from their catalog, weighted by the
//!   [`MutatorConfig`] among the strategies whose preconditions hold.
//!
//! Every value the mutator fabricates or produces is added to its pool, from which later
//! mutations may reuse it. A value is never reused inside one of its own ancestors, so mutation
//! does not create cycles.
//!
//! ```rust
//! # use elevated::{Error, Model, Mutator, MutatorConfig, Registry, Shared, Tagged, Visitor};
//! #[derive(Debug, Default)]
//! struct Counter {
//!     count: Option<i64>,
//! }
//!
//! impl Tagged for Counter {
//!     const TAG: &'static str = "Counter";
//! }
//!
//! impl Model for Counter {
//!     fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
//!         visitor.begin(Self::TAG)?;
//!         visitor.primitive("count", &mut self.count)?;
//!         visitor.end()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_type::<Counter>()?;
//!
//! let mut mutator = Mutator::with_config(&registry, MutatorConfig::default().with_seed(1));
//! let before = Shared::new(Counter { count: Some(1) });
//! let after = mutator.mutate_as(&before)?;
//! assert_eq!(before.borrow().count, Some(1));
//! assert_ne!(after.borrow().count, Some(1));
//! # Ok::<(), Error>(())
//! ```
use crate::{
    comparison::{self, Comparator},
    error::Error,
    initializer,
    model::{Model, Node, NodeId, Shared, Tagged},
    registry::Registry,
    traversal::{self, ArraySlot, MapSlot, PrimitiveSlot, ScalarSlot, VerbatimSlot, Visitor},
};
use rand::{SeedableRng, rngs::SmallRng, seq::IndexedRandom};
use std::collections::BTreeMap;
use tracing::{debug, trace};

mod array;
mod config;
mod map;
mod primitive;
mod scalar;
mod strategy;
mod words;

pub use array::{ArrayStrategy, Position};
pub use config::{ArrayWeights, MapWeights, MutatorConfig, ScalarWeights};
pub use map::MapStrategy;
pub use scalar::ScalarStrategy;
pub use strategy::Strategy;

pub struct Mutator<'r> {
    registry: &'r Registry,
    config: MutatorConfig,
    rng: SmallRng,
    pool: BTreeMap<&'static str, Vec<Node>>,
    // values that are being mutated, and the clones replacing them
    ancestors: Vec<NodeId>,
}

impl<'r> Mutator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, MutatorConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: MutatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            registry,
            config,
            rng,
            pool: BTreeMap::new(),
            ancestors: Vec::new(),
        }
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// The values of type `tag` produced so far.
    pub fn pool(&self, tag: &str) -> &[Node] {
        self.pool.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns a mutated copy of `before` that differs from it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NoProperties`] if the value has nothing to mutate, and with
    /// [`Error::Unobservable`] if no attempt produced a different value.
    pub fn mutate(&mut self, before: &Node) -> Result<Node, Error> {
        let tag = self.registry.tag_of_node(before)?;
        let properties = traversal::collect_properties(before)?;
        if properties.is_empty() {
            return Err(Error::NoProperties {
                tag: tag.to_string(),
            });
        }

        let depth = self.ancestors.len();
        self.ancestors.push(before.id());
        let result = self.attempt(tag, before, &properties);
        self.ancestors.truncate(depth);

        let after = result?;
        self.pool.entry(tag).or_default().push(after.clone());
        Ok(after)
    }

    pub fn mutate_as<T: Model + Tagged>(&mut self, before: &Shared<T>) -> Result<Shared<T>, Error> {
        self.mutate(before.node())?
            .downcast()
            .map_err(|node| Error::TypeMismatch {
                property: "$".into(),
                expected: T::TAG,
                found: node.type_name().to_string(),
            })
    }

    /// Mutates one randomly picked entry of a symbol table.
    pub fn mutate_table(
        &mut self,
        table: &BTreeMap<String, Node>,
    ) -> Result<BTreeMap<String, Node>, Error> {
        let names: Vec<&String> = table.keys().collect();
        let Some(name) = names.choose(&mut self.rng).copied() else {
            return Err(Error::NoProperties {
                tag: "symbol table".into(),
            });
        };
        debug!(symbol = name.as_str(), "mutating symbol");
        let after = self.mutate(&table[name])?;
        let mut table = table.clone();
        table.insert(name.clone(), after);
        Ok(table)
    }

    /// Allocates a default value of `tag` and adds it to the pool.
    pub fn fabricate(&mut self, tag: &str) -> Result<Node, Error> {
        let node = self.registry.allocate(tag)?;
        let tag = self.registry.tag_of_node(&node)?;
        trace!(tag, "fabricated");
        self.pool.entry(tag).or_default().push(node.clone());
        Ok(node)
    }

    fn attempt(
        &mut self,
        tag: &'static str,
        before: &Node,
        properties: &[(&'static str, traversal::PropertyKind)],
    ) -> Result<Node, Error> {
        let mut candidates = properties.to_vec();
        for attempt in 1..=self.config.max_attempts {
            let after = initializer::clone_node(self.registry, before)?;
            let Some(&(target, kind)) = candidates.choose(&mut self.rng) else {
                return Err(Error::NoProperties {
                    tag: tag.to_string(),
                });
            };
            debug!(tag, property = target, ?kind, attempt, "mutating property");

            self.ancestors.push(after.id());
            let outcome = after.traverse(&mut PropertyMutator {
                mutator: self,
                target,
            });
            self.ancestors.pop();
            match outcome {
                Ok(()) => {}
                // nothing applies to the property as it is, so another one has to change
                Err(err @ Error::NoStrategy { .. }) => {
                    debug!(tag, property = target, %err, "property cannot change");
                    candidates.retain(|&(name, _)| name != target);
                    if candidates.is_empty() {
                        return Err(err);
                    }
                    continue;
                }
                Err(Error::Unobservable { .. }) => {
                    trace!(tag, property = target, attempt, "nested value did not change");
                    continue;
                }
                Err(err) => return Err(err),
            }

            if comparison::compare(self.registry, before, &after)?.is_ne() {
                return Ok(after);
            }
            trace!(tag, property = target, attempt, "mutation was not observable");
        }
        Err(Error::Unobservable {
            tag: tag.to_string(),
            attempts: self.config.max_attempts,
        })
    }

    /// Mutates a value nested in the one being mutated.
    ///
    /// A nested value that cannot change at all fails as [`Error::Unobservable`], which the
    /// enclosing mutation retries like any other unobservable attempt.
    fn mutate_nested(&mut self, child: &Node) -> Result<Node, Error> {
        match self.mutate(child) {
            Err(Error::NoStrategy { .. } | Error::NoProperties { .. }) => {
                Err(Error::Unobservable {
                    tag: self.registry.tag_of_node(child)?.to_string(),
                    attempts: 0,
                })
            }
            result => result,
        }
    }

    /// The pooled values of `tag` that may be placed next to `current` without creating a cycle.
    fn reusable(&self, tag: &str, current: Option<&Node>) -> Vec<Node> {
        self.pool(tag)
            .iter()
            .filter(|node| !self.ancestors.contains(&node.id()))
            .filter(|node| current.is_none_or(|current| !current.ptr_eq(node)))
            .cloned()
            .collect()
    }

    fn pick(&mut self, tag: &str, candidates: &[Node]) -> Result<Node, Error> {
        candidates
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| Error::EmptyPool {
                tag: tag.to_string(),
            })
    }

    /// The type of value to fabricate or reuse for a slot.
    ///
    /// Untyped slots fall back to the type of a value they already hold.
    fn element_tag<'n>(
        &self,
        default_tag: Option<&'static str>,
        mut existing: impl Iterator<Item = &'n Node>,
    ) -> Option<&'static str> {
        default_tag.or_else(|| existing.find_map(|node| self.registry.tag_of_node(node).ok()))
    }

    /// Whether no two items are structurally equal.
    fn all_distinct(&self, items: &[Option<Node>]) -> Result<bool, Error> {
        let mut comparator = Comparator::new(self.registry);
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                if comparator.compare_optional(a.as_ref(), b.as_ref())?.is_eq() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// Whether `node` has any property a mutation could change.
fn has_properties(node: &Node) -> Result<bool, Error> {
    Ok(!traversal::collect_properties(node)?.is_empty())
}

/// Changes the one property called `target`.
struct PropertyMutator<'a, 'r> {
    mutator: &'a mut Mutator<'r>,
    target: &'static str,
}

impl Visitor for PropertyMutator<'_, '_> {
    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        if name != self.target {
            return Ok(());
        }
        let before = slot.get();
        let after = primitive::resample(&mut self.mutator.rng, slot.kind(), before.as_ref());
        trace!(property = name, ?before, ?after, "resampled primitive");
        slot.set(Some(after)).map_err(|err| err.at(name))
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        if !slot.names().contains(&self.target) {
            return Ok(());
        }
        let before = slot.get();
        let after = primitive::resample(&mut self.mutator.rng, slot.kind(), before.as_ref());
        trace!(property = self.target, ?before, ?after, "resampled verbatim");
        slot.set(Some(after))
    }

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error> {
        if name != self.target {
            return Ok(());
        }
        scalar::mutate(self.mutator, name, slot)
    }

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error> {
        if name != self.target {
            return Ok(());
        }
        array::mutate(self.mutator, name, slot)
    }

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error> {
        if name != self.target {
            return Ok(());
        }
        map::mutate(self.mutator, name, slot)
    }
}
