// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Copy-on-write cloning and N-way merging.
//!
//! An [`Initializer`] fills a target value from any number of sources, matching properties by
//! name:
//!
//! - a primitive or verbatim takes the value of the last source that has one;
//! - a nested value supplied by exactly one source is shared with that source, while values
//!   supplied by several sources are merged recursively into a fresh value tagged like the last
//!   supplier;
//! - arrays grow to the longest source and are merged index by index with the same rule;
//! - maps take the union of all keys and are merged key by key with the same rule.
//!
//! Cloning is the one-source case: the clone has its own primitives but shares every nested
//! value with the original, so changing one property of the clone never affects the original.
use crate::{
    error::Error,
    model::{Node, NodeId},
    registry::Registry,
    traversal::{
        self, ArraySlot, MapSlot, PrimitiveSlot, PropertyKind, PropertyValue, Record, ScalarSlot,
        VerbatimSlot, Visitor,
    },
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Clones `node` shallowly.
pub fn clone_node(registry: &Registry, node: &Node) -> Result<Node, Error> {
    let tag = registry.tag_of_node(node)?;
    Initializer::new(registry).clone_from(tag, &[node])
}

/// Merges `sources` into a fresh value tagged like the last of them.
pub fn merge(registry: &Registry, sources: &[&Node]) -> Result<Node, Error> {
    let last = sources.last().ok_or(Error::NoSources)?;
    let tag = registry.tag_of_node(last)?;
    Initializer::new(registry).clone_from(tag, sources)
}

pub struct Initializer<'r> {
    registry: &'r Registry,
    // merges that have not finished yet, by their sources
    in_progress: Vec<(Vec<NodeId>, Node)>,
}

impl<'r> Initializer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            in_progress: Vec::new(),
        }
    }

    /// Allocates a `tag` and initializes it from `sources`.
    ///
    /// Merging the same sources again while the first merge is still running (which only happens
    /// in cyclic graphs) yields the value under construction, so the result has the same cycle.
    pub fn clone_from(&mut self, tag: &str, sources: &[&Node]) -> Result<Node, Error> {
        let key: Vec<NodeId> = sources.iter().map(|source| source.id()).collect();
        if let Some((_, target)) = self.in_progress.iter().find(|(k, _)| *k == key) {
            trace!(tag, "merge already in progress");
            return Ok(target.clone());
        }

        let target = self.registry.allocate(tag)?;
        self.in_progress.push((key, target.clone()));
        let result = self.overlay(&target, sources);
        self.in_progress.pop();
        result.map(|()| target)
    }

    /// Initializes the existing `target` from `sources`.
    ///
    /// Properties no source has keep their current value.
    pub fn overlay(&mut self, target: &Node, sources: &[&Node]) -> Result<(), Error> {
        let records = sources
            .iter()
            .map(|source| traversal::record(source))
            .collect::<Result<Vec<_>, _>>()?;
        target.traverse(&mut Overlay {
            initializer: self,
            sources: &records,
        })
    }

    /// Applies the one-versus-many rule to the values supplied for one position.
    fn combine(&mut self, suppliers: Vec<Node>) -> Result<Option<Node>, Error> {
        match suppliers.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single.clone())),
            [.., last] => {
                let tag = self.registry.tag_of_node(last)?;
                let sources: Vec<&Node> = suppliers.iter().collect();
                self.clone_from(tag, &sources).map(Some)
            }
        }
    }
}

struct Overlay<'a, 'r> {
    initializer: &'a mut Initializer<'r>,
    sources: &'a [Record],
}

impl<'a> Overlay<'a, '_> {
    /// The values the sources hold for `name`, in source order.
    fn supplied(&self, name: &str, kind: PropertyKind) -> Result<Vec<&'a PropertyValue>, Error> {
        let mut values = Vec::new();
        for record in self.sources {
            if let Some(value) = record.get(name) {
                if value.kind() != kind {
                    return Err(Error::TraversalMismatch {
                        property: name.to_string(),
                        expected: kind,
                        found: Some(value.kind()),
                    });
                }
                values.push(value);
            }
        }
        Ok(values)
    }
}

impl Visitor for Overlay<'_, '_> {
    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        let last = self
            .supplied(name, PropertyKind::Primitive)?
            .into_iter()
            .rev()
            .find_map(|value| match value {
                PropertyValue::Primitive(Some(value)) => Some(value.clone()),
                _ => None,
            });
        if let Some(value) = last {
            slot.set(Some(value)).map_err(|err| err.at(name))?;
        }
        Ok(())
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        let last = self
            .supplied(slot.name(), PropertyKind::Verbatim)?
            .into_iter()
            .rev()
            .find_map(|value| match value {
                PropertyValue::Verbatim(Some(value)) => Some(value.clone()),
                _ => None,
            });
        if let Some(value) = last {
            slot.set(Some(value))?;
        }
        Ok(())
    }

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error> {
        let suppliers: Vec<Node> = self
            .supplied(name, PropertyKind::Scalar)?
            .into_iter()
            .filter_map(|value| match value {
                PropertyValue::Scalar(node) => node.clone(),
                _ => None,
            })
            .collect();
        if suppliers.is_empty() {
            return Ok(());
        }
        let value = self.initializer.combine(suppliers)?;
        slot.set(value).map_err(|err| err.at(name))
    }

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error> {
        let arrays: Vec<&Vec<Option<Node>>> = self
            .supplied(name, PropertyKind::Array)?
            .into_iter()
            .filter_map(|value| match value {
                PropertyValue::Array(items) => Some(items),
                _ => None,
            })
            .collect();
        if arrays.is_empty() {
            return Ok(());
        }
        let len = arrays.iter().map(|items| items.len()).max().unwrap_or_default();
        let mut items = Vec::with_capacity(len);
        for index in 0..len {
            let suppliers = arrays
                .iter()
                .filter_map(|items| <[Option<Node>]>::get(items, index).cloned().flatten())
                .collect();
            items.push(self.initializer.combine(suppliers)?);
        }
        slot.set(items).map_err(|err| err.at(name))
    }

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error> {
        let maps: Vec<&BTreeMap<String, Option<Node>>> = self
            .supplied(name, PropertyKind::Map)?
            .into_iter()
            .filter_map(|value| match value {
                PropertyValue::Map(entries) => Some(entries),
                _ => None,
            })
            .collect();
        if maps.is_empty() {
            return Ok(());
        }
        let keys: BTreeSet<&String> = maps.iter().flat_map(|entries| entries.keys()).collect();
        let mut merged = BTreeMap::new();
        for key in keys {
            let suppliers = maps
                .iter()
                .filter_map(|entries| BTreeMap::get(*entries, key).cloned().flatten())
                .collect();
            merged.insert(key.clone(), self.initializer.combine(suppliers)?);
        }
        slot.set(merged).map_err(|err| err.at(name))
    }
}
