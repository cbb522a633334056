// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The mapping between type tags, allocators and concrete types.
use crate::{
    error::Error,
    model::{Model, Node, Tagged},
};
use ahash::HashMap;
use std::any::{Any, TypeId};
use tracing::debug;

/// Constructs a value in its default state.
pub type Allocator = fn() -> Node;

fn allocate_default<T: Model + Default>() -> Node {
    Node::new(T::default())
}

/// Maps each type tag to an allocator, and each concrete type back to its tag.
///
/// The mapping is one to one: a tag names exactly one concrete type and a concrete type has
/// exactly one tag. Both directions are checked when registering.
pub struct Registry {
    allocators: HashMap<&'static str, Allocator>,
    tags: HashMap<TypeId, &'static str>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            allocators: HashMap::default(),
            tags: HashMap::default(),
        }
    }

    /// Registers `allocator` under `tag`.
    ///
    /// The allocator is called once to learn which concrete type it produces.
    pub fn register(&mut self, tag: &'static str, allocator: Allocator) -> Result<(), Error> {
        if self.allocators.contains_key(tag) {
            return Err(Error::DuplicateTag(tag.to_string()));
        }
        let type_id = allocator().type_id();
        if let Some(existing) = self.tags.get(&type_id) {
            return Err(Error::DuplicateType {
                tag,
                existing: *existing,
            });
        }
        debug!(tag, "registered type");
        self.allocators.insert(tag, allocator);
        self.tags.insert(type_id, tag);
        Ok(())
    }

    /// Registers `T` under [`Tagged::TAG`], allocating [`Default::default`].
    pub fn register_type<T: Model + Tagged + Default>(&mut self) -> Result<(), Error> {
        self.register(T::TAG, allocate_default::<T>)
    }

    pub fn has(&self, tag: &str) -> bool {
        self.allocators.contains_key(tag)
    }

    /// Allocates a fresh value of the type registered under `tag`.
    pub fn allocate(&self, tag: &str) -> Result<Node, Error> {
        let allocator = self
            .allocators
            .get(tag)
            .ok_or_else(|| Error::UnknownTag(tag.to_string()))?;
        Ok(allocator())
    }

    pub fn tag_of(&self, value: &dyn Model) -> Result<&'static str, Error> {
        self.tags
            .get(&Any::type_id(value.as_any()))
            .copied()
            .ok_or(Error::UnregisteredType(value.type_name()))
    }

    /// Like [`Registry::tag_of`], but without borrowing the value.
    pub fn tag_of_node(&self, node: &Node) -> Result<&'static str, Error> {
        self.tags
            .get(&node.type_id())
            .copied()
            .ok_or(Error::UnregisteredType(node.type_name()))
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.allocators.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .finish()
    }
}
