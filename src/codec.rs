// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Reference-preserving JSON representation
//!
//! Every modeled value is written as a JSON object with three header keys followed by one key
//! per property:
//!
//! ```json
//! {
//!   "__class__": "Record",
//!   "__id__": 0,
//!   "__is_ref__": false,
//!   "count": 3,
//!   "next": null
//! }
//! ```
//!
//! `__id__` is unique per tag within one encoding session and starts at `0` for every tag. The
//! first time a value is reached its body is written; every later time only the header is
//! written, with `__is_ref__` set:
//!
//! ```json
//! { "__class__": "Record", "__id__": 0, "__is_ref__": true }
//! ```
//!
//! Decoding maps each `(tag, id)` back to a single instance, so aliasing and cycles survive a
//! round trip. Absent values are `null`. Bytes are base64 strings and timestamps RFC 3339
//! strings.
//!
//! A *symbol table*, a named set of roots, is encoded as one JSON object within a single
//! session, so values shared between roots stay shared.
use crate::{
    error::Error,
    model::{Model, Node, NodeId, Shared, Tagged},
    registry::Registry,
};
use ahash::HashMap;
use serde_json::Value;
use std::collections::BTreeMap;

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

pub const CLASS_KEY: &str = "__class__";
pub const ID_KEY: &str = "__id__";
pub const IS_REF_KEY: &str = "__is_ref__";

/// The identities seen during one encoding or decoding session.
#[derive(Default)]
pub struct RefTable {
    // handles are kept alive so that their addresses cannot be reused within the session
    written: HashMap<NodeId, (Node, &'static str, u64)>,
    next_id: HashMap<&'static str, u64>,
    read: HashMap<(String, u64), Node>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag and id under which `node` was written, if it was.
    pub fn written(&self, node: &Node) -> Option<(&'static str, u64)> {
        self.written
            .get(&node.id())
            .map(|(_, tag, id)| (*tag, *id))
    }

    /// Assigns the next id of `tag` to `node`.
    pub fn assign(&mut self, node: &Node, tag: &'static str) -> u64 {
        let next = self.next_id.entry(tag).or_default();
        let id = *next;
        *next += 1;
        self.written.insert(node.id(), (node.clone(), tag, id));
        id
    }

    pub fn resolve(&self, tag: &str, id: u64) -> Option<Node> {
        self.read.get(&(tag.to_string(), id)).cloned()
    }

    pub fn bind(&mut self, tag: &str, id: u64, node: Node) {
        self.read.insert((tag.to_string(), id), node);
    }

    /// The number of distinct values seen so far.
    pub fn len(&self) -> usize {
        self.written.len() + self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn encode(registry: &Registry, node: &Node) -> Result<Value, Error> {
    Writer::new(registry).write(node)
}

/// Decodes a value whose root object names its own `__class__`.
pub fn decode(registry: &Registry, json: &Value) -> Result<Option<Node>, Error> {
    Reader::new(registry).read(json, None)
}

/// Decodes a value that must be a `T`; the root object may omit its `__class__`.
pub fn decode_as<T: Model + Tagged>(registry: &Registry, json: &Value) -> Result<Shared<T>, Error> {
    Reader::new(registry).read_as::<T>(json)
}

pub fn to_string(registry: &Registry, node: &Node) -> Result<String, Error> {
    Ok(serde_json::to_string(&encode(registry, node)?)?)
}

pub fn to_string_pretty(registry: &Registry, node: &Node) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(&encode(registry, node)?)?)
}

pub fn from_str(registry: &Registry, text: &str) -> Result<Option<Node>, Error> {
    decode(registry, &serde_json::from_str(text)?)
}

/// Encodes a symbol table within a single session.
pub fn encode_table(registry: &Registry, table: &BTreeMap<String, Node>) -> Result<Value, Error> {
    let mut writer = Writer::new(registry);
    let mut object = serde_json::Map::new();
    for (name, node) in table {
        object.insert(name.clone(), writer.write(node)?);
    }
    Ok(Value::Object(object))
}

/// Decodes a symbol table written by [`encode_table`]. `null` symbols are dropped.
pub fn decode_table(registry: &Registry, json: &Value) -> Result<BTreeMap<String, Node>, Error> {
    let Value::Object(object) = json else {
        return Err(Error::Malformed {
            property: "$".into(),
            reason: format!("expected a symbol table, found {json}"),
        });
    };
    let mut reader = Reader::new(registry);
    let mut table = BTreeMap::new();
    for (name, value) in object {
        if let Some(node) = reader.read_property(value, None, name)? {
            table.insert(name.clone(), node);
        }
    }
    Ok(table)
}
