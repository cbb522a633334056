// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{CLASS_KEY, ID_KEY, IS_REF_KEY, RefTable};
use crate::{
    error::Error,
    model::Node,
    registry::Registry,
    traversal::{ArraySlot, MapSlot, PrimitiveSlot, ScalarSlot, VerbatimSlot, Visitor},
};
use serde_json::{Map, Value};
use tracing::trace;

/// Encodes values into JSON, writing each distinct instance once per session.
pub struct Writer<'r> {
    registry: &'r Registry,
    table: RefTable,
}

impl<'r> Writer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            table: RefTable::new(),
        }
    }

    /// Writes `node`, or only a reference to it if it was written earlier in this session.
    ///
    /// The identity check happens before the value is borrowed, so a value that (indirectly)
    /// contains itself is written as a reference while its own body is still being written.
    pub fn write(&mut self, node: &Node) -> Result<Value, Error> {
        if let Some((tag, id)) = self.table.written(node) {
            trace!(tag, id, "writing reference");
            return Ok(header(tag, id, true).into());
        }

        let tag = self.registry.tag_of_node(node)?;
        let id = self.table.assign(node, tag);
        let mut object = header(tag, id, false);
        node.traverse(&mut ObjectWriter {
            writer: self,
            object: &mut object,
        })?;
        Ok(Value::Object(object))
    }

    pub fn write_optional(&mut self, node: Option<&Node>) -> Result<Value, Error> {
        node.map_or(Ok(Value::Null), |node| self.write(node))
    }

    /// The identities written so far.
    pub fn table(&self) -> &RefTable {
        &self.table
    }
}

fn header(tag: &str, id: u64, is_ref: bool) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(CLASS_KEY.into(), tag.into());
    object.insert(ID_KEY.into(), id.into());
    object.insert(IS_REF_KEY.into(), is_ref.into());
    object
}

struct ObjectWriter<'w, 'r> {
    writer: &'w mut Writer<'r>,
    object: &'w mut Map<String, Value>,
}

impl Visitor for ObjectWriter<'_, '_> {
    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        let value = slot.get().map_or(Value::Null, |value| value.to_json());
        self.object.insert(name.into(), value);
        Ok(())
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        let value = slot.get().map_or(Value::Null, |value| value.to_json());
        self.object.insert(slot.name().into(), value);
        Ok(())
    }

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error> {
        let value = self.writer.write_optional(slot.get().as_ref())?;
        self.object.insert(name.into(), value);
        Ok(())
    }

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error> {
        let items = slot
            .get()
            .iter()
            .map(|item| self.writer.write_optional(item.as_ref()))
            .collect::<Result<_, _>>()?;
        self.object.insert(name.into(), Value::Array(items));
        Ok(())
    }

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error> {
        let entries = slot
            .get()
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.writer.write_optional(value.as_ref())?)))
            .collect::<Result<_, Error>>()?;
        self.object.insert(name.into(), Value::Object(entries));
        Ok(())
    }
}
