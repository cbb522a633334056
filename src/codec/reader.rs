// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{CLASS_KEY, ID_KEY, IS_REF_KEY, RefTable};
use crate::{
    error::Error,
    model::{Model, Node, Shared, Tagged},
    primitive::{Primitive, PrimitiveKind},
    registry::Registry,
    traversal::{ArraySlot, MapSlot, PrimitiveSlot, ScalarSlot, VerbatimSlot, Visitor},
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Decodes JSON produced by a [`Writer`](super::Writer), restoring shared instances.
///
/// A lenient reader (the default) leaves properties without a key at their allocated default;
/// a strict reader rejects them.
pub struct Reader<'r> {
    registry: &'r Registry,
    table: RefTable,
    strict: bool,
}

impl<'r> Reader<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            table: RefTable::new(),
            strict: false,
        }
    }

    pub fn strict(registry: &'r Registry) -> Self {
        Self {
            strict: true,
            ..Self::new(registry)
        }
    }

    /// Reads one value.
    ///
    /// `default_tag` is used when the object carries no `__class__`. Returns `None` for `null`.
    pub fn read(&mut self, json: &Value, default_tag: Option<&str>) -> Result<Option<Node>, Error> {
        self.read_property(json, default_tag, "$")
    }

    pub fn read_as<T: Model + Tagged>(&mut self, json: &Value) -> Result<Shared<T>, Error> {
        let node = self.read(json, Some(T::TAG))?.ok_or_else(|| Error::Malformed {
            property: "$".into(),
            reason: format!("expected {}, found null", T::TAG),
        })?;
        node.downcast().map_err(|node| Error::TypeMismatch {
            property: "$".into(),
            expected: T::TAG,
            found: node.type_name().to_string(),
        })
    }

    /// The identities read so far.
    pub fn table(&self) -> &RefTable {
        &self.table
    }

    pub(crate) fn read_property(
        &mut self,
        json: &Value,
        default_tag: Option<&str>,
        property: &str,
    ) -> Result<Option<Node>, Error> {
        match json {
            Value::Null => Ok(None),
            Value::Object(object) => self.read_object(object, default_tag, property).map(Some),
            other => Err(Error::Malformed {
                property: property.to_string(),
                reason: format!("expected an object, found {other}"),
            }),
        }
    }

    fn read_object(
        &mut self,
        object: &Map<String, Value>,
        default_tag: Option<&str>,
        property: &str,
    ) -> Result<Node, Error> {
        let malformed = |reason: String| Error::Malformed {
            property: property.to_string(),
            reason,
        };

        let tag = match object.get(CLASS_KEY) {
            Some(Value::String(tag)) => tag.as_str(),
            None | Some(Value::Null) => default_tag.ok_or_else(|| Error::MissingTypeTag {
                property: property.to_string(),
            })?,
            Some(other) => return Err(malformed(format!("{CLASS_KEY} must be a string, found {other}"))),
        };
        let id = match object.get(ID_KEY) {
            None | Some(Value::Null) => None,
            Some(id) => Some(
                id.as_u64()
                    .ok_or_else(|| malformed(format!("{ID_KEY} must be an unsigned integer, found {id}")))?,
            ),
        };
        let is_ref = match object.get(IS_REF_KEY) {
            None | Some(Value::Null) => false,
            Some(is_ref) => is_ref
                .as_bool()
                .ok_or_else(|| malformed(format!("{IS_REF_KEY} must be a boolean, found {is_ref}")))?,
        };

        if let Some(id) = id {
            if let Some(node) = self.table.resolve(tag, id) {
                trace!(tag, id, "resolved reference");
                return Ok(node);
            }
        }
        if is_ref {
            return match id {
                Some(id) => Err(Error::UnresolvedReference {
                    tag: tag.to_string(),
                    id,
                }),
                None => Err(malformed(format!("reference without {ID_KEY}"))),
            };
        }

        let node = self.registry.allocate(tag)?;
        // bound before the body is read so that the body can refer back to it
        if let Some(id) = id {
            self.table.bind(tag, id, node.clone());
        }
        node.traverse(&mut ObjectReader {
            reader: self,
            object,
            tag,
        })?;
        Ok(node)
    }
}

struct ObjectReader<'a, 'r> {
    reader: &'a mut Reader<'r>,
    object: &'a Map<String, Value>,
    tag: &'a str,
}

impl<'a> ObjectReader<'a, '_> {
    /// The JSON value of a property, or `None` if it should keep its default.
    fn value(&self, name: &str) -> Result<Option<&'a Value>, Error> {
        match self.object.get(name) {
            Some(value) => Ok(Some(value)),
            None if self.reader.strict => Err(Error::MissingProperty {
                tag: self.tag.to_string(),
                property: name.to_string(),
            }),
            None => Ok(None),
        }
    }
}

fn primitive_from_json(
    kind: PrimitiveKind,
    name: &str,
    value: &Value,
) -> Result<Option<Primitive>, Error> {
    if value.is_null() {
        return Ok(None);
    }
    kind.from_json(value)
        .map(Some)
        .map_err(|err| Error::Malformed {
            property: name.to_string(),
            reason: err.to_string(),
        })
}

impl Visitor for ObjectReader<'_, '_> {
    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        if let Some(value) = self.value(name)? {
            let value = primitive_from_json(slot.kind(), name, value)?;
            slot.set(value).map_err(|err| err.at(name))?;
        }
        Ok(())
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        let name = slot.name();
        if let Some(value) = self.value(name)? {
            let value = primitive_from_json(slot.kind(), name, value)?;
            slot.set(value)?;
        }
        Ok(())
    }

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error> {
        if let Some(value) = self.value(name)? {
            let node = self.reader.read_property(value, slot.default_tag(), name)?;
            slot.set(node).map_err(|err| err.at(name))?;
        }
        Ok(())
    }

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error> {
        let items = match self.value(name)? {
            None => return Ok(()),
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let default_tag = slot.default_tag();
                items
                    .iter()
                    .map(|item| self.reader.read_property(item, default_tag, name))
                    .collect::<Result<_, _>>()?
            }
            Some(other) => {
                return Err(Error::Malformed {
                    property: name.to_string(),
                    reason: format!("expected an array, found {other}"),
                });
            }
        };
        slot.set(items).map_err(|err| err.at(name))
    }

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error> {
        let entries = match self.value(name)? {
            None => return Ok(()),
            Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(entries)) => {
                let default_tag = slot.default_tag();
                entries
                    .iter()
                    .map(|(key, value)| {
                        Ok((key.clone(), self.reader.read_property(value, default_tag, name)?))
                    })
                    .collect::<Result<_, Error>>()?
            }
            Some(other) => {
                return Err(Error::Malformed {
                    property: name.to_string(),
                    reason: format!("expected an object, found {other}"),
                });
            }
        };
        slot.set(entries).map_err(|err| err.at(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{self, Bag, Holder, Leaf, Pair};
    use serde_json::json;

    #[test]
    fn untagged_objects_use_the_slot_default() {
        let registry = test_util::registry();
        let holder = Reader::new(&registry)
            .read_as::<Holder>(&json!({ "leaves": [{ "value": 3 }, { "value": 4 }] }))
            .unwrap();
        let values: Vec<_> = holder
            .borrow()
            .leaves
            .iter()
            .map(|leaf| leaf.borrow().value)
            .collect();
        assert_eq!(values, vec![Some(3), Some(4)]);
    }

    #[test]
    fn untyped_slots_need_a_tag() {
        let registry = test_util::registry();
        let err = Reader::new(&registry)
            .read_as::<Bag>(&json!({ "anything": { "value": 3 } }))
            .unwrap_err();
        assert_eq!(
            err,
            Error::MissingTypeTag {
                property: "anything".into()
            }
        );
    }

    #[test]
    fn strict_readers_require_every_property() {
        let registry = test_util::registry();
        let json = json!({ "__class__": "Pair", "name": "p", "left": null });
        assert!(Reader::new(&registry).read(&json, None).is_ok());
        assert_eq!(
            Reader::strict(&registry).read(&json, None).unwrap_err(),
            Error::MissingProperty {
                tag: "Pair".into(),
                property: "right".into()
            }
        );
    }

    #[test]
    fn dangling_references_are_rejected() {
        let registry = test_util::registry();
        let json = json!({ "__class__": "Leaf", "__id__": 4, "__is_ref__": true });
        assert_eq!(
            Reader::new(&registry).read(&json, None).unwrap_err(),
            Error::UnresolvedReference {
                tag: "Leaf".into(),
                id: 4
            }
        );
    }

    #[test]
    fn ids_are_scoped_by_tag() {
        let registry = test_util::registry();
        let json = json!({
            "__class__": "Bag", "__id__": 0,
            "items": [
                { "__class__": "Leaf", "__id__": 0, "value": 1 },
                { "__class__": "Pair", "__id__": 0, "name": "p" },
                { "__class__": "Leaf", "__id__": 0, "__is_ref__": true },
            ]
        });
        let bag = Reader::new(&registry).read_as::<Bag>(&json).unwrap();
        let items = bag.borrow().items.clone();
        assert!(items[0].is::<Leaf>());
        assert!(items[1].is::<Pair>());
        assert!(items[0].ptr_eq(&items[2]));
    }

    #[test]
    fn malformed_input_is_reported() {
        let registry = test_util::registry();
        let mut reader = Reader::new(&registry);
        assert!(matches!(
            reader.read(&json!({ "__class__": "Leaf", "value": "three" }), None),
            Err(Error::Malformed { property, .. }) if property == "value"
        ));
        assert!(matches!(
            reader.read(&json!({ "__class__": "Holder", "leaves": [null] }), None),
            Err(Error::NullElement { property }) if property == "leaves"
        ));
        assert!(matches!(
            reader.read(&json!({ "__class__": "Holder", "leaf": { "__class__": "Pair" } }), None),
            Err(Error::TypeMismatch { property, .. }) if property == "leaf"
        ));
        assert!(matches!(
            reader.read(&json!({ "__class__": "Nope" }), None),
            Err(Error::UnknownTag(tag)) if tag == "Nope"
        ));
        assert!(matches!(
            reader.read(&json!([1, 2]), None),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn nulls_survive_in_nullable_arrays() {
        let registry = test_util::registry();
        let holder = Reader::new(&registry)
            .read_as::<Holder>(&json!({ "sparse": [null, { "value": 1 }, null] }))
            .unwrap();
        let sparse: Vec<_> = holder.borrow().sparse.iter().map(Option::is_some).collect();
        assert_eq!(sparse, vec![false, true, false]);
    }
}
