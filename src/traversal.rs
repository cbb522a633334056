// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The traversal protocol.
//!
//! A [`Visitor`] receives one call per property of a value. Each call hands over a *slot*: a
//! small trait object that can read and replace the property without the visitor knowing the
//! concrete type that owns it. Every engine in this crate is a visitor; the value decides what
//! its properties are, the visitor decides what to do with them.
//!
//! Slots are implemented for the field types modeled values use:
//!
//! | property  | field type                                                     |
//! |-----------|----------------------------------------------------------------|
//! | primitive | `Option<P>` for any [`PrimitiveValue`] `P`                     |
//! | verbatim  | [`Verbatim`], a getter/setter pair over the owner              |
//! | scalar    | `Option<E>` for any [`Element`] `E`                            |
//! | array     | `Vec<E>` (no nulls) or `Vec<Option<E>>`                        |
//! | map       | `BTreeMap<String, E>` or `BTreeMap<String, Option<E>>`         |
use crate::{
    error::Error,
    model::{Element, Model, Node, Shared, Tagged},
    primitive::{Primitive, PrimitiveKind, PrimitiveValue},
};
use std::collections::BTreeMap;

/// The five kinds of property a value can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKind {
    Primitive,
    Verbatim,
    Scalar,
    Array,
    Map,
}

/// Receives the properties of a value, in order.
pub trait Visitor {
    fn begin(&mut self, tag: &'static str) -> Result<(), Error> {
        let _ = tag;
        Ok(())
    }

    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot)
    -> Result<(), Error>;

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error>;

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error>;

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error>;

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error>;

    fn end(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A value a slot refused to store.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotError {
    Mismatch {
        expected: &'static str,
        found: String,
    },
    Null,
}

impl SlotError {
    /// Attaches the name of the property the slot belongs to.
    pub fn at(self, property: &str) -> Error {
        match self {
            SlotError::Mismatch { expected, found } => Error::TypeMismatch {
                property: property.to_string(),
                expected,
                found,
            },
            SlotError::Null => Error::NullElement {
                property: property.to_string(),
            },
        }
    }
}

pub trait PrimitiveSlot {
    fn kind(&self) -> PrimitiveKind;

    fn get(&self) -> Option<Primitive>;

    fn set(&mut self, value: Option<Primitive>) -> Result<(), SlotError>;
}

impl<P: PrimitiveValue + Clone> PrimitiveSlot for Option<P> {
    fn kind(&self) -> PrimitiveKind {
        P::KIND
    }

    fn get(&self) -> Option<Primitive> {
        self.clone().map(P::into_primitive)
    }

    fn set(&mut self, value: Option<Primitive>) -> Result<(), SlotError> {
        *self = match value {
            None => None,
            Some(value) => {
                let found = value.kind();
                Some(P::from_primitive(value).ok_or_else(|| SlotError::Mismatch {
                    expected: kind_name(P::KIND),
                    found: kind_name(found).to_string(),
                })?)
            }
        };
        Ok(())
    }
}

fn kind_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::Int => "int",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Text => "text",
        PrimitiveKind::Bytes => "bytes",
        PrimitiveKind::Timestamp => "timestamp",
    }
}

/// A property whose representation the owner computes itself.
///
/// It is encoded and compared as one atomic primitive under the first of its names, and covers
/// all of its names for discovery.
pub trait VerbatimSlot {
    fn names(&self) -> &'static [&'static str];

    fn kind(&self) -> PrimitiveKind;

    fn get(&self) -> Option<Primitive>;

    fn set(&mut self, value: Option<Primitive>) -> Result<(), Error>;

    fn name(&self) -> &'static str {
        self.names().first().copied().unwrap_or_default()
    }
}

/// A [`VerbatimSlot`] over a getter and a setter of the owning value.
///
/// ```rust
/// use elevated::{Error, Model, Primitive, PrimitiveKind, Tagged, Verbatim, Visitor};
///
/// #[derive(Debug, Default)]
/// struct Span {
///     start: i64,
///     end: i64,
/// }
///
/// fn get(span: &Span) -> Option<Primitive> {
///     Some(format!("{}..{}", span.start, span.end).into())
/// }
///
/// fn set(span: &mut Span, value: Option<Primitive>) -> Result<(), Error> {
///     let text = value.map(|v| v.to_string()).unwrap_or_else(|| "0..0".into());
///     let (start, end) = text.split_once("..").ok_or_else(|| Error::Malformed {
///         property: "start".into(),
///         reason: format!("{text} is not a range"),
///     })?;
///     let parse = |s: &str| s.parse::<i64>().map_err(|_| Error::Malformed {
///         property: "start".into(),
///         reason: format!("{s} is not an integer"),
///     });
///     span.start = parse(start)?;
///     span.end = parse(end)?;
///     Ok(())
/// }
///
/// impl Tagged for Span {
///     const TAG: &'static str = "Span";
/// }
///
/// impl Model for Span {
///     fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
///         visitor.begin(Self::TAG)?;
///         visitor.verbatim(&mut Verbatim::new(self, &["start", "end"], PrimitiveKind::Text, get, set))?;
///         visitor.end()
///     }
/// }
/// ```
pub struct Verbatim<'a, T> {
    owner: &'a mut T,
    names: &'static [&'static str],
    kind: PrimitiveKind,
    get: fn(&T) -> Option<Primitive>,
    set: fn(&mut T, Option<Primitive>) -> Result<(), Error>,
}

impl<'a, T> Verbatim<'a, T> {
    pub fn new(
        owner: &'a mut T,
        names: &'static [&'static str],
        kind: PrimitiveKind,
        get: fn(&T) -> Option<Primitive>,
        set: fn(&mut T, Option<Primitive>) -> Result<(), Error>,
    ) -> Self {
        debug_assert!(!names.is_empty(), "a verbatim property needs a name");
        Self {
            owner,
            names,
            kind,
            get,
            set,
        }
    }
}

impl<T> VerbatimSlot for Verbatim<'_, T> {
    fn names(&self) -> &'static [&'static str] {
        self.names
    }

    fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    fn get(&self) -> Option<Primitive> {
        (self.get)(&*self.owner)
    }

    fn set(&mut self, value: Option<Primitive>) -> Result<(), Error> {
        if let Some(found) = value.as_ref().map(Primitive::kind) {
            if found != self.kind {
                return Err(SlotError::Mismatch {
                    expected: kind_name(self.kind),
                    found: kind_name(found).to_string(),
                }
                .at(self.name()));
            }
        }
        (self.set)(&mut *self.owner, value)
    }
}

/// An entry of a nested collection: either an [`Element`] or an optional one.
pub trait Entry: Sized {
    const NULLABLE: bool;

    fn default_tag() -> Option<&'static str>;

    fn to_node(&self) -> Option<Node>;

    fn from_node(node: Option<Node>) -> Result<Self, SlotError>;
}

impl Entry for Node {
    const NULLABLE: bool = false;

    fn default_tag() -> Option<&'static str> {
        None
    }

    fn to_node(&self) -> Option<Node> {
        Some(self.clone())
    }

    fn from_node(node: Option<Node>) -> Result<Self, SlotError> {
        node.ok_or(SlotError::Null)
    }
}

impl<T: Model + Tagged> Entry for Shared<T> {
    const NULLABLE: bool = false;

    fn default_tag() -> Option<&'static str> {
        Some(T::TAG)
    }

    fn to_node(&self) -> Option<Node> {
        Some(self.node().clone())
    }

    fn from_node(node: Option<Node>) -> Result<Self, SlotError> {
        <Self as Element>::from_node(node.ok_or(SlotError::Null)?)
    }
}

impl<E: Element> Entry for Option<E> {
    const NULLABLE: bool = true;

    fn default_tag() -> Option<&'static str> {
        E::default_tag()
    }

    fn to_node(&self) -> Option<Node> {
        self.as_ref().map(|e| e.as_node().clone())
    }

    fn from_node(node: Option<Node>) -> Result<Self, SlotError> {
        node.map(E::from_node).transpose()
    }
}

pub trait ScalarSlot {
    fn default_tag(&self) -> Option<&'static str>;

    fn get(&self) -> Option<Node>;

    fn set(&mut self, value: Option<Node>) -> Result<(), SlotError>;
}

impl<E: Element> ScalarSlot for Option<E> {
    fn default_tag(&self) -> Option<&'static str> {
        E::default_tag()
    }

    fn get(&self) -> Option<Node> {
        self.to_node()
    }

    fn set(&mut self, value: Option<Node>) -> Result<(), SlotError> {
        *self = <Self as Entry>::from_node(value)?;
        Ok(())
    }
}

pub trait ArraySlot {
    fn default_tag(&self) -> Option<&'static str>;

    /// Whether the array may hold `null` elements.
    fn nullable(&self) -> bool;

    fn get(&self) -> Vec<Option<Node>>;

    /// Replaces the whole array; on error the array is left unchanged.
    fn set(&mut self, items: Vec<Option<Node>>) -> Result<(), SlotError>;
}

impl<X: Entry> ArraySlot for Vec<X> {
    fn default_tag(&self) -> Option<&'static str> {
        X::default_tag()
    }

    fn nullable(&self) -> bool {
        X::NULLABLE
    }

    fn get(&self) -> Vec<Option<Node>> {
        self.iter().map(X::to_node).collect()
    }

    fn set(&mut self, items: Vec<Option<Node>>) -> Result<(), SlotError> {
        *self = items
            .into_iter()
            .map(X::from_node)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

pub trait MapSlot {
    fn default_tag(&self) -> Option<&'static str>;

    /// Whether the map may hold `null` values.
    fn nullable(&self) -> bool;

    fn get(&self) -> BTreeMap<String, Option<Node>>;

    /// Replaces the whole map; on error the map is left unchanged.
    fn set(&mut self, entries: BTreeMap<String, Option<Node>>) -> Result<(), SlotError>;
}

impl<X: Entry> MapSlot for BTreeMap<String, X> {
    fn default_tag(&self) -> Option<&'static str> {
        X::default_tag()
    }

    fn nullable(&self) -> bool {
        X::NULLABLE
    }

    fn get(&self) -> BTreeMap<String, Option<Node>> {
        self.iter().map(|(k, v)| (k.clone(), v.to_node())).collect()
    }

    fn set(&mut self, entries: BTreeMap<String, Option<Node>>) -> Result<(), SlotError> {
        *self = entries
            .into_iter()
            .map(|(k, v)| Ok((k, X::from_node(v)?)))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

/// A snapshot of one property, as reported by a traversal.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Primitive(Option<Primitive>),
    Verbatim(Option<Primitive>),
    Scalar(Option<Node>),
    Array(Vec<Option<Node>>),
    Map(BTreeMap<String, Option<Node>>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Primitive(_) => PropertyKind::Primitive,
            PropertyValue::Verbatim(_) => PropertyKind::Verbatim,
            PropertyValue::Scalar(_) => PropertyKind::Scalar,
            PropertyValue::Array(_) => PropertyKind::Array,
            PropertyValue::Map(_) => PropertyKind::Map,
        }
    }
}

/// The full traversal record of a value.
///
/// Nested values are recorded as cloned handles, so holding a record does not keep the value
/// borrowed.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub tag: &'static str,
    pub properties: Vec<(&'static str, PropertyValue)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }
}

#[derive(Default)]
struct Recorder(Record);

impl Visitor for Recorder {
    fn begin(&mut self, tag: &'static str) -> Result<(), Error> {
        self.0.tag = tag;
        Ok(())
    }

    fn primitive(&mut self, name: &'static str, slot: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        self.0
            .properties
            .push((name, PropertyValue::Primitive(slot.get())));
        Ok(())
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        self.0
            .properties
            .push((slot.name(), PropertyValue::Verbatim(slot.get())));
        Ok(())
    }

    fn scalar(&mut self, name: &'static str, slot: &mut dyn ScalarSlot) -> Result<(), Error> {
        self.0.properties.push((name, PropertyValue::Scalar(slot.get())));
        Ok(())
    }

    fn array(&mut self, name: &'static str, slot: &mut dyn ArraySlot) -> Result<(), Error> {
        self.0.properties.push((name, PropertyValue::Array(slot.get())));
        Ok(())
    }

    fn map(&mut self, name: &'static str, slot: &mut dyn MapSlot) -> Result<(), Error> {
        self.0.properties.push((name, PropertyValue::Map(slot.get())));
        Ok(())
    }
}

/// Records every property of `node`.
pub fn record(node: &Node) -> Result<Record, Error> {
    let mut recorder = Recorder::default();
    node.traverse(&mut recorder)?;
    Ok(recorder.0)
}

#[derive(Default)]
struct Collector(Vec<(&'static str, PropertyKind)>);

impl Visitor for Collector {
    fn primitive(&mut self, name: &'static str, _: &mut dyn PrimitiveSlot) -> Result<(), Error> {
        self.0.push((name, PropertyKind::Primitive));
        Ok(())
    }

    fn verbatim(&mut self, slot: &mut dyn VerbatimSlot) -> Result<(), Error> {
        self.0
            .extend(slot.names().iter().map(|name| (*name, PropertyKind::Verbatim)));
        Ok(())
    }

    fn scalar(&mut self, name: &'static str, _: &mut dyn ScalarSlot) -> Result<(), Error> {
        self.0.push((name, PropertyKind::Scalar));
        Ok(())
    }

    fn array(&mut self, name: &'static str, _: &mut dyn ArraySlot) -> Result<(), Error> {
        self.0.push((name, PropertyKind::Array));
        Ok(())
    }

    fn map(&mut self, name: &'static str, _: &mut dyn MapSlot) -> Result<(), Error> {
        self.0.push((name, PropertyKind::Map));
        Ok(())
    }
}

/// Lists the names of all properties of `node`, with their kinds.
///
/// A verbatim property contributes every name it covers.
pub fn collect_properties(node: &Node) -> Result<Vec<(&'static str, PropertyKind)>, Error> {
    let mut collector = Collector::default();
    node.traverse(&mut collector)?;
    Ok(collector.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{Holder, Leaf, Pair, Temperature};

    #[test]
    fn collector_reports_properties_in_order() {
        let node = Node::new(Holder::default());
        assert_eq!(
            collect_properties(&node).unwrap(),
            vec![
                ("label", PropertyKind::Primitive),
                ("celsius", PropertyKind::Verbatim),
                ("fahrenheit", PropertyKind::Verbatim),
                ("leaf", PropertyKind::Scalar),
                ("leaves", PropertyKind::Array),
                ("sparse", PropertyKind::Array),
                ("named", PropertyKind::Map),
            ]
        );
    }

    #[test]
    fn record_is_stable_without_mutation() {
        let leaf = Shared::new(Leaf::new(3));
        let node = Node::new(Holder {
            label: Some("x".into()),
            leaf: Some(leaf.clone()),
            leaves: vec![leaf.clone(), leaf],
            ..Default::default()
        });
        let first = record(&node).unwrap();
        let second = record(&node).unwrap();
        assert_eq!(first.tag, "Holder");
        let names = |r: &Record| r.properties.iter().map(|(n, v)| (*n, v.kind())).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
        match first.get("leaves") {
            Some(PropertyValue::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert!(items[0].as_ref().unwrap().ptr_eq(items[1].as_ref().unwrap()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn primitive_slot_rejects_other_kinds() {
        let mut slot: Option<i64> = None;
        PrimitiveSlot::set(&mut slot, Some(Primitive::Int(4))).unwrap();
        assert_eq!(slot, Some(4));
        let err = PrimitiveSlot::set(&mut slot, Some(Primitive::Bool(true))).unwrap_err();
        assert_eq!(err.at("count").to_string(), "count expects int, found bool");
        assert_eq!(slot, Some(4));
    }

    #[test]
    fn null_free_arrays_reject_nulls() {
        let mut items: Vec<Shared<Leaf>> = Vec::new();
        let err = ArraySlot::set(&mut items, vec![Some(Node::new(Leaf::new(1))), None]).unwrap_err();
        assert_eq!(err, SlotError::Null);
        assert!(items.is_empty());
        assert!(!ArraySlot::nullable(&items));

        let mut sparse: Vec<Option<Shared<Leaf>>> = Vec::new();
        ArraySlot::set(&mut sparse, vec![None, Some(Node::new(Leaf::new(1)))]).unwrap();
        assert_eq!(sparse.len(), 2);
        assert!(sparse[0].is_none());
    }

    #[test]
    fn typed_slots_reject_foreign_types() {
        let mut leaf: Option<Shared<Leaf>> = None;
        let err = ScalarSlot::set(&mut leaf, Some(Node::new(Pair::default()))).unwrap_err();
        assert!(matches!(err, SlotError::Mismatch { .. }));

        let mut any: Option<Node> = None;
        ScalarSlot::set(&mut any, Some(Node::new(Pair::default()))).unwrap();
        assert!(any.is_some());
    }

    #[test]
    fn verbatim_reads_and_writes_through_the_owner() {
        let mut temperature = Temperature { celsius: 21.5 };
        let mut slot = temperature.slot();
        assert_eq!(slot.name(), "celsius");
        assert_eq!(slot.get(), Some(Primitive::Float(21.5)));
        slot.set(Some(Primitive::Float(-4.0))).unwrap();
        assert!(slot.set(Some(Primitive::Int(2))).is_err());
        assert_eq!(temperature.celsius, -4.0);
    }
}
