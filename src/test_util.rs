// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Small modeled types covering every property kind, shared by the unit tests.
use crate::{
    Error, Model, Node, Primitive, PrimitiveKind, Registry, Shared, Tagged, Verbatim, Visitor,
};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub(crate) fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_type::<Leaf>().unwrap();
    registry.register_type::<Pair>().unwrap();
    registry.register_type::<Holder>().unwrap();
    registry.register_type::<Keyed>().unwrap();
    registry.register_type::<Bag>().unwrap();
    registry.register_type::<Empty>().unwrap();
    registry
}

#[derive(Debug, Default)]
pub(crate) struct Leaf {
    pub value: Option<i64>,
}

impl Leaf {
    pub fn new(value: i64) -> Self {
        Self { value: Some(value) }
    }
}

impl Tagged for Leaf {
    const TAG: &'static str = "Leaf";
}

impl Model for Leaf {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.primitive("value", &mut self.value)?;
        visitor.end()
    }
}

/// A node of a binary tree, which may well be a cyclic graph.
#[derive(Debug, Default)]
pub(crate) struct Pair {
    pub name: Option<String>,
    pub left: Option<Shared<Pair>>,
    pub right: Option<Shared<Pair>>,
}

impl Pair {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

impl Tagged for Pair {
    const TAG: &'static str = "Pair";
}

impl Model for Pair {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.primitive("name", &mut self.name)?;
        visitor.scalar("left", &mut self.left)?;
        visitor.scalar("right", &mut self.right)?;
        visitor.end()
    }
}

/// A temperature readable in two units, stored once.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Temperature {
    pub celsius: f64,
}

impl Temperature {
    pub fn slot(&mut self) -> Verbatim<'_, Temperature> {
        Verbatim::new(
            self,
            &["celsius", "fahrenheit"],
            PrimitiveKind::Float,
            |t| Some(Primitive::Float(t.celsius)),
            |t, value| {
                t.celsius = match value {
                    Some(Primitive::Float(celsius)) => celsius,
                    _ => 0.0,
                };
                Ok(())
            },
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Holder {
    pub label: Option<String>,
    pub temperature: Temperature,
    pub leaf: Option<Shared<Leaf>>,
    pub leaves: Vec<Shared<Leaf>>,
    pub sparse: Vec<Option<Shared<Leaf>>>,
    pub named: BTreeMap<String, Shared<Leaf>>,
}

impl Tagged for Holder {
    const TAG: &'static str = "Holder";
}

impl Model for Holder {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.primitive("label", &mut self.label)?;
        visitor.verbatim(&mut self.temperature.slot())?;
        visitor.scalar("leaf", &mut self.leaf)?;
        visitor.array("leaves", &mut self.leaves)?;
        visitor.array("sparse", &mut self.sparse)?;
        visitor.map("named", &mut self.named)?;
        visitor.end()
    }
}

/// A value with a stable identity of its own.
#[derive(Debug, Default)]
pub(crate) struct Keyed {
    pub key: Option<i64>,
    pub payload: Option<String>,
}

impl Tagged for Keyed {
    const TAG: &'static str = "Keyed";
}

impl Model for Keyed {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.primitive("key", &mut self.key)?;
        visitor.primitive("payload", &mut self.payload)?;
        visitor.end()
    }

    fn global_id(&self) -> Option<Primitive> {
        self.key.map(Primitive::Int)
    }
}

/// Untyped nested properties, which accept any registered type.
#[derive(Debug, Default)]
pub(crate) struct Bag {
    pub anything: Option<Node>,
    pub items: Vec<Node>,
    pub table: BTreeMap<String, Option<Node>>,
}

impl Tagged for Bag {
    const TAG: &'static str = "Bag";
}

impl Model for Bag {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.scalar("anything", &mut self.anything)?;
        visitor.array("items", &mut self.items)?;
        visitor.map("table", &mut self.table)?;
        visitor.end()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Empty;

impl Tagged for Empty {
    const TAG: &'static str = "Empty";
}

impl Model for Empty {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        visitor.begin(Self::TAG)?;
        visitor.end()
    }
}
