// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Elevated: Reference-Preserving Object Graphs
//!
//! This crate provides a small engine for graphs of typed values that may share instances and
//! contain cycles. On top of a single traversal protocol it offers:
//!
//! - a [`Writer`] and [`Reader`] for a JSON encoding that keeps shared instances shared: the
//!   first occurrence of a value carries its body, every later occurrence is a reference stub;
//! - a [`Comparator`], a deterministic total order over values;
//! - an [`Initializer`] that clones values copy-on-write and merges several values into one;
//! - a [`Mutator`] that derives a random, observably different variant of a value, for fuzzing
//!   and property tests.
//!
//! ## Core Concepts
//!
//! A modeled type implements [`Model`], whose only method visits each property of the value in
//! a fixed order, and [`Tagged`], which names the type in the encoding. Properties come in five
//! kinds:
//!
//! - **primitive**: an optional [`Primitive`] such as an integer, text or [`Timestamp`];
//! - **verbatim**: a primitive computed from the owner by a getter and setter, see [`Verbatim`];
//! - **scalar**: an optional nested value;
//! - **array**: a list of nested values;
//! - **map**: nested values keyed by strings.
//!
//! Nested values are held through [`Shared<T>`] (or the type-erased [`Node`]). Cloning a handle
//! shares the instance; identity is the handle's allocation. Every engine is a [`Visitor`] and
//! never needs to know the concrete types involved, only the [`Registry`] that maps type tags
//! to allocators.
//!
//! ## Getting Started
//!
//! ```rust
//! use elevated::{Error, Model, Reader, Registry, Shared, Tagged, Visitor, Writer};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: Option<String>,
//!     friend: Option<Shared<Person>>,
//! }
//!
//! impl Tagged for Person {
//!     const TAG: &'static str = "Person";
//! }
//!
//! impl Model for Person {
//!     fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
//!         visitor.begin(Self::TAG)?;
//!         visitor.primitive("name", &mut self.name)?;
//!         visitor.scalar("friend", &mut self.friend)?;
//!         visitor.end()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_type::<Person>()?;
//!
//! // two people who are each other's friend
//! let alice = Shared::new(Person { name: Some("Alice".into()), friend: None });
//! let bob = Shared::new(Person { name: Some("Bob".into()), friend: Some(alice.clone()) });
//! alice.borrow_mut().friend = Some(bob.clone());
//!
//! let json = Writer::new(&registry).write(alice.node())?;
//! assert_eq!(json["friend"]["friend"]["__is_ref__"], true);
//!
//! let copy = Reader::new(&registry).read_as::<Person>(&json)?;
//! let friend = copy.borrow().friend.clone().unwrap();
//! assert!(friend.borrow().friend.as_ref().unwrap().ptr_eq(&copy));
//! # for person in [alice, bob, copy, friend] { person.borrow_mut().friend = None; }
//! # Ok::<(), Error>(())
//! ```
//!
//! The [`model!`] macro writes the [`Model`] and [`Tagged`] impls for types without verbatim
//! properties, and [`registry!`] builds a registry from a list of types.
//!
//! ## Scope of this Crate
//!
//! Values are single-threaded (`Rc`/`RefCell`). Handles form reference cycles when the graph
//! does; the caller is responsible for breaking them when a cyclic graph is no longer needed.
//!
//! ## Features
//!
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for [`Primitive`] and [`Timestamp`].
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod codec;
pub use codec::{Reader, RefTable, Writer};
pub mod comparison;
pub use comparison::{Comparator, compare};
mod error;
pub use error::Error;
pub mod initializer;
pub use initializer::{Initializer, clone_node, merge};
/// Macros for declaring modeled types and registries.
pub mod macros;
mod model;
pub use model::{AsAny, Element, Model, Node, NodeId, Shared, Tagged};
pub mod mutation;
pub use mutation::{ArrayWeights, MapWeights, Mutator, MutatorConfig, ScalarWeights};
mod primitive;
pub use primitive::{Primitive, PrimitiveKind, PrimitiveValue};
mod registry;
pub use registry::{Allocator, Registry};
mod timestamp;
pub use timestamp::{Timestamp, TimestampError};
pub mod traversal;
pub use traversal::{
    ArraySlot, Entry, MapSlot, PrimitiveSlot, PropertyKind, ScalarSlot, SlotError, Verbatim,
    VerbatimSlot, Visitor,
};

#[cfg(test)]
mod test_util;
