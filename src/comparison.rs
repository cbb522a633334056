// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! A deterministic total order over modeled values.
//!
//! Values of different types are ordered by their type tags. Values of the same type are
//! compared property by property in traversal order, stopping at the first difference:
//!
//! - an absent value orders before a present one;
//! - primitives and verbatims use their natural order;
//! - nested values that both carry a [global id](crate::Model::global_id) are ordered by it
//!   alone; a value without one orders before a value with one; otherwise they are compared
//!   structurally;
//! - arrays are ordered by length, then element by element;
//! - maps are ordered by their sorted keys, then by their values key by key.
//!
//! A pair of values that is reached again while it is still being compared (which only happens
//! in cyclic graphs) is taken to be equal at that point; the rest of the traversal decides.
use crate::{
    error::Error,
    model::{Node, NodeId},
    registry::Registry,
    traversal::{self, PropertyValue, Record},
};
use std::{cmp::Ordering, collections::BTreeMap};
use tracing::trace;

/// Compares two values.
pub fn compare(registry: &Registry, a: &Node, b: &Node) -> Result<Ordering, Error> {
    Comparator::new(registry).compare(a, b)
}

/// Compares two optional values, ordering `None` first.
pub fn compare_optional(
    registry: &Registry,
    a: Option<&Node>,
    b: Option<&Node>,
) -> Result<Ordering, Error> {
    Comparator::new(registry).compare_optional(a, b)
}

pub struct Comparator<'r> {
    registry: &'r Registry,
    in_progress: Vec<(NodeId, NodeId)>,
}

impl<'r> Comparator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            in_progress: Vec::new(),
        }
    }

    pub fn compare(&mut self, a: &Node, b: &Node) -> Result<Ordering, Error> {
        if a.ptr_eq(b) {
            return Ok(Ordering::Equal);
        }
        let (tag_a, tag_b) = (
            self.registry.tag_of_node(a)?,
            self.registry.tag_of_node(b)?,
        );
        if tag_a != tag_b {
            return Ok(tag_a.cmp(tag_b));
        }

        let pair = (a.id(), b.id());
        if self.in_progress.contains(&pair) {
            trace!(tag = tag_a, "pair already under comparison");
            return Ok(Ordering::Equal);
        }
        self.in_progress.push(pair);
        let result = traversal::record(a)
            .and_then(|ra| Ok((ra, traversal::record(b)?)))
            .and_then(|(ra, rb)| self.compare_records(&ra, &rb));
        self.in_progress.pop();
        result
    }

    pub fn compare_optional(
        &mut self,
        a: Option<&Node>,
        b: Option<&Node>,
    ) -> Result<Ordering, Error> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(a), Some(b)) => self.compare_nested(a, b),
        }
    }

    /// Compares two nested values, taking their global ids into account.
    fn compare_nested(&mut self, a: &Node, b: &Node) -> Result<Ordering, Error> {
        if a.ptr_eq(b) {
            return Ok(Ordering::Equal);
        }
        let (tag_a, tag_b) = (
            self.registry.tag_of_node(a)?,
            self.registry.tag_of_node(b)?,
        );
        if tag_a != tag_b {
            return Ok(tag_a.cmp(tag_b));
        }
        match (a.global_id(), b.global_id()) {
            (Some(id_a), Some(id_b)) => Ok(id_a.cmp(&id_b)),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (None, None) => self.compare(a, b),
        }
    }

    /// Walks both records in lockstep.
    fn compare_records(&mut self, a: &Record, b: &Record) -> Result<Ordering, Error> {
        let mut other = b.properties.iter();
        for (name, value) in &a.properties {
            let Some((other_name, other_value)) = other.next() else {
                return Err(Error::TraversalMismatch {
                    property: name.to_string(),
                    expected: value.kind(),
                    found: None,
                });
            };
            if name != other_name || value.kind() != other_value.kind() {
                return Err(Error::TraversalMismatch {
                    property: name.to_string(),
                    expected: value.kind(),
                    found: Some(other_value.kind()),
                });
            }
            let ordering = self.compare_values(value, other_value)?;
            if ordering.is_ne() {
                trace!(tag = a.tag, property = name, ?ordering, "values differ");
                return Ok(ordering);
            }
        }
        if let Some((name, value)) = other.next() {
            return Err(Error::TraversalMismatch {
                property: name.to_string(),
                expected: value.kind(),
                found: None,
            });
        }
        Ok(Ordering::Equal)
    }

    fn compare_values(&mut self, a: &PropertyValue, b: &PropertyValue) -> Result<Ordering, Error> {
        match (a, b) {
            (PropertyValue::Primitive(a), PropertyValue::Primitive(b))
            | (PropertyValue::Verbatim(a), PropertyValue::Verbatim(b)) => Ok(a.cmp(b)),
            (PropertyValue::Scalar(a), PropertyValue::Scalar(b)) => {
                self.compare_optional(a.as_ref(), b.as_ref())
            }
            (PropertyValue::Array(a), PropertyValue::Array(b)) => self.compare_arrays(a, b),
            (PropertyValue::Map(a), PropertyValue::Map(b)) => self.compare_maps(a, b),
            _ => unreachable!("kinds were checked by the caller"),
        }
    }

    pub fn compare_arrays(
        &mut self,
        a: &[Option<Node>],
        b: &[Option<Node>],
    ) -> Result<Ordering, Error> {
        let by_length = a.len().cmp(&b.len());
        if by_length.is_ne() {
            return Ok(by_length);
        }
        for (a, b) in a.iter().zip(b) {
            let ordering = self.compare_optional(a.as_ref(), b.as_ref())?;
            if ordering.is_ne() {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    pub fn compare_maps(
        &mut self,
        a: &BTreeMap<String, Option<Node>>,
        b: &BTreeMap<String, Option<Node>>,
    ) -> Result<Ordering, Error> {
        let by_keys = a.keys().cmp(b.keys());
        if by_keys.is_ne() {
            return Ok(by_keys);
        }
        for (a, b) in a.values().zip(b.values()) {
            let ordering = self.compare_optional(a.as_ref(), b.as_ref())?;
            if ordering.is_ne() {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }
}
