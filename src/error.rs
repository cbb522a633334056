// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The error taxonomy shared by every engine.
//!
//! Errors fall into four groups:
//!
//! - **configuration**: the [`Registry`](crate::Registry) was set up inconsistently;
//! - **malformed input**: a JSON tree handed to the [`Reader`](crate::codec::Reader) does not
//!   describe a value the registry can materialize;
//! - **logic**: an engine was driven into a state its own preconditions should have excluded;
//! - **exhaustion**: the [`Mutator`](crate::mutation::Mutator) had nothing it was allowed to do.
//!
//! None of these are retried internally.
use crate::{primitive::PrimitiveKind, timestamp::TimestampError, traversal::PropertyKind};
use std::fmt;

/// Any failure produced by the traversal engines.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A type tag was registered twice.
    DuplicateTag(String),
    /// The same concrete type was registered under two tags.
    DuplicateType {
        tag: &'static str,
        existing: &'static str,
    },
    /// No allocator is registered for the tag.
    UnknownTag(String),
    /// The concrete type of a value was never registered.
    UnregisteredType(&'static str),

    /// A JSON object carries no `__class__` and the property supplies no default element type.
    MissingTypeTag { property: String },
    /// A strict reader found no key for a property.
    MissingProperty { tag: String, property: String },
    /// A `__is_ref__` stub points at an object that was not materialized earlier in the session.
    UnresolvedReference { tag: String, id: u64 },
    /// The JSON tree does not have the expected shape.
    Malformed { property: String, reason: String },
    /// A nested value has a concrete type the receiving property cannot hold.
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: String,
    },
    /// A `null` was stored into a collection whose elements cannot be absent.
    NullElement { property: String },
    /// A primitive could not be parsed from its textual form.
    InvalidPrimitive { kind: PrimitiveKind, reason: String },
    /// The input text is not JSON.
    Json(String),

    /// Two traversals of the same type did not report the same properties.
    TraversalMismatch {
        property: String,
        expected: PropertyKind,
        found: Option<PropertyKind>,
    },
    /// The mutator tried to modify a scalar that holds nothing.
    ModifyAbsent { property: String },
    /// The mutator tried to reuse a value while the pool held no candidate.
    EmptyPool { tag: String },
    /// A merge was asked for without any source to merge.
    NoSources,
    /// An array edit left more `null` elements than it started with.
    NullIntroduced {
        property: String,
        strategy: &'static str,
    },

    /// Every strategy of a catalog was disabled by its preconditions.
    NoStrategy {
        property: String,
        catalog: &'static str,
    },
    /// No attempt produced a value the comparator could tell apart from the original.
    Unobservable { tag: String, attempts: usize },
    /// The value has no property to mutate.
    NoProperties { tag: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateTag(tag) => write!(f, "type tag {tag} is already registered"),
            Error::DuplicateType { tag, existing } => {
                write!(f, "cannot register {tag}: its type is already registered as {existing}")
            }
            Error::UnknownTag(tag) => write!(f, "no allocator registered for type tag {tag}"),
            Error::UnregisteredType(type_name) => {
                write!(f, "type {type_name} was never registered")
            }
            Error::MissingTypeTag { property } => {
                write!(f, "cannot infer the type of {property}: no __class__ and no default")
            }
            Error::MissingProperty { tag, property } => {
                write!(f, "{tag} is missing required property {property}")
            }
            Error::UnresolvedReference { tag, id } => {
                write!(f, "reference to {tag}#{id} does not resolve to a decoded object")
            }
            Error::Malformed { property, reason } => write!(f, "malformed {property}: {reason}"),
            Error::TypeMismatch {
                property,
                expected,
                found,
            } => write!(f, "{property} expects {expected}, found {found}"),
            Error::NullElement { property } => {
                write!(f, "{property} does not accept null elements")
            }
            Error::InvalidPrimitive { kind, reason } => {
                write!(f, "invalid {kind:?} primitive: {reason}")
            }
            Error::Json(reason) => write!(f, "invalid json: {reason}"),
            Error::TraversalMismatch {
                property,
                expected,
                found: Some(found),
            } => write!(f, "{property} was traversed as {expected:?} and as {found:?}"),
            Error::TraversalMismatch {
                property,
                expected,
                found: None,
            } => write!(f, "{property} ({expected:?}) is not part of the other traversal"),
            Error::ModifyAbsent { property } => {
                write!(f, "cannot modify {property}: it holds no value")
            }
            Error::EmptyPool { tag } => write!(f, "no pooled {tag} is available for reuse"),
            Error::NoSources => f.write_str("a merge needs at least one source"),
            Error::NullIntroduced { property, strategy } => {
                write!(f, "{strategy} introduced a null element into {property}")
            }
            Error::NoStrategy { property, catalog } => {
                write!(f, "no {catalog} strategy is applicable to {property}")
            }
            Error::Unobservable { tag, attempts } => {
                write!(f, "{attempts} mutations of {tag} all compared equal to the original")
            }
            Error::NoProperties { tag } => write!(f, "{tag} has no properties to mutate"),
        }
    }
}

impl std::error::Error for Error {}

impl From<TimestampError> for Error {
    fn from(value: TimestampError) -> Self {
        Error::InvalidPrimitive {
            kind: PrimitiveKind::Timestamp,
            reason: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value.to_string())
    }
}
