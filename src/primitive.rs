// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Primitive property values.
//!
//! A [`Primitive`] is a value type with a natural ordering and a textual round trip. Modeled
//! types store primitives in plain Rust fields (`Option<i64>`, `Option<String>`, ...); the
//! [`PrimitiveValue`] trait converts between those fields and the type-erased [`Primitive`]
//! the engines work with.
use crate::{error::Error, timestamp::Timestamp};
use base64::Engine;
use serde_json::Value;
use std::{cmp::Ordering, fmt};

/// The kinds of [`Primitive`], in the order in which values of different kinds sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Timestamp,
}

/// A single primitive value.
#[derive(Clone)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::Int(_) => PrimitiveKind::Int,
            Primitive::Float(_) => PrimitiveKind::Float,
            Primitive::Text(_) => PrimitiveKind::Text,
            Primitive::Bytes(_) => PrimitiveKind::Bytes,
            Primitive::Timestamp(_) => PrimitiveKind::Timestamp,
        }
    }

    /// Encodes the value as a native JSON scalar.
    ///
    /// Bytes are base64 encoded and timestamps use their RFC 3339 form, so both decode through
    /// [`PrimitiveKind::from_json`]. JSON numbers cannot hold `NaN` or the infinities, so those
    /// are written in their textual form (`"NaN"`, `"inf"`, `"-inf"`).
    pub fn to_json(&self) -> Value {
        match self {
            Primitive::Bool(v) => (*v).into(),
            Primitive::Int(v) => (*v).into(),
            Primitive::Float(v) if !v.is_finite() => v.to_string().into(),
            Primitive::Float(v) => (*v).into(),
            Primitive::Text(v) => v.clone().into(),
            Primitive::Bytes(v) => base64::engine::general_purpose::STANDARD.encode(v).into(),
            Primitive::Timestamp(v) => (*v).into(),
        }
    }
}

impl PrimitiveKind {
    /// Parses the textual form produced by `Primitive`'s `Display` impl.
    pub fn parse(self, text: &str) -> Result<Primitive, Error> {
        let invalid = |reason: String| Error::InvalidPrimitive { kind: self, reason };
        Ok(match self {
            PrimitiveKind::Bool => Primitive::Bool(text.parse().map_err(|e| invalid(format!("{e}")))?),
            PrimitiveKind::Int => Primitive::Int(text.parse().map_err(|e| invalid(format!("{e}")))?),
            PrimitiveKind::Float => {
                Primitive::Float(text.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            PrimitiveKind::Text => Primitive::Text(text.to_string()),
            PrimitiveKind::Bytes => Primitive::Bytes(
                base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .map_err(|e| invalid(format!("{e}")))?,
            ),
            PrimitiveKind::Timestamp => Primitive::Timestamp(text.parse()?),
        })
    }

    /// Decodes a JSON scalar into a primitive of this kind.
    ///
    /// Strings are accepted for every kind and go through [`PrimitiveKind::parse`].
    pub fn from_json(self, value: &Value) -> Result<Primitive, Error> {
        let unexpected = || Error::InvalidPrimitive {
            kind: self,
            reason: format!("unexpected json {value}"),
        };
        match (self, value) {
            (_, Value::String(text)) => self.parse(text),
            (PrimitiveKind::Bool, Value::Bool(v)) => Ok(Primitive::Bool(*v)),
            (PrimitiveKind::Int, Value::Number(n)) => {
                n.as_i64().map(Primitive::Int).ok_or_else(unexpected)
            }
            (PrimitiveKind::Float, Value::Number(n)) => {
                n.as_f64().map(Primitive::Float).ok_or_else(unexpected)
            }
            (PrimitiveKind::Timestamp, Value::Number(n)) => n
                .as_i64()
                .and_then(Timestamp::from_millis)
                .map(Primitive::Timestamp)
                .ok_or_else(unexpected),
            _ => Err(unexpected()),
        }
    }
}

// NOTE: floats use the IEEE total order so that the comparator stays a total order, which
// also means `0.0` and `-0.0` are different values.
impl Ord for Primitive {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Primitive::Bool(a), Primitive::Bool(b)) => a.cmp(b),
            (Primitive::Int(a), Primitive::Int(b)) => a.cmp(b),
            (Primitive::Float(a), Primitive::Float(b)) => a.total_cmp(b),
            (Primitive::Text(a), Primitive::Text(b)) => a.cmp(b),
            (Primitive::Bytes(a), Primitive::Bytes(b)) => a.cmp(b),
            (Primitive::Timestamp(a), Primitive::Timestamp(b)) => a.cmp(b),
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

impl PartialOrd for Primitive {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Primitive {}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(v) => write!(f, "{v}"),
            Primitive::Int(v) => write!(f, "{v}"),
            Primitive::Float(v) => write!(f, "{v}"),
            Primitive::Text(v) => f.write_str(v),
            Primitive::Bytes(v) => {
                f.write_str(&base64::engine::general_purpose::STANDARD.encode(v))
            }
            Primitive::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Text(v) => write!(f, "{v:?}"),
            Primitive::Bytes(v) => write!(f, "b{v:?}"),
            other => write!(f, "{other}"),
        }
    }
}

/// Rust types that can be stored in a primitive property.
pub trait PrimitiveValue: Sized {
    const KIND: PrimitiveKind;

    fn into_primitive(self) -> Primitive;

    fn from_primitive(value: Primitive) -> Option<Self>;
}

macro_rules! impl_primitive_value {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl PrimitiveValue for $t {
                const KIND: PrimitiveKind = PrimitiveKind::$variant;

                fn into_primitive(self) -> Primitive {
                    Primitive::$variant(self)
                }

                fn from_primitive(value: Primitive) -> Option<Self> {
                    match value {
                        Primitive::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$t> for Primitive {
                fn from(value: $t) -> Self {
                    Primitive::$variant(value)
                }
            }
        )+
    };
}

impl_primitive_value!(
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Text,
    Vec<u8> => Bytes,
    Timestamp => Timestamp,
);

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::Text(value.to_string())
    }
}

#[cfg(any(test, feature = "arbitrary"))]
mod arbitrary {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    // A random date between 0 and 9999
    impl Arbitrary for Timestamp {
        fn arbitrary(g: &mut Gen) -> Timestamp {
            let range = Timestamp::MAX.as_millis() - Timestamp::MIN.as_millis();
            let offset = (u64::arbitrary(g) % range as u64) as i64;
            Timestamp::from_millis(Timestamp::MIN.as_millis() + offset)
                .expect("offset is within range")
        }
    }

    impl Arbitrary for PrimitiveKind {
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(&[
                PrimitiveKind::Bool,
                PrimitiveKind::Int,
                PrimitiveKind::Float,
                PrimitiveKind::Text,
                PrimitiveKind::Bytes,
                PrimitiveKind::Timestamp,
            ])
            .expect("non-empty")
        }
    }

    impl Arbitrary for Primitive {
        fn arbitrary(g: &mut Gen) -> Self {
            match PrimitiveKind::arbitrary(g) {
                PrimitiveKind::Bool => Primitive::Bool(bool::arbitrary(g)),
                PrimitiveKind::Int => Primitive::Int(i64::arbitrary(g)),
                // NaN payloads and signs are not kept by the textual form
                PrimitiveKind::Float => {
                    let v = f64::arbitrary(g);
                    Primitive::Float(if v.is_nan() { f64::NAN } else { v })
                }
                PrimitiveKind::Text => Primitive::Text(String::arbitrary(g)),
                PrimitiveKind::Bytes => Primitive::Bytes(Vec::arbitrary(g)),
                PrimitiveKind::Timestamp => Primitive::Timestamp(Timestamp::arbitrary(g)),
            }
        }
    }
}
