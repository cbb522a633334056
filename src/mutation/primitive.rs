// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Resampling of primitive values.
//!
//! Each kind has a small catalog of generators with different ranges. A generator is picked
//! uniformly and its output is drawn again until it differs from the current value, so that a
//! primitive mutation is always observable.
use super::words;
use crate::{
    primitive::{Primitive, PrimitiveKind},
    timestamp::Timestamp,
};
use chrono::TimeDelta;
use rand::{Rng, rngs::SmallRng, seq::IndexedRandom};

type IntGenerator = fn(&mut SmallRng, Option<i64>) -> i64;
type FloatGenerator = fn(&mut SmallRng) -> f64;

const INTS: &[IntGenerator] = &[
    |rng, _| rng.random_range(0..=1),
    |rng, _| rng.random_range(-1..=1),
    |rng, _| rng.random_range(0..=10),
    |rng, _| rng.random_range(-10..=10),
    |rng, before| {
        let step = rng.random_range(1..=10);
        let before = before.unwrap_or_default();
        if rng.random_bool(0.5) {
            before.saturating_add(step)
        } else {
            before.saturating_sub(step)
        }
    },
    |rng, _| rng.random(),
];

const FLOATS: &[FloatGenerator] = &[
    |rng| rng.random_range(0.0..1.0),
    |rng| rng.random_range(-1.0..1.0),
    |rng| rng.random_range(0.0..10.0),
    |rng| rng.random_range(-10.0..10.0),
    |rng| rng.random_range(-1e12..1e12),
];

/// Day-like offsets, scaled by a random unit.
const OFFSETS: &[fn(&mut SmallRng) -> i64] = &[
    |_| -1,
    |_| 1,
    |rng| rng.random_range(-7..=-1),
    |rng| rng.random_range(1..=7),
    |rng| rng.random_range(-27..=-1),
    |rng| rng.random_range(1..=27),
    |rng| *[27, 28, 29, 30, 31, 52, 60].choose(rng).unwrap_or(&1),
    |rng| *[-27, -28, -29, -30, -31, -52, -60].choose(rng).unwrap_or(&-1),
    |rng| *[100, 1000, 10000].choose(rng).unwrap_or(&1),
];

const UNITS: &[fn(i64) -> TimeDelta] = &[
    TimeDelta::seconds,
    TimeDelta::minutes,
    TimeDelta::hours,
    TimeDelta::days,
    TimeDelta::weeks,
];

/// Draws a value of `kind` that differs from `before`.
pub fn resample(rng: &mut SmallRng, kind: PrimitiveKind, before: Option<&Primitive>) -> Primitive {
    loop {
        if let Some(candidate) = generate(rng, kind, before) {
            if Some(&candidate) != before {
                return candidate;
            }
        }
    }
}

/// Draws one value of `kind`, or `None` if the generator left the domain.
fn generate(rng: &mut SmallRng, kind: PrimitiveKind, before: Option<&Primitive>) -> Option<Primitive> {
    let candidate = match kind {
        PrimitiveKind::Bool => match before {
            Some(Primitive::Bool(before)) => Primitive::Bool(!before),
            _ => Primitive::Bool(rng.random_bool(0.5)),
        },
        PrimitiveKind::Int => {
            let before = match before {
                Some(Primitive::Int(before)) => Some(*before),
                _ => None,
            };
            let generator = INTS.choose(rng)?;
            Primitive::Int(generator(rng, before))
        }
        PrimitiveKind::Float => {
            let generator = FLOATS.choose(rng)?;
            Primitive::Float(generator(rng))
        }
        PrimitiveKind::Text => Primitive::Text(words::sentence(rng)),
        PrimitiveKind::Bytes => {
            let len = rng.random_range(1..=16);
            Primitive::Bytes((0..len).map(|_| rng.random()).collect())
        }
        PrimitiveKind::Timestamp => {
            let basis = match before {
                Some(Primitive::Timestamp(before)) if rng.random_bool(0.5) => *before,
                _ => Timestamp::now(),
            };
            let offset = OFFSETS.choose(rng)?;
            let offset = offset(rng);
            let unit = UNITS.choose(rng)?;
            Primitive::Timestamp(basis.checked_add(unit(offset))?)
        }
    };
    Some(candidate)
}
