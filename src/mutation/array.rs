// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{
    Mutator,
    config::ArrayWeights,
    strategy::{self, Strategy},
};
use crate::{error::Error, model::Node, traversal::ArraySlot};
use rand::{Rng, seq::IndexedRandom};
use smallvec::SmallVec;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Front,
    Back,
    /// Strictly between the first and the last element.
    Middle,
}

/// How an array changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayStrategy {
    Clear,
    /// Replace one element with a mutation of itself.
    ModifyOne,
    InsertFabricated(Position),
    InsertReused(Position),
    PopFront,
    PopBack,
    ReverseAll,
    /// Reverse a proper sub-range of at least two elements.
    ReverseRange,
    /// Duplicate a segment in place.
    Stutter(Position),
    /// Exchange two disjoint non-empty segments.
    SwapSegments,
}

impl Strategy for ArrayStrategy {
    const CATALOG: &'static str = "array";
    const ALL: &'static [Self] = &[
        ArrayStrategy::Clear,
        ArrayStrategy::ModifyOne,
        ArrayStrategy::InsertFabricated(Position::Front),
        ArrayStrategy::InsertFabricated(Position::Back),
        ArrayStrategy::InsertFabricated(Position::Middle),
        ArrayStrategy::InsertReused(Position::Front),
        ArrayStrategy::InsertReused(Position::Back),
        ArrayStrategy::InsertReused(Position::Middle),
        ArrayStrategy::PopFront,
        ArrayStrategy::PopBack,
        ArrayStrategy::ReverseAll,
        ArrayStrategy::ReverseRange,
        ArrayStrategy::Stutter(Position::Front),
        ArrayStrategy::Stutter(Position::Back),
        ArrayStrategy::Stutter(Position::Middle),
        ArrayStrategy::SwapSegments,
    ];

    fn name(self) -> &'static str {
        match self {
            ArrayStrategy::Clear => "clear",
            ArrayStrategy::ModifyOne => "modify-one",
            ArrayStrategy::InsertFabricated(Position::Front) => "insert-fabricated-front",
            ArrayStrategy::InsertFabricated(Position::Back) => "insert-fabricated-back",
            ArrayStrategy::InsertFabricated(Position::Middle) => "insert-fabricated-middle",
            ArrayStrategy::InsertReused(Position::Front) => "insert-reused-front",
            ArrayStrategy::InsertReused(Position::Back) => "insert-reused-back",
            ArrayStrategy::InsertReused(Position::Middle) => "insert-reused-middle",
            ArrayStrategy::PopFront => "pop-front",
            ArrayStrategy::PopBack => "pop-back",
            ArrayStrategy::ReverseAll => "reverse-all",
            ArrayStrategy::ReverseRange => "reverse-range",
            ArrayStrategy::Stutter(Position::Front) => "stutter-front",
            ArrayStrategy::Stutter(Position::Back) => "stutter-back",
            ArrayStrategy::Stutter(Position::Middle) => "stutter-middle",
            ArrayStrategy::SwapSegments => "swap-segments",
        }
    }
}

impl ArrayStrategy {
    fn weight(self, weights: &ArrayWeights) -> u32 {
        match self {
            ArrayStrategy::Clear => weights.clear,
            ArrayStrategy::ModifyOne => weights.modify_one,
            ArrayStrategy::InsertFabricated(Position::Front) => weights.insert_fabricated_front,
            ArrayStrategy::InsertFabricated(Position::Back) => weights.insert_fabricated_back,
            ArrayStrategy::InsertFabricated(Position::Middle) => weights.insert_fabricated_middle,
            ArrayStrategy::InsertReused(Position::Front) => weights.insert_reused_front,
            ArrayStrategy::InsertReused(Position::Back) => weights.insert_reused_back,
            ArrayStrategy::InsertReused(Position::Middle) => weights.insert_reused_middle,
            ArrayStrategy::PopFront => weights.pop_front,
            ArrayStrategy::PopBack => weights.pop_back,
            ArrayStrategy::ReverseAll => weights.reverse_all,
            ArrayStrategy::ReverseRange => weights.reverse_range,
            ArrayStrategy::Stutter(Position::Front) => weights.stutter_front,
            ArrayStrategy::Stutter(Position::Back) => weights.stutter_back,
            ArrayStrategy::Stutter(Position::Middle) => weights.stutter_middle,
            ArrayStrategy::SwapSegments => weights.swap_segments,
        }
    }

    /// Whether the strategy produces a different array of this shape.
    fn applies_to(self, shape: &Shape) -> bool {
        let Shape {
            len,
            nulls,
            modifiable,
            fabricable,
            reusable,
            distinct,
        } = *shape;
        match self {
            ArrayStrategy::Clear | ArrayStrategy::PopFront | ArrayStrategy::PopBack => len > 0,
            ArrayStrategy::ModifyOne => modifiable,
            ArrayStrategy::InsertFabricated(position) => {
                fabricable && (position != Position::Middle || len >= 2)
            }
            ArrayStrategy::InsertReused(position) => {
                reusable && (position != Position::Middle || len >= 2)
            }
            ArrayStrategy::ReverseAll
            | ArrayStrategy::ReverseRange
            | ArrayStrategy::SwapSegments => len > 2 && distinct,
            ArrayStrategy::Stutter(Position::Middle) => len >= 3 && nulls == 0,
            ArrayStrategy::Stutter(_) => len > 0 && nulls == 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    len: usize,
    nulls: usize,
    // some element has properties of its own
    modifiable: bool,
    fabricable: bool,
    reusable: bool,
    // no two elements compare equal
    distinct: bool,
}

fn nulls(items: &[Option<Node>]) -> usize {
    items.iter().filter(|item| item.is_none()).count()
}

pub(super) fn mutate(
    mutator: &mut Mutator<'_>,
    name: &'static str,
    slot: &mut dyn ArraySlot,
) -> Result<(), Error> {
    let before = slot.get();
    let tag = mutator.element_tag(slot.default_tag(), before.iter().flatten());
    let reusable = match tag {
        Some(tag) => mutator.reusable(tag, None),
        None => Vec::new(),
    };
    let mut modifiable = Vec::new();
    for (index, item) in before.iter().enumerate() {
        let Some(item) = item else { continue };
        if super::has_properties(item)? {
            modifiable.push(index);
        }
    }
    let shape = Shape {
        len: before.len(),
        nulls: nulls(&before),
        modifiable: !modifiable.is_empty(),
        fabricable: tag.is_some(),
        reusable: !reusable.is_empty(),
        distinct: before.len() > 2 && mutator.all_distinct(&before)?,
    };

    let weighted: SmallVec<[(ArrayStrategy, u32); 16]> = ArrayStrategy::ALL
        .iter()
        .map(|&strategy| {
            let weight = if strategy.applies_to(&shape) {
                strategy.weight(&mutator.config.array)
            } else {
                0
            };
            (strategy, weight)
        })
        .collect();
    let strategy = strategy::choose(&mut mutator.rng, name, weighted)?;
    debug!(property = name, strategy = strategy.name(), ?shape, "changing array");

    let mut items = before;
    let len = items.len();
    match strategy {
        ArrayStrategy::Clear => items.clear(),
        ArrayStrategy::ModifyOne => {
            let &index = modifiable.choose(&mut mutator.rng).ok_or_else(|| Error::ModifyAbsent {
                property: name.to_string(),
            })?;
            if let Some(item) = items[index].clone() {
                items[index] = Some(mutator.mutate_nested(&item)?);
            }
        }
        ArrayStrategy::InsertFabricated(position) => {
            let tag = tag.ok_or_else(|| Error::MissingTypeTag {
                property: name.to_string(),
            })?;
            let item = mutator.fabricate(tag)?;
            let index = insertion_index(mutator, position, len);
            items.insert(index, Some(item));
        }
        ArrayStrategy::InsertReused(position) => {
            let item = mutator.pick(tag.unwrap_or(name), &reusable)?;
            let index = insertion_index(mutator, position, len);
            items.insert(index, Some(item));
        }
        ArrayStrategy::PopFront => {
            items.remove(0);
        }
        ArrayStrategy::PopBack => {
            items.pop();
        }
        ArrayStrategy::ReverseAll => items.reverse(),
        ArrayStrategy::ReverseRange => {
            let width = mutator.rng.random_range(2..len);
            let start = mutator.rng.random_range(0..=len - width);
            items[start..start + width].reverse();
        }
        ArrayStrategy::Stutter(position) => {
            let (start, end) = match position {
                Position::Front => (0, mutator.rng.random_range(1..=len)),
                Position::Back => (len - mutator.rng.random_range(1..=len), len),
                Position::Middle => {
                    let start = mutator.rng.random_range(1..len - 1);
                    (start, start + mutator.rng.random_range(1..=len - 1 - start))
                }
            };
            let segment = items[start..end].to_vec();
            items.splice(end..end, segment);
        }
        ArrayStrategy::SwapSegments => {
            // [i, j) and [k, l) with i < j <= k < l
            let i = mutator.rng.random_range(0..len - 1);
            let j = mutator.rng.random_range(i + 1..len);
            let k = mutator.rng.random_range(j..len);
            let l = mutator.rng.random_range(k + 1..=len);
            let mut swapped = Vec::with_capacity(len);
            swapped.extend_from_slice(&items[..i]);
            swapped.extend_from_slice(&items[k..l]);
            swapped.extend_from_slice(&items[j..k]);
            swapped.extend_from_slice(&items[i..j]);
            swapped.extend_from_slice(&items[l..]);
            items = swapped;
        }
    }

    if nulls(&items) > shape.nulls {
        return Err(Error::NullIntroduced {
            property: name.to_string(),
            strategy: strategy.name(),
        });
    }
    slot.set(items).map_err(|err| err.at(name))
}

fn insertion_index(mutator: &mut Mutator<'_>, position: Position, len: usize) -> usize {
    match position {
        Position::Front => 0,
        Position::Back => len,
        Position::Middle => mutator.rng.random_range(1..len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        MutatorConfig, Shared,
        comparison::Comparator,
        test_util::{self, Leaf},
    };

    fn mutator_with(registry: &crate::Registry, weights: ArrayWeights, seed: u64) -> Mutator<'_> {
        Mutator::with_config(
            registry,
            MutatorConfig::default().with_seed(seed).with_array_weights(weights),
        )
    }

    fn leaves(values: &[i64]) -> Vec<Shared<Leaf>> {
        values.iter().map(|v| Shared::new(Leaf::new(*v))).collect()
    }

    fn values(leaves: &[Shared<Leaf>]) -> Vec<i64> {
        leaves
            .iter()
            .map(|leaf| leaf.borrow().value.unwrap_or(-1))
            .collect()
    }

    #[test]
    fn reordering_needs_three_distinct_elements() {
        let registry = test_util::registry();
        for weights in [
            ArrayWeights {
                reverse_all: 1,
                ..ArrayWeights::disabled()
            },
            ArrayWeights {
                reverse_range: 1,
                ..ArrayWeights::disabled()
            },
            ArrayWeights {
                swap_segments: 1,
                ..ArrayWeights::disabled()
            },
        ] {
            let mut mutator = mutator_with(&registry, weights, 1);
            for short_or_repetitive in [leaves(&[1, 2]), leaves(&[1, 2, 1])] {
                let mut items = short_or_repetitive;
                assert!(matches!(
                    mutate(&mut mutator, "leaves", &mut items),
                    Err(Error::NoStrategy { .. })
                ));
            }
            let mut items = leaves(&[1, 2, 3, 4]);
            let before = items.clone();
            mutate(&mut mutator, "leaves", &mut items).unwrap();
            assert_ne!(values(&items), values(&before));
            let mut sorted = values(&items);
            sorted.sort();
            assert_eq!(sorted, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn reverse_range_leaves_something_in_place() {
        let registry = test_util::registry();
        let weights = ArrayWeights {
            reverse_range: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 2);
        for _ in 0..50 {
            let mut items = leaves(&[1, 2, 3]);
            mutate(&mut mutator, "leaves", &mut items).unwrap();
            let after = values(&items);
            assert!(after == [2, 1, 3] || after == [1, 3, 2], "{after:?}");
        }
    }

    #[test]
    fn stutter_duplicates_a_segment() {
        let registry = test_util::registry();
        for (weights, min_len) in [
            (
                ArrayWeights {
                    stutter_front: 1,
                    ..ArrayWeights::disabled()
                },
                1,
            ),
            (
                ArrayWeights {
                    stutter_middle: 1,
                    ..ArrayWeights::disabled()
                },
                3,
            ),
        ] {
            let mut mutator = mutator_with(&registry, weights, 3);
            let mut short = leaves(&[1, 2, 3][..min_len - 1]);
            assert!(mutate(&mut mutator, "leaves", &mut short).is_err());

            let mut items = leaves(&[1, 2, 3, 4]);
            let before = items.clone();
            mutate(&mut mutator, "leaves", &mut items).unwrap();
            assert!(items.len() > before.len());
            // every element is one of the originals
            assert!(items.iter().all(|item| before.iter().any(|b| b.ptr_eq(item))));
        }
    }

    #[test]
    fn stutter_refuses_arrays_with_nulls() {
        let registry = test_util::registry();
        let weights = ArrayWeights {
            stutter_front: 1,
            stutter_back: 1,
            stutter_middle: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 4);
        let mut sparse = vec![
            Some(Shared::new(Leaf::new(1))),
            None,
            Some(Shared::new(Leaf::new(2))),
        ];
        assert!(matches!(
            mutate(&mut mutator, "sparse", &mut sparse),
            Err(Error::NoStrategy { .. })
        ));
    }

    #[test]
    fn insertion_in_the_middle_needs_two_elements() {
        let registry = test_util::registry();
        let weights = ArrayWeights {
            insert_fabricated_middle: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 5);
        let mut single = leaves(&[1]);
        assert!(mutate(&mut mutator, "leaves", &mut single).is_err());

        let mut items = leaves(&[1, 2]);
        mutate(&mut mutator, "leaves", &mut items).unwrap();
        assert_eq!(values(&items), vec![1, -1, 2]);
    }

    #[test]
    fn pops_remove_the_ends() {
        let registry = test_util::registry();
        let weights = ArrayWeights {
            pop_front: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 6);
        let mut items = leaves(&[1, 2, 3]);
        mutate(&mut mutator, "leaves", &mut items).unwrap();
        assert_eq!(values(&items), vec![2, 3]);

        let weights = ArrayWeights {
            pop_back: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 6);
        mutate(&mut mutator, "leaves", &mut items).unwrap();
        assert_eq!(values(&items), vec![2]);
        let mut empty: Vec<Shared<Leaf>> = Vec::new();
        assert!(mutate(&mut mutator, "leaves", &mut empty).is_err());
    }

    #[test]
    fn modify_one_skips_nulls() {
        let registry = test_util::registry();
        let weights = ArrayWeights {
            modify_one: 1,
            ..ArrayWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 7);
        let kept = Shared::new(Leaf::new(1));
        let mut sparse = vec![None, Some(kept.clone()), None];
        mutate(&mut mutator, "sparse", &mut sparse).unwrap();
        assert!(sparse[0].is_none() && sparse[2].is_none());
        let changed = sparse[1].as_ref().unwrap();
        assert!(!changed.ptr_eq(&kept));
        assert!(
            Comparator::new(&registry)
                .compare(changed.node(), kept.node())
                .unwrap()
                .is_ne()
        );

        let mut all_null: Vec<Option<Shared<Leaf>>> = vec![None, None];
        assert!(mutate(&mut mutator, "sparse", &mut all_null).is_err());
    }
}
