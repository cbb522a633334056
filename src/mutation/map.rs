// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{
    Mutator,
    strategy::{self, Strategy},
    words,
};
use crate::{error::Error, model::Node, traversal::MapSlot};
use rand::{Rng, seq::IndexedRandom};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::debug;

/// How a map changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStrategy {
    Clear,
    Remove,
    ModifyOne,
    InsertFabricated,
    InsertReused,
    /// Move a value to a fresh key.
    Rekey,
}

impl Strategy for MapStrategy {
    const CATALOG: &'static str = "map";
    const ALL: &'static [Self] = &[
        MapStrategy::Clear,
        MapStrategy::Remove,
        MapStrategy::ModifyOne,
        MapStrategy::InsertFabricated,
        MapStrategy::InsertReused,
        MapStrategy::Rekey,
    ];

    fn name(self) -> &'static str {
        match self {
            MapStrategy::Clear => "clear",
            MapStrategy::Remove => "remove",
            MapStrategy::ModifyOne => "modify-one",
            MapStrategy::InsertFabricated => "insert-fabricated",
            MapStrategy::InsertReused => "insert-reused",
            MapStrategy::Rekey => "rekey",
        }
    }
}

pub(super) fn mutate(
    mutator: &mut Mutator<'_>,
    name: &'static str,
    slot: &mut dyn MapSlot,
) -> Result<(), Error> {
    let mut entries = slot.get();
    let tag = mutator.element_tag(slot.default_tag(), entries.values().flatten());
    let reusable = match tag {
        Some(tag) => mutator.reusable(tag, None),
        None => Vec::new(),
    };
    let mut modifiable = Vec::new();
    for (key, value) in &entries {
        let Some(value) = value else { continue };
        if super::has_properties(value)? {
            modifiable.push(key.clone());
        }
    }

    let weights = &mutator.config.map;
    let weighted: SmallVec<[(MapStrategy, u32); 6]> = MapStrategy::ALL
        .iter()
        .map(|&strategy| {
            let (enabled, weight) = match strategy {
                MapStrategy::Clear => (!entries.is_empty(), weights.clear),
                MapStrategy::Remove => (!entries.is_empty(), weights.remove),
                MapStrategy::ModifyOne => (!modifiable.is_empty(), weights.modify_one),
                MapStrategy::InsertFabricated => (tag.is_some(), weights.insert_fabricated),
                MapStrategy::InsertReused => (!reusable.is_empty(), weights.insert_reused),
                MapStrategy::Rekey => (!entries.is_empty(), weights.rekey),
            };
            (strategy, if enabled { weight } else { 0 })
        })
        .collect();
    let strategy = strategy::choose(&mut mutator.rng, name, weighted)?;
    debug!(property = name, strategy = strategy.name(), len = entries.len(), "changing map");

    match strategy {
        MapStrategy::Clear => entries.clear(),
        MapStrategy::Remove => {
            let key = random_key(mutator, name, &entries)?;
            entries.remove(&key);
        }
        MapStrategy::ModifyOne => {
            let key = modifiable.choose(&mut mutator.rng).ok_or_else(|| Error::ModifyAbsent {
                property: name.to_string(),
            })?;
            if let Some(value) = entries[key].clone() {
                entries.insert(key.clone(), Some(mutator.mutate_nested(&value)?));
            }
        }
        MapStrategy::InsertFabricated => {
            let tag = tag.ok_or_else(|| Error::MissingTypeTag {
                property: name.to_string(),
            })?;
            let value = mutator.fabricate(tag)?;
            let key = fresh_key(mutator, &entries);
            entries.insert(key, Some(value));
        }
        MapStrategy::InsertReused => {
            let value = mutator.pick(tag.unwrap_or(name), &reusable)?;
            let key = fresh_key(mutator, &entries);
            entries.insert(key, Some(value));
        }
        MapStrategy::Rekey => {
            let old = random_key(mutator, name, &entries)?;
            let new = fresh_key(mutator, &entries);
            if let Some(value) = entries.remove(&old) {
                entries.insert(new, value);
            }
        }
    }
    slot.set(entries).map_err(|err| err.at(name))
}

fn random_key(
    mutator: &mut Mutator<'_>,
    name: &str,
    entries: &BTreeMap<String, Option<Node>>,
) -> Result<String, Error> {
    let keys: Vec<&String> = entries.keys().collect();
    keys.choose(&mut mutator.rng)
        .map(|key| key.to_string())
        .ok_or_else(|| Error::ModifyAbsent {
            property: name.to_string(),
        })
}

/// A key that is not in `entries` yet.
fn fresh_key(mutator: &mut Mutator<'_>, entries: &BTreeMap<String, Option<Node>>) -> String {
    let mut key = words::word(&mut mutator.rng).to_string();
    while entries.contains_key(&key) {
        key = format!("{}-{}", words::word(&mut mutator.rng), mutator.rng.random_range(0..1000));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        MapWeights, MutatorConfig, Shared,
        test_util::{self, Empty, Leaf},
    };

    fn mutator_with(registry: &crate::Registry, weights: MapWeights, seed: u64) -> Mutator<'_> {
        Mutator::with_config(
            registry,
            MutatorConfig::default().with_seed(seed).with_map_weights(weights),
        )
    }

    fn named(entries: &[(&str, i64)]) -> BTreeMap<String, Shared<Leaf>> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), Shared::new(Leaf::new(*value))))
            .collect()
    }

    #[test]
    fn rekeying_keeps_the_value() {
        let registry = test_util::registry();
        let weights = MapWeights {
            rekey: 1,
            ..MapWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 1);
        let mut entries = named(&[("a", 1), ("b", 2)]);
        let before = entries.clone();
        mutate(&mut mutator, "named", &mut entries).unwrap();
        assert_eq!(entries.len(), 2);
        assert_ne!(
            entries.keys().collect::<Vec<_>>(),
            before.keys().collect::<Vec<_>>()
        );
        for value in entries.values() {
            assert!(before.values().any(|b| b.ptr_eq(value)));
        }
    }

    #[test]
    fn insertion_uses_fresh_keys() {
        let registry = test_util::registry();
        let weights = MapWeights {
            insert_fabricated: 1,
            ..MapWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 2);
        let mut entries = named(&[]);
        for len in 1..=50 {
            mutate(&mut mutator, "named", &mut entries).unwrap();
            assert_eq!(entries.len(), len);
        }
        assert_eq!(mutator.pool("Leaf").len(), 50);
    }

    #[test]
    fn empty_maps_can_only_grow() {
        let registry = test_util::registry();
        let weights = MapWeights {
            clear: 1,
            remove: 1,
            modify_one: 1,
            rekey: 1,
            ..MapWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 3);
        let mut entries = named(&[]);
        assert_eq!(
            mutate(&mut mutator, "named", &mut entries).unwrap_err(),
            Error::NoStrategy {
                property: "named".into(),
                catalog: "map"
            }
        );
    }

    #[test]
    fn empty_maps_have_no_key_to_pick() {
        let registry = test_util::registry();
        let mut mutator = mutator_with(&registry, MapWeights::default(), 6);
        assert_eq!(
            random_key(&mut mutator, "named", &BTreeMap::new()).unwrap_err(),
            Error::ModifyAbsent {
                property: "named".into()
            }
        );
        let entries = BTreeMap::from([("only".to_string(), None)]);
        assert_eq!(random_key(&mut mutator, "named", &entries).unwrap(), "only");
    }

    #[test]
    fn modification_skips_values_without_properties() {
        let registry = test_util::registry();
        let weights = MapWeights {
            modify_one: 1,
            ..MapWeights::disabled()
        };
        let mut mutator = mutator_with(&registry, weights, 7);
        let mut table: BTreeMap<String, Option<Node>> = BTreeMap::from([
            ("empty".to_string(), Some(Node::new(Empty))),
            ("leaf".to_string(), Some(Node::new(Leaf::new(1)))),
        ]);
        let empty = table["empty"].clone().unwrap();
        for _ in 0..10 {
            mutate(&mut mutator, "table", &mut table).unwrap();
            assert!(table["empty"].as_ref().unwrap().ptr_eq(&empty));
        }
    }

    #[test]
    fn removal_and_modification_touch_one_entry() {
        let registry = test_util::registry();
        let mut entries = named(&[("a", 1), ("b", 2), ("c", 3)]);
        let before = entries.clone();

        let weights = MapWeights {
            remove: 1,
            ..MapWeights::disabled()
        };
        mutate(&mut mutator_with(&registry, weights, 4), "named", &mut entries).unwrap();
        assert_eq!(entries.len(), 2);

        let weights = MapWeights {
            modify_one: 1,
            ..MapWeights::disabled()
        };
        mutate(&mut mutator_with(&registry, weights, 5), "named", &mut entries).unwrap();
        let unchanged = entries
            .iter()
            .filter(|(key, value)| before[*key].ptr_eq(value))
            .count();
        assert_eq!(unchanged, 1);
    }
}
