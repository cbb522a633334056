// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use rand::{Rng, seq::IndexedRandom};

const WORDS: &[&str] = &[
    "anchor", "amber", "arrow", "basin", "beacon", "birch", "bolt", "bridge", "cable", "canyon",
    "cedar", "cinder", "cobalt", "comet", "copper", "crane", "delta", "drift", "dune", "ember",
    "falcon", "fern", "flint", "fjord", "frost", "garnet", "glacier", "granite", "harbor",
    "hollow", "island", "ivory", "jasper", "juniper", "kestrel", "lantern", "lichen", "marble",
    "meadow", "mesa", "nickel", "nova", "oak", "onyx", "orbit", "pebble", "pine", "prairie",
    "quartz", "quill", "raven", "reef", "ridge", "river", "saffron", "shale", "signal", "slate",
    "summit", "thistle", "tide", "timber", "tundra", "umber", "valley", "vapor", "willow",
    "zenith",
];

pub fn word(rng: &mut impl Rng) -> &'static str {
    WORDS.choose(rng).copied().unwrap_or("word")
}

/// A capitalized sentence of a few words, ending in a period.
pub fn sentence(rng: &mut impl Rng) -> String {
    let count = rng.random_range(3..=9);
    let mut sentence = String::new();
    for i in 0..count {
        let word = word(rng);
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                sentence.extend(first.to_uppercase());
                sentence.push_str(chars.as_str());
            }
        } else {
            sentence.push(' ');
            sentence.push_str(word);
        }
    }
    sentence.push('.');
    sentence
}
