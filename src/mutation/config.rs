// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Tuning knobs of the [`Mutator`](super::Mutator).
//!
//! Every strategy of every catalog has a weight. A weight of zero disables the strategy; the
//! others are picked with probability proportional to their weight among the strategies whose
//! preconditions hold. The configuration is plain data, so it can be loaded from JSON:
//!
//! ```rust
//! use elevated::MutatorConfig;
//!
//! let config: MutatorConfig = serde_json::from_str(r#"{
//!     "seed": 7,
//!     "scalar": { "clear": 0 }
//! }"#).unwrap();
//! assert_eq!(config.seed, Some(7));
//! assert_eq!(config.scalar.clear, 0);
//! assert_eq!(config.scalar.modify, MutatorConfig::default().scalar.modify);
//! ```
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutatorConfig {
    /// Makes the mutator reproducible. Without a seed, every mutator draws a fresh one.
    pub seed: Option<u64>,
    /// How many times a mutation is tried from scratch before giving up on producing a value
    /// that differs from the original.
    pub max_attempts: usize,
    pub scalar: ScalarWeights,
    pub array: ArrayWeights,
    pub map: MapWeights,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_attempts: 64,
            scalar: ScalarWeights::default(),
            array: ArrayWeights::default(),
            map: MapWeights::default(),
        }
    }
}

impl MutatorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_scalar_weights(mut self, weights: ScalarWeights) -> Self {
        self.scalar = weights;
        self
    }

    pub fn with_array_weights(mut self, weights: ArrayWeights) -> Self {
        self.array = weights;
        self
    }

    pub fn with_map_weights(mut self, weights: MapWeights) -> Self {
        self.map = weights;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarWeights {
    pub fabricate: u32,
    pub reuse: u32,
    pub modify: u32,
    pub clear: u32,
}

impl ScalarWeights {
    /// Every strategy disabled, as a base for enabling a few.
    pub const fn disabled() -> Self {
        Self {
            fabricate: 0,
            reuse: 0,
            modify: 0,
            clear: 0,
        }
    }
}

impl Default for ScalarWeights {
    fn default() -> Self {
        Self {
            fabricate: 2,
            reuse: 2,
            modify: 4,
            clear: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayWeights {
    pub clear: u32,
    pub modify_one: u32,
    pub insert_fabricated_front: u32,
    pub insert_fabricated_back: u32,
    pub insert_fabricated_middle: u32,
    pub insert_reused_front: u32,
    pub insert_reused_back: u32,
    pub insert_reused_middle: u32,
    pub pop_front: u32,
    pub pop_back: u32,
    pub reverse_all: u32,
    pub reverse_range: u32,
    pub stutter_front: u32,
    pub stutter_back: u32,
    pub stutter_middle: u32,
    pub swap_segments: u32,
}

impl ArrayWeights {
    /// Every strategy disabled, as a base for enabling a few.
    pub const fn disabled() -> Self {
        Self {
            clear: 0,
            modify_one: 0,
            insert_fabricated_front: 0,
            insert_fabricated_back: 0,
            insert_fabricated_middle: 0,
            insert_reused_front: 0,
            insert_reused_back: 0,
            insert_reused_middle: 0,
            pop_front: 0,
            pop_back: 0,
            reverse_all: 0,
            reverse_range: 0,
            stutter_front: 0,
            stutter_back: 0,
            stutter_middle: 0,
            swap_segments: 0,
        }
    }
}

impl Default for ArrayWeights {
    fn default() -> Self {
        Self {
            clear: 1,
            modify_one: 4,
            insert_fabricated_front: 2,
            insert_fabricated_back: 2,
            insert_fabricated_middle: 2,
            insert_reused_front: 1,
            insert_reused_back: 1,
            insert_reused_middle: 1,
            pop_front: 2,
            pop_back: 2,
            reverse_all: 1,
            reverse_range: 1,
            stutter_front: 1,
            stutter_back: 1,
            stutter_middle: 1,
            swap_segments: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapWeights {
    pub clear: u32,
    pub remove: u32,
    pub modify_one: u32,
    pub insert_fabricated: u32,
    pub insert_reused: u32,
    pub rekey: u32,
}

impl MapWeights {
    /// Every strategy disabled, as a base for enabling a few.
    pub const fn disabled() -> Self {
        Self {
            clear: 0,
            remove: 0,
            modify_one: 0,
            insert_fabricated: 0,
            insert_reused: 0,
            rekey: 0,
        }
    }
}

impl Default for MapWeights {
    fn default() -> Self {
        Self {
            clear: 1,
            remove: 2,
            modify_one: 4,
            insert_fabricated: 2,
            insert_reused: 1,
            rekey: 1,
        }
    }
}
