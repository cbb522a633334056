// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::error::Error;
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;

/// A closed catalog of mutation strategies.
pub trait Strategy: Copy + fmt::Debug + 'static {
    /// Name of the catalog, for error messages.
    const CATALOG: &'static str;
    /// Every strategy, in catalog order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

/// Picks a strategy with probability proportional to its weight.
///
/// Draws uniformly from `[0, total)` and walks the catalog in order, so ties go to the strategy
/// listed first. Fails with [`Error::NoStrategy`] if every weight is zero.
pub fn choose<S: Strategy>(
    rng: &mut impl Rng,
    property: &str,
    weighted: impl IntoIterator<Item = (S, u32)>,
) -> Result<S, Error> {
    let weighted: SmallVec<[(S, u32); 16]> = weighted
        .into_iter()
        .filter(|(_, weight)| *weight > 0)
        .collect();
    let total: u64 = weighted.iter().map(|(_, weight)| u64::from(*weight)).sum();
    if total == 0 {
        return Err(Error::NoStrategy {
            property: property.to_string(),
            catalog: S::CATALOG,
        });
    }

    let mut draw = rng.random_range(0..total);
    for (strategy, weight) in weighted {
        let weight = u64::from(weight);
        if draw < weight {
            return Ok(strategy);
        }
        draw -= weight;
    }
    unreachable!("the draw is below the total weight")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Coin {
        Heads,
        Tails,
        Edge,
    }

    impl Strategy for Coin {
        const CATALOG: &'static str = "coin";
        const ALL: &'static [Self] = &[Coin::Heads, Coin::Tails, Coin::Edge];

        fn name(self) -> &'static str {
            match self {
                Coin::Heads => "heads",
                Coin::Tails => "tails",
                Coin::Edge => "edge",
            }
        }
    }

    #[test]
    fn zero_weights_are_never_picked() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            let coin = choose(&mut rng, "p", [(Coin::Heads, 0), (Coin::Tails, 3), (Coin::Edge, 0)]);
            assert_eq!(coin, Ok(Coin::Tails));
        }
    }

    #[test]
    fn picks_follow_the_weights() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            let coin = choose(&mut rng, "p", [(Coin::Heads, 1), (Coin::Tails, 3), (Coin::Edge, 0)])
                .unwrap();
            counts[coin as usize] += 1;
        }
        // expected 2500 and 7500
        assert!((2000..3000).contains(&counts[0]), "{counts:?}");
        assert!((7000..8000).contains(&counts[1]), "{counts:?}");
        assert_eq!(counts[2], 0);
    }

    #[test]
    fn exhausted_catalogs_fail() {
        let mut rng = SmallRng::seed_from_u64(3);
        let weights = Coin::ALL.iter().map(|coin| (*coin, 0));
        assert_eq!(
            choose(&mut rng, "flip", weights),
            Err(Error::NoStrategy {
                property: "flip".into(),
                catalog: "coin"
            })
        );
        assert_eq!(Coin::Edge.name(), "edge");
    }
}
