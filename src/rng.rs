//! Randomness helpers shared by the battle engine, bonus round and lootboxes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Ordered table of (cumulative threshold, outcome) pairs. A roll in [0, 1)
/// selects the first entry whose threshold is greater than the roll; rolls
/// past the last threshold select `fallback`.
#[derive(Clone, Debug)]
pub struct WeightedTable<T: Copy> {
    entries: Vec<(f64, T)>,
    fallback: T,
}

impl<T: Copy> WeightedTable<T> {
    pub fn new(entries: Vec<(f64, T)>, fallback: T) -> Self {
        Self { entries, fallback }
    }

    /// Build from plain weights; thresholds are accumulated in order.
    pub fn from_weights(weights: &[(f64, T)], fallback: T) -> Self {
        let mut acc = 0.0;
        let mut entries = Vec::with_capacity(weights.len());
        for &(w, v) in weights {
            acc += w;
            entries.push((acc, v));
        }
        Self { entries, fallback }
    }

    pub fn pick(&self, roll: f64) -> T {
        self.entries
            .iter()
            .find(|(threshold, _)| roll < *threshold)
            .map(|&(_, v)| v)
            .unwrap_or(self.fallback)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.pick(rng.r#gen::<f64>())
    }
}

/// Uniform index in `0..len`; `0` for empty slices.
pub fn rand_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    rng.gen_range(0..len)
}

/// Entropy-seeded generator for live play. In the browser the seed comes from
/// `crypto.getRandomValues` through getrandom's `js` backend.
pub fn entropy_rng() -> SmallRng {
    SmallRng::from_entropy()
}
