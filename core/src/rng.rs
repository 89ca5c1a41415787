//! Deterministic random number generation.
//!
//! RULE: Nothing in the pipeline may call any platform RNG.
//! All randomness flows through a `RandomSource` handed in by the caller.
//!
//! A source forks one child stream per stable slot, seeded from
//! (seed XOR slot_index * golden ratio). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each table's draws are reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// An explicit, seedable random stream.
pub struct RandomSource {
    pub name: &'static str,
    seed: u64,
    inner: Pcg64Mcg,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "root",
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive the child stream for `slot`. Does not consume from `self`.
    pub fn fork(&self, slot: StreamSlot) -> RandomSource {
        let derived_seed = self.seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        RandomSource::new(derived_seed).with_name(slot.name())
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [low, high], both ends included.
    pub fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        assert!(low <= high, "empty range {low}..={high}");
        let span = (high - low) as u64 + 1;
        low + self.next_u64_below(span) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    /// Cumulative-weight pick. Weights are expected to sum to 1;
    /// rounding leftovers land on the last entry.
    pub fn weighted<T: Copy>(&mut self, table: &[(T, f64)]) -> T {
        let roll = self.next_f64();
        let mut cumulative = 0.0;
        for (item, weight) in table {
            cumulative += weight;
            if roll < cumulative {
                return *item;
            }
        }
        table[table.len() - 1].0
    }

    /// Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_u64_below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Clients = 0,
    Cases = 1,
    Notes = 2,
    Split = 3,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Cases => "cases",
            Self::Notes => "notes",
            Self::Split => "split",
        }
    }
}
