//! Deterministic random number generation for synthetic datasets.
//!
//! RULE: generated data never touches a platform RNG. Every stream is
//! derived from a single seed, so the same seed always yields the same
//! payload, byte for byte.
//!
//! Each generator stream (profiles, transactions, loans, cards) gets its
//! own RNG seeded from (seed XOR stream_index), so changing how many draws
//! one stream makes never shifts another stream's values.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single generator stream.
pub struct DeskRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl DeskRng {
    pub fn new(seed: u64, stream: Stream) -> Self {
        let derived_seed = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: stream.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [lo, hi] (inclusive).
    pub fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(hi >= lo, "empty range {lo}..={hi}");
        lo + self.next_u64_below((hi - lo + 1) as u64) as i64
    }

    /// Roll a float in [lo, hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Profile = 0,
    Transaction = 1,
    Loan = 2,
    Card = 3,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Transaction => "transaction",
            Self::Loan => "loan",
            Self::Card => "card",
        }
    }
}
