//! Deterministic PRNG: every draw is a pure function of the seed string.

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RngError {
    #[error("cannot pick from an empty sequence")]
    EmptySequence,
}

/// xorshift128+ stream seeded from SHA-256 of a seed string.
///
/// The exact `next_u32` sequence per seed is load-bearing: replay
/// verification reconstructs matches against it.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    seed: String,
    s0: u64,
    s1: u64,
}

impl DeterministicRng {
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let digest = Sha256::digest(seed.as_bytes());
        let mut b0 = [0u8; 8];
        let mut b1 = [0u8; 8];
        b0.copy_from_slice(&digest[0..8]);
        b1.copy_from_slice(&digest[8..16]);
        let mut s0 = u64::from_be_bytes(b0);
        let mut s1 = u64::from_be_bytes(b1);
        // xorshift state must not be all-zero
        if s0 == 0 {
            s0 = 1;
        }
        if s1 == 0 {
            s1 = 1;
        }
        Self { seed, s0, s1 }
    }

    /// The seed string this stream was created from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// One xorshift128+ step, truncated to 32 bits.
    pub fn next_u32(&mut self) -> u32 {
        let mut s1 = self.s0;
        let s0 = self.s1;
        self.s0 = s0;
        s1 ^= s1 << 23;
        s1 ^= s1 >> 18;
        s1 ^= s0;
        s1 ^= s0 >> 5;
        self.s1 = s1;
        (s0.wrapping_add(s1) & 0xffff_ffff) as u32
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / (u64::from(u32::MAX) + 1) as f64
    }

    /// Uniform element of `xs`.
    pub fn pick<'a, T>(&mut self, xs: &'a [T]) -> Result<&'a T, RngError> {
        if xs.is_empty() {
            return Err(RngError::EmptySequence);
        }
        let idx = (self.next_f64() * xs.len() as f64) as usize;
        // next_f64 < 1.0, so idx < len; the min guards the boundary anyway
        Ok(&xs[idx.min(xs.len() - 1)])
    }

    /// Fisher-Yates over a copy; the input is untouched.
    pub fn shuffle<T: Clone>(&mut self, xs: &[T]) -> Vec<T> {
        let mut out = xs.to_vec();
        for i in (1..out.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64) as usize;
            out.swap(i, j.min(i));
        }
        out
    }

    /// Labeled substream seeded from `"{seed}:{label}"`.
    ///
    /// Forks depend only on the seed string, never on how far the parent
    /// stream has advanced, so internal refactoring of draw order cannot
    /// shift them.
    pub fn fork(&self, label: &str) -> DeterministicRng {
        DeterministicRng::new(format!("{}:{}", self.seed, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let mut a = DeterministicRng::new("abc");
        let mut b = DeterministicRng::new("abc");
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = DeterministicRng::new("abc");
        let mut b = DeterministicRng::new("abd");
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = DeterministicRng::new("unit");
        for _ in 0..10_000 {
            let f = rng.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn pick_from_empty_fails() {
        let mut rng = DeterministicRng::new("empty");
        let xs: Vec<u8> = vec![];
        assert_eq!(rng.pick(&xs).unwrap_err(), RngError::EmptySequence);
    }

    #[test]
    fn pick_covers_all_elements_eventually() {
        let mut rng = DeterministicRng::new("cover");
        let xs = [0usize, 1, 2, 3];
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[*rng.pick(&xs).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn shuffle_is_a_permutation_and_leaves_input_untouched() {
        let mut rng = DeterministicRng::new("shuffle");
        let xs: Vec<u32> = (0..52).collect();
        let shuffled = rng.shuffle(&xs);
        assert_eq!(xs, (0..52).collect::<Vec<u32>>());
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, xs);
        assert_ne!(shuffled, xs); // 52! makes identity astronomically unlikely
    }

    #[test]
    fn shuffle_is_deterministic_per_seed() {
        let xs: Vec<u32> = (0..52).collect();
        let a = DeterministicRng::new("deck").shuffle(&xs);
        let b = DeterministicRng::new("deck").shuffle(&xs);
        assert_eq!(a, b);
    }

    #[test]
    fn fork_is_independent_of_parent_position() {
        let parent = DeterministicRng::new("base");
        let mut advanced = DeterministicRng::new("base");
        for _ in 0..100 {
            advanced.next_u32();
        }
        let mut f1 = parent.fork("hand:1");
        let mut f2 = advanced.fork("hand:1");
        for _ in 0..32 {
            assert_eq!(f1.next_u32(), f2.next_u32());
        }
    }

    #[test]
    fn fork_matches_explicit_concatenation() {
        let mut forked = DeterministicRng::new("base").fork("label");
        let mut direct = DeterministicRng::new("base:label");
        for _ in 0..32 {
            assert_eq!(forked.next_u32(), direct.next_u32());
        }
    }
}
