//! Pluggable randomness for identity, proxy, nonce and jitter draws.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of uniform random integers.
pub trait RandomSource: Send + Sync {
    /// Uniform value in `0..upper`. Returns 0 when `upper` is 0.
    fn below(&self, upper: u64) -> u64;

    /// Uniform index into a slice of length `len`.
    fn index(&self, len: usize) -> usize {
        self.below(len as u64) as usize
    }
}

/// Thread-local RNG backed source.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Deterministic source that cycles through a fixed list of values.
///
/// Each value is reduced modulo the requested bound.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<u64>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<u64>>) -> Self {
        Self {
            values: values.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Source that always yields zero.
    pub fn zeros() -> Self {
        Self::new(vec![0])
    }
}

impl RandomSource for SequenceRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 || self.values.is_empty() {
            return 0;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[i] % upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_in_range() {
        let rng = ThreadRandom;
        for _ in 0..1000 {
            assert!(rng.below(7) < 7);
        }
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn test_sequence_cycles() {
        let rng = SequenceRandom::new(vec![1, 5, 9]);
        assert_eq!(rng.below(10), 1);
        assert_eq!(rng.below(10), 5);
        assert_eq!(rng.below(4), 1); // 9 % 4
        assert_eq!(rng.below(10), 1);
        assert_eq!(rng.index(3), 2);
    }
}
