use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic data generator seeded for reproducible benchmarks.
///
/// One generator lives per session and is passed to whatever needs input
/// data. There is no global RNG.
pub struct DataGenerator {
    rng: StdRng,
}

impl DataGenerator {
    /// Create a new generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` u32 values uniformly distributed in `[0, upper]`.
    pub fn bounded_u32(&mut self, count: usize, upper: u32) -> Vec<u32> {
        (0..count).map(|_| self.rng.gen_range(0..=upper)).collect()
    }

    /// Generate `count` values whose exact sum fits in a u32: each value is
    /// at most `u32::MAX / count`.
    pub fn summable_u32(&mut self, count: usize) -> Vec<u32> {
        if count == 0 {
            return Vec::new();
        }
        let upper = (u32::MAX as usize / count) as u32;
        self.bounded_u32(count, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_u32() {
        let a = DataGenerator::new(42).summable_u32(100);
        let b = DataGenerator::new(42).summable_u32(100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_correct_count() {
        let mut gen = DataGenerator::new(0);
        assert_eq!(gen.bounded_u32(1000, 10).len(), 1000);
        assert!(gen.summable_u32(0).is_empty());
    }

    #[test]
    fn test_bounded_range() {
        let data = DataGenerator::new(123).bounded_u32(10_000, 17);
        assert!(data.iter().all(|&v| v <= 17));
        assert!(data.iter().any(|&v| v == 17));
    }

    #[test]
    fn test_summable_never_overflows() {
        let data = DataGenerator::new(42).summable_u32(1_000);
        let total: u64 = data.iter().map(|&v| v as u64).sum();
        assert!(total <= u32::MAX as u64);
    }

    #[test]
    fn test_different_seeds() {
        let a = DataGenerator::new(1).summable_u32(100);
        let b = DataGenerator::new(2).summable_u32(100);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_calls_differ() {
        let mut gen = DataGenerator::new(42);
        let a = gen.summable_u32(100);
        let b = gen.summable_u32(100);
        assert_ne!(a, b, "Sequential calls should produce different data");
    }
}
