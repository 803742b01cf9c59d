//! Uniform file-index sampling.

use super::FileIndexGenerator;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// `i = rand_int(0, max_files)`, independent of `is_create` (§4.2).
pub struct UniformGenerator {
    rng: Xoshiro256PlusPlus,
}

impl UniformGenerator {
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Default for UniformGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIndexGenerator for UniformGenerator {
    fn next_index(&mut self, max_files: u64, _is_create: bool) -> u64 {
        if max_files == 0 {
            return 0;
        }
        self.rng.gen_range(0..max_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range() {
        let mut gen = UniformGenerator::with_seed(1);
        for _ in 0..1000 {
            let i = gen.next_index(37, false);
            assert!(i < 37);
        }
    }

    #[test]
    fn zero_max_files_returns_zero() {
        let mut gen = UniformGenerator::new();
        assert_eq!(gen.next_index(0, false), 0);
    }

    #[test]
    fn covers_full_range_given_enough_samples() {
        let mut gen = UniformGenerator::with_seed(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5000 {
            seen.insert(gen.next_index(10, false));
        }
        assert_eq!(seen.len(), 10);
    }
}
