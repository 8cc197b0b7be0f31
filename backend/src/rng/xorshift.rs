//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for simulation purposes.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence of dice rolls and event draws. A saved game
//! stores the current state so a restored game continues the same sequence.

use serde::{Deserialize, Serialize};

use super::DiceSource;

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use kanban_sim_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let die = rng.roll_die(); // [1, 6]
/// assert!((1..=6).contains(&die));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is replaced by 1 (xorshift cannot leave the zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Roll a six-sided die: value in [1, 6]
    pub fn roll_die(&mut self) -> u32 {
        self.range(1, 7) as u32
    }

    /// Get current RNG state (for checkpointing/replay)
    ///
    /// # Example
    /// ```
    /// use kanban_sim_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// rng.next();
    ///
    /// let mut resumed = RngManager::new(rng.get_state());
    /// assert_eq!(rng.next(), resumed.next());
    /// ```
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) by dividing by 2^53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }
}

impl DiceSource for RngManager {
    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn roll_d6(&mut self) -> u32 {
        self.roll_die()
    }

    fn next_f64(&mut self) -> f64 {
        RngManager::next_f64(self)
    }

    fn state(&self) -> Option<u64> {
        Some(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = RngManager::new(12345);
        rng.range(100, 50);
    }

    #[test]
    fn test_roll_die_covers_all_faces() {
        let mut rng = RngManager::new(777);
        let mut seen = [false; 6];

        for _ in 0..1000 {
            let face = rng.roll_die();
            assert!((1..=6).contains(&face), "die produced {}", face);
            seen[(face - 1) as usize] = true;
        }

        assert!(seen.iter().all(|s| *s), "every face should appear in 1000 rolls");
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn test_trait_and_inherent_draws_agree() {
        let mut a = RngManager::new(99999);
        let mut b = RngManager::new(99999);

        for _ in 0..100 {
            assert_eq!(a.roll_die(), DiceSource::roll_d6(&mut b));
            assert_eq!(a.next_f64(), DiceSource::next_f64(&mut b));
        }
    }
}
