//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the game (dice, event draws, event targets,
//! event identities) MUST go through a [`DiceSource`].
//!
//! The engine only ever talks to the trait, so tests can substitute a
//! [`ScriptedDice`] to force exact dice rolls and event draws.

mod scripted;
mod xorshift;

pub use scripted::ScriptedDice;
pub use xorshift::RngManager;

/// Source of every random decision the engine makes.
///
/// Implementors only need [`DiceSource::next_u64`]; the derived draws have
/// default implementations built on it.
pub trait DiceSource: Send {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Six-sided die roll in `1..=6`.
    fn roll_d6(&mut self) -> u32 {
        (self.next_u64() % 6) as u32 + 1
    }

    /// Uniform draw in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform index in `[0, len)`.
    ///
    /// # Panics
    /// Panics if `len == 0`.
    fn pick(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty set");
        (self.next_u64() % len as u64) as usize
    }

    /// Internal state for checkpointing, if the source can be resumed.
    fn state(&self) -> Option<u64> {
        None
    }
}
