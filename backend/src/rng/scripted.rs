//! Scripted dice for tests and replays.
//!
//! Queued values are consumed first; once a queue runs dry the draw falls
//! back to a seeded [`RngManager`], so a script only has to pin the rolls a
//! scenario cares about.

use std::collections::VecDeque;

use super::{DiceSource, RngManager};

/// A [`DiceSource`] that replays queued rolls, draws and picks.
///
/// # Example
/// ```
/// use kanban_sim_core_rs::rng::{DiceSource, ScriptedDice};
///
/// let mut dice = ScriptedDice::new(1).with_rolls([6, 1]).with_draws([0.95]);
/// assert_eq!(dice.roll_d6(), 6);
/// assert_eq!(dice.roll_d6(), 1);
/// assert_eq!(dice.next_f64(), 0.95);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    draws: VecDeque<f64>,
    picks: VecDeque<usize>,
    fallback: RngManager,
}

impl ScriptedDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rolls: VecDeque::new(),
            draws: VecDeque::new(),
            picks: VecDeque::new(),
            fallback: RngManager::new(seed),
        }
    }

    /// Queue die faces. Values are clamped into `1..=6`.
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = u32>) -> Self {
        self.rolls
            .extend(rolls.into_iter().map(|face| face.clamp(1, 6)));
        self
    }

    /// Queue uniform draws (event chance checks).
    pub fn with_draws(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.draws.extend(draws);
        self
    }

    /// Queue picks (event type index, event target index).
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// Number of queued values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rolls.len() + self.draws.len() + self.picks.len()
    }
}

impl DiceSource for ScriptedDice {
    fn next_u64(&mut self) -> u64 {
        self.fallback.next()
    }

    fn roll_d6(&mut self) -> u32 {
        match self.rolls.pop_front() {
            Some(face) => face,
            None => self.fallback.roll_die(),
        }
    }

    fn next_f64(&mut self) -> f64 {
        match self.draws.pop_front() {
            Some(draw) => draw,
            None => self.fallback.next_f64(),
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty set");
        match self.picks.pop_front() {
            Some(index) => index % len,
            None => (self.fallback.next() % len as u64) as usize,
        }
    }
}
