//! Capacity pool model
//!
//! Five non-negative counters holding the day's tradeable work units.
//! The pool is regenerated in full every day; unused units do not carry over.
//!
//! CRITICAL: counters are unsigned and every withdrawal is checked, so a
//! channel can never go below zero.

use serde::{Deserialize, Serialize};

use crate::models::task::Channel;

/// The day's capacity across all five channels
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{CapacityPool, Channel};
///
/// let mut pool = CapacityPool::new(9, 4, 12, 6, 2);
/// assert!(pool.withdraw(Channel::Smr, 5));
/// assert_eq!(pool.get(Channel::Smr), 7);
/// assert!(!pool.withdraw(Channel::Hse, 3)); // only 2 available
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapacityPool {
    pub rd: u32,
    pub geo: u32,
    pub smr: u32,
    pub lab: u32,
    pub hse: u32,
}

impl CapacityPool {
    pub const fn new(rd: u32, geo: u32, smr: u32, lab: u32, hse: u32) -> Self {
        Self { rd, geo, smr, lab, hse }
    }

    /// Units available on a channel
    pub fn get(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Rd => self.rd,
            Channel::Geo => self.geo,
            Channel::Smr => self.smr,
            Channel::Lab => self.lab,
            Channel::Hse => self.hse,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut u32 {
        match channel {
            Channel::Rd => &mut self.rd,
            Channel::Geo => &mut self.geo,
            Channel::Smr => &mut self.smr,
            Channel::Lab => &mut self.lab,
            Channel::Hse => &mut self.hse,
        }
    }

    /// True if at least `amount` units are available on `channel`
    pub fn can_afford(&self, channel: Channel, amount: u32) -> bool {
        self.get(channel) >= amount
    }

    /// Remove `amount` units; returns false (and changes nothing) if short
    pub fn withdraw(&mut self, channel: Channel, amount: u32) -> bool {
        let slot = self.slot_mut(channel);
        match slot.checked_sub(amount) {
            Some(left) => {
                *slot = left;
                true
            }
            None => false,
        }
    }

    /// Add units to a channel
    pub fn deposit(&mut self, channel: Channel, amount: u32) {
        let slot = self.slot_mut(channel);
        *slot = slot.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_rejects_overdraw() {
        let mut pool = CapacityPool::new(3, 0, 0, 0, 2);
        assert!(!pool.withdraw(Channel::Rd, 4));
        assert_eq!(pool.rd, 3, "failed withdrawal must not touch the pool");
        assert!(pool.withdraw(Channel::Rd, 3));
        assert_eq!(pool.rd, 0);
    }

    #[test]
    fn test_deposit_adds_to_channel() {
        let mut pool = CapacityPool::default();
        pool.deposit(Channel::Lab, 4);
        pool.deposit(Channel::Lab, 2);
        assert_eq!(pool.lab, 6);
        assert_eq!(pool.get(Channel::Hse), 0);
    }
}
