//! Financial ledger
//!
//! Running revenue and cost totals for the lifetime of one game, the late
//! penalty rule and the win/loss evaluation.
//!
//! Profit is never stored: it is always `total_revenue - total_costs`.

use serde::{Deserialize, Serialize};

use crate::models::task::{Stage, Task};

/// Lifetime totals; reset only by a new game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    total_revenue: i64,
    total_costs: i64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted totals
    pub fn from_totals(total_revenue: i64, total_costs: i64) -> Self {
        Self {
            total_revenue,
            total_costs,
        }
    }

    pub fn total_revenue(&self) -> i64 {
        self.total_revenue
    }

    pub fn total_costs(&self) -> i64 {
        self.total_costs
    }

    pub fn profit(&self) -> i64 {
        self.total_revenue - self.total_costs
    }

    /// Add one day's book to the totals
    pub fn post(&mut self, book: &DayBook) {
        self.total_revenue += book.revenue;
        self.total_costs += book.costs;
    }
}

/// Revenue and costs booked during a single day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayBook {
    pub revenue: i64,
    pub costs: i64,
}

impl DayBook {
    pub fn charge(&mut self, amount: i64) {
        self.costs += amount;
    }

    pub fn credit(&mut self, amount: i64) {
        self.revenue += amount;
    }
}

/// Late penalty owed on `day`: `penalty_per_day` for every day each task is
/// past its due date
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{ledger, Task, TaskType, WorkAmounts};
///
/// let task = Task::new("t".into(), "t".into(), TaskType::RoadEarthwork, WorkAmounts::default())
///     .with_fixed_date(3);
/// assert_eq!(ledger::late_penalty(&[task], 5, 2_000), 4_000);
/// ```
pub fn late_penalty(tasks: &[Task], day: u32, penalty_per_day: i64) -> i64 {
    tasks
        .iter()
        .map(|t| i64::from(t.days_late(day)) * penalty_per_day)
        .sum()
}

/// Win/loss flags derived from the board and the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub game_over: bool,
    pub game_won: bool,
}

/// Won: every task done and money above zero. Lost: money at or below zero.
pub fn evaluate(tasks: &[Task], money: i64) -> Outcome {
    let all_done = !tasks.is_empty() && tasks.iter().all(|t| t.stage() == Stage::Done);

    Outcome {
        game_over: money <= 0,
        game_won: all_done && money > 0,
    }
}
