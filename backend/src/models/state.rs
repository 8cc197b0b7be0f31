//! Game State
//!
//! The complete state of one game: the board, the clock, the balance, the
//! day's capacity and the append-only logs.
//!
//! # Critical Invariants
//!
//! 1. **Single source of truth**: `GameState` is the sole unit of persistence
//! 2. **Append-only logs**: `history` and `events` only grow (except
//!    `clear_history`)
//! 3. **Unique task ids**: every task id appears exactly once
//! 4. **Loss latch**: once `game_over` is set it is never cleared for this game

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::GameEvent;
use crate::models::capacity::CapacityPool;
use crate::models::task::{Stage, SubStage, Task};

/// Per-day trend snapshot
///
/// Used for reporting only; the engine never reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub day: u32,
    pub money: i64,

    /// Cumulative revenue as of this day
    pub revenue: i64,

    /// Cumulative costs as of this day
    pub costs: i64,

    /// `revenue - costs`
    pub profit: i64,

    /// Task count per stage wire name
    pub column_distribution: BTreeMap<String, usize>,
}

/// Count tasks per stage; every stage is present, empty ones with 0
pub fn stage_distribution(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut distribution: BTreeMap<String, usize> = Stage::ALL
        .iter()
        .map(|stage| (stage.as_str().to_string(), 0))
        .collect();

    for task in tasks {
        *distribution
            .entry(task.stage().as_str().to_string())
            .or_default() += 1;
    }

    distribution
}

/// Complete game state
///
/// # Example
///
/// ```rust
/// use kanban_sim_core_rs::{catalog, CapacityPool, GameConfig, GameState, Stage};
///
/// let config = GameConfig::default();
/// let state = GameState::new(catalog::seed_tasks(&config), config.initial_money, CapacityPool::default());
///
/// assert_eq!(state.day(), 0);
/// assert_eq!(state.money(), 50_000);
/// assert_eq!(state.count_in(Stage::Backlog), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    tasks: Vec<Task>,
    day: u32,

    /// May go negative before the loss is latched
    money: i64,

    capacity: CapacityPool,

    #[serde(default)]
    history: Vec<HistoryEntry>,

    #[serde(default)]
    events: Vec<GameEvent>,

    #[serde(default)]
    game_over: bool,

    #[serde(default)]
    game_won: bool,
}

impl GameState {
    /// Create a day-0 state
    pub fn new(tasks: Vec<Task>, money: i64, capacity: CapacityPool) -> Self {
        Self {
            tasks,
            day: 0,
            money,
            capacity,
            history: Vec::new(),
            events: Vec::new(),
            game_over: false,
            game_won: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id() == id)
    }

    /// Borrow one task and the pool together
    pub fn task_and_capacity_mut(&mut self, id: &str) -> Option<(&mut Task, &mut CapacityPool)> {
        let task = self.tasks.iter_mut().find(|t| t.id() == id)?;
        Some((task, &mut self.capacity))
    }

    /// Borrow the task list and the pool together
    pub fn tasks_and_capacity_mut(&mut self) -> (&mut [Task], &mut CapacityPool) {
        (&mut self.tasks, &mut self.capacity)
    }

    /// Tasks at a given stage and sub-stage, in task order
    pub fn tasks_in(&self, stage: Stage, sub_stage: SubStage) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.is_at(stage, sub_stage))
    }

    /// Number of tasks in a stage (both slots)
    pub fn count_in(&self, stage: Stage) -> usize {
        self.tasks.iter().filter(|t| t.stage() == stage).count()
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn capacity(&self) -> &CapacityPool {
        &self.capacity
    }

    pub fn capacity_mut(&mut self) -> &mut CapacityPool {
        &mut self.capacity
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn game_won(&self) -> bool {
        self.game_won
    }

    /// True once the game is lost or won
    pub fn is_concluded(&self) -> bool {
        self.game_over || self.game_won
    }

    pub fn stage_distribution(&self) -> BTreeMap<String, usize> {
        stage_distribution(&self.tasks)
    }

    // ========================================================================
    // Mutation (engine only)
    // ========================================================================

    pub fn set_day(&mut self, day: u32) {
        self.day = day;
    }

    pub fn set_money(&mut self, money: i64) {
        self.money = money;
    }

    pub fn set_capacity(&mut self, capacity: CapacityPool) {
        self.capacity = capacity;
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Set the outcome flags; a latched loss is never cleared
    pub fn set_outcome(&mut self, game_over: bool, game_won: bool) {
        self.game_over = self.game_over || game_over;
        self.game_won = game_won;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::orchestrator::GameConfig;

    fn fresh() -> GameState {
        let config = GameConfig::default();
        GameState::new(catalog::seed_tasks(&config), 50_000, CapacityPool::default())
    }

    #[test]
    fn test_distribution_lists_every_stage() {
        let state = fresh();
        let distribution = state.stage_distribution();

        assert_eq!(distribution.len(), Stage::ALL.len());
        assert_eq!(distribution["backlog"], 10);
        assert_eq!(distribution["expedite"], 0);
    }

    #[test]
    fn test_loss_latch_is_sticky() {
        let mut state = fresh();
        state.set_outcome(true, false);
        state.set_outcome(false, false);
        assert!(state.game_over());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(fresh()).unwrap();
        assert!(json["tasks"].is_array());
        assert_eq!(json["gameOver"], false);
        assert_eq!(json["gameWon"], false);
        assert_eq!(json["capacity"]["hse"], 0);
    }
}
