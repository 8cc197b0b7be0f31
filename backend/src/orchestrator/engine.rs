//! Game Engine - day cycle orchestration
//!
//! Owns one game and is the single mutation gateway for it:
//! - Day tick (capacity, events, finances, pipeline, outcome, history)
//! - Operator actions (spend, move, auto-distribute, unblock, convert)
//! - Lifecycle (new game, restore from the persisted mirror)
//!
//! # Architecture
//!
//! `next_day` runs a fixed pipeline of steps over a draft copy of the state
//! and commits the draft in one assignment:
//!
//! ```text
//! For each day d:
//! 1. Abort if the game is over or won
//! 2. Regenerate the capacity pool
//! 3. Draw an event, log it, apply its effect
//! 4. Charge the daily overhead
//! 5. Charge late penalties
//! 6. Count curing down (release to lab Ready at 0)
//! 7. Promote dependency-satisfied backlog tasks to rd Ready
//! 8. Start Ready work within WIP limits
//! 9. Advance tasks whose active channel is complete
//! 10. Evaluate win / loss
//! 11. Append the history snapshot
//! 12. Commit
//! ```
//!
//! # Example
//!
//! ```rust
//! use kanban_sim_core_rs::{GameConfig, GameEngine};
//!
//! let mut engine = GameEngine::new(GameConfig::default()).unwrap();
//! assert_eq!(engine.state().day(), 0);
//!
//! let result = engine.next_day().unwrap();
//! assert_eq!(result.day, 1);
//! assert_eq!(engine.state().day(), 1);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capacity::{self, Allocation, CapacityError};
use crate::catalog;
use crate::events::{self, EventType};
use crate::ledger::{self, DayBook, Ledger};
use crate::models::state::{stage_distribution, GameState, HistoryEntry};
use crate::models::task::{Channel, Stage, SubStage, Task};
use crate::orchestrator::checkpoint::{self, RestoreOutcome};
use crate::orchestrator::store::{SnapshotStore, StoreError};
use crate::pipeline::{self, MoveError, UnblockCost, UnblockError};
use crate::rng::{DiceSource, RngManager};

// ============================================================================
// Configuration Types
// ============================================================================

/// Every tunable constant of a game
///
/// Missing fields in a JSON config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the deterministic random source
    pub rng_seed: u64,

    pub initial_money: i64,
    pub daily_overhead: i64,

    /// Cost per task per day past its due date
    pub penalty_per_day: i64,

    pub revenue_on_acceptance: i64,
    pub revenue_on_done: i64,

    /// Bridge pier curing delay
    pub curing_days: u32,

    /// Chance that a day draws an event, in [0, 1]
    pub event_probability: f64,

    pub equipment_bonus: u32,

    /// Heavy rain smr reduction, in percent
    pub rain_reduction_pct: u32,

    /// Rd needed to clear a design error
    pub design_error_unblock: u32,

    /// Hse needed to clear a safety violation
    pub safety_unblock: u32,

    /// Due date stamped on expedited tasks that have none, in days from
    /// the event
    pub urgent_visit_due_days: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: 12345,
            initial_money: 50_000,
            daily_overhead: 500,
            penalty_per_day: 2_000,
            revenue_on_acceptance: 5_000,
            revenue_on_done: 10_000,
            curing_days: 3,
            event_probability: 0.3,
            equipment_bonus: 5,
            rain_reduction_pct: 80,
            design_error_unblock: 5,
            safety_unblock: 2,
            urgent_visit_due_days: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err(GameError::InvalidConfig(format!(
                "event_probability must be in [0, 1], got {}",
                self.event_probability
            )));
        }
        if self.rain_reduction_pct > 100 {
            return Err(GameError::InvalidConfig(format!(
                "rain_reduction_pct must be at most 100, got {}",
                self.rain_reduction_pct
            )));
        }
        if self.initial_money <= 0 {
            return Err(GameError::InvalidConfig(
                "initial_money must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn unblock_cost(&self) -> UnblockCost {
        UnblockCost {
            design_error: self.design_error_unblock,
            safety_violation: self.safety_unblock,
        }
    }
}

/// Game-level failures
///
/// Only state construction and persistence of a new game surface here;
/// rejected operator actions use their own error types.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Result of a single day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayResult {
    /// Day number just committed
    pub day: u32,

    /// Event fired today, if any
    pub event: Option<EventType>,

    /// Tasks promoted from the backlog
    pub promoted: Vec<String>,

    /// Tasks that moved from Ready to Doing
    pub started: Vec<String>,

    /// Tasks that moved to another stage
    pub advanced: Vec<String>,

    /// Tasks that finished smr and started curing
    pub curing_started: Vec<String>,

    /// Tasks that reached done
    pub completed: Vec<String>,

    /// Tasks released from curing
    pub released: Vec<String>,

    pub revenue: i64,
    pub costs: i64,

    /// Balance after the day
    pub money: i64,

    pub game_over: bool,
    pub game_won: bool,
}

// ============================================================================
// Day Draft
// ============================================================================

/// Working copy of one day tick
///
/// Every step consumes the draft and returns it, so the day reads as a
/// chain of transformations and the live state is only touched by
/// `commit`.
struct DayDraft {
    state: GameState,
    ledger: Ledger,
    book: DayBook,
    result: DayResult,
}

impl DayDraft {
    fn begin(state: &GameState, ledger: &Ledger) -> Self {
        let day = state.day() + 1;
        Self {
            state: state.clone(),
            ledger: *ledger,
            book: DayBook::default(),
            result: DayResult {
                day,
                event: None,
                promoted: Vec::new(),
                started: Vec::new(),
                advanced: Vec::new(),
                curing_started: Vec::new(),
                completed: Vec::new(),
                released: Vec::new(),
                revenue: 0,
                costs: 0,
                money: state.money(),
                game_over: false,
                game_won: false,
            },
        }
    }

    fn regenerate_capacity(mut self, dice: &mut dyn DiceSource) -> Self {
        self.state.set_capacity(capacity::regenerate(dice));
        self
    }

    fn draw_event(mut self, config: &GameConfig, dice: &mut dyn DiceSource) -> Self {
        let day = self.result.day;
        if let Some(event) = events::draw_event(self.state.tasks(), day, config, dice) {
            let (tasks, pool) = self.state.tasks_and_capacity_mut();
            events::apply_event(&event, tasks, pool, config);
            self.result.event = Some(event.event_type);
            self.state.push_event(event);
        }
        self
    }

    fn charge(&mut self, amount: i64) {
        self.book.charge(amount);
        self.state.set_money(self.state.money() - amount);
    }

    fn charge_overhead(mut self, config: &GameConfig) -> Self {
        self.charge(config.daily_overhead);
        self
    }

    fn charge_late_penalties(mut self, config: &GameConfig) -> Self {
        let penalty = ledger::late_penalty(self.state.tasks(), self.result.day, config.penalty_per_day);
        if penalty > 0 {
            debug!(day = self.result.day, penalty, "late penalties charged");
            self.charge(penalty);
        }
        self
    }

    fn tick_curing(mut self) -> Self {
        self.result.released = pipeline::tick_curing(self.state.tasks_mut());
        self
    }

    fn promote_backlog(mut self) -> Self {
        self.result.promoted = pipeline::promote_backlog(self.state.tasks_mut());
        self
    }

    fn start_ready_work(mut self) -> Self {
        self.result.started = pipeline::start_ready_work(self.state.tasks_mut());
        self
    }

    fn advance_completed(mut self, config: &GameConfig) -> Self {
        let report =
            pipeline::advance_completed(self.state.tasks_mut(), self.result.day, config.curing_days);
        self.book.credit(report.revenue);
        self.state.set_money(self.state.money() + report.revenue);
        self.result.advanced = report.advanced;
        self.result.curing_started = report.curing_started;
        self.result.completed = report.completed;
        self
    }

    fn evaluate_outcome(mut self) -> Self {
        let outcome = ledger::evaluate(self.state.tasks(), self.state.money());
        self.state.set_outcome(outcome.game_over, outcome.game_won);
        self
    }

    fn record_history(mut self) -> Self {
        self.ledger.post(&self.book);
        let entry = HistoryEntry {
            day: self.result.day,
            money: self.state.money(),
            revenue: self.ledger.total_revenue(),
            costs: self.ledger.total_costs(),
            profit: self.ledger.profit(),
            column_distribution: self.state.stage_distribution(),
        };
        self.state.push_history(entry);
        self
    }

    fn commit(mut self, state: &mut GameState, ledger: &mut Ledger) -> DayResult {
        self.state.set_day(self.result.day);

        self.result.revenue = self.book.revenue;
        self.result.costs = self.book.costs;
        self.result.money = self.state.money();
        self.result.game_over = self.state.game_over();
        self.result.game_won = self.state.game_won();

        *state = self.state;
        *ledger = self.ledger;
        self.result
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One game, behind a single mutation gateway
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    ledger: Ledger,
    dice: Box<dyn DiceSource>,

    /// Best-effort persisted mirror
    store: Option<Box<dyn SnapshotStore>>,
}

/// Clear `store`, then write `payload` into it
fn overwrite(store: &mut dyn SnapshotStore, payload: &str) -> Result<(), GameError> {
    store.clear()?;
    store.save(payload)?;
    Ok(())
}

/// Build the day-0 state: seed tasks, a rolled pool, one history entry
fn initial_state(config: &GameConfig, dice: &mut dyn DiceSource) -> GameState {
    let tasks = catalog::seed_tasks(config);
    let pool = capacity::regenerate(dice);
    let distribution = stage_distribution(&tasks);

    let mut state = GameState::new(tasks, config.initial_money, pool);
    state.push_history(HistoryEntry {
        day: 0,
        money: config.initial_money,
        revenue: 0,
        costs: 0,
        profit: 0,
        column_distribution: distribution,
    });
    state
}

impl GameEngine {
    /// Create a new game seeded from `config.rng_seed`
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let dice = Box::new(RngManager::new(config.rng_seed));
        Self::with_dice(config, dice)
    }

    /// Create a new game drawing from an injected random source
    pub fn with_dice(config: GameConfig, mut dice: Box<dyn DiceSource>) -> Result<Self, GameError> {
        config.validate()?;

        let state = initial_state(&config, dice.as_mut());
        info!(
            tasks = state.tasks().len(),
            money = state.money(),
            "new game created"
        );

        Ok(Self {
            config,
            state,
            ledger: Ledger::new(),
            dice,
            store: None,
        })
    }

    /// Rehydrate a game from `store`, or start a fresh one
    ///
    /// A missing, empty or corrupt record yields a fresh game; the store is
    /// then brought in line with it.
    pub fn restore(config: GameConfig, mut store: Box<dyn SnapshotStore>) -> Result<Self, GameError> {
        config.validate()?;

        let mut engine = match checkpoint::rehydrate(store.as_mut()) {
            RestoreOutcome::Restored(record) => {
                let seed = record.rng_state.unwrap_or(config.rng_seed);
                info!(day = record.state.day(), money = record.state.money(), "game restored");
                Self {
                    ledger: record.ledger(),
                    state: record.state,
                    config,
                    dice: Box::new(RngManager::new(seed)),
                    store: None,
                }
            }
            RestoreOutcome::Missing => {
                info!("no stored game, starting a fresh one");
                Self::new(config)?
            }
            RestoreOutcome::Discarded(_) | RestoreOutcome::Cleared(_) => Self::new(config)?,
        };

        engine.attach_store(store);
        Ok(engine)
    }

    /// Start a fresh game seeded from `config.rng_seed`, replacing whatever
    /// `store` held
    ///
    /// The store is cleared and rewritten before returning; a store failure
    /// is reported.
    pub fn create(config: GameConfig, mut store: Box<dyn SnapshotStore>) -> Result<Self, GameError> {
        let mut engine = Self::new(config)?;
        overwrite(store.as_mut(), &engine.snapshot()?)?;
        engine.store = Some(store);
        Ok(engine)
    }

    /// Mirror this game into `store` from now on
    pub fn attach_store(&mut self, store: Box<dyn SnapshotStore>) {
        self.store = Some(store);
        self.persist();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Get mutable access to the state (tests and tooling)
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn profit(&self) -> i64 {
        self.ledger.profit()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.task(id)
    }

    /// Random source state, if the source can be resumed
    pub fn rng_state(&self) -> Option<u64> {
        self.dice.state()
    }

    /// Serialize the game into a persisted record
    pub fn snapshot(&self) -> Result<String, GameError> {
        checkpoint::encode(&self.state, &self.ledger, self.dice.state())
    }

    // ========================================================================
    // Day Cycle
    // ========================================================================

    /// Advance one day
    ///
    /// Returns `None` (and changes nothing) once the game is over or won.
    pub fn next_day(&mut self) -> Option<DayResult> {
        if self.state.is_concluded() {
            debug!(day = self.state.day(), "game concluded, day not advanced");
            return None;
        }

        let config = &self.config;
        let dice = self.dice.as_mut();

        let result = DayDraft::begin(&self.state, &self.ledger)
            .regenerate_capacity(dice)
            .draw_event(config, dice)
            .charge_overhead(config)
            .charge_late_penalties(config)
            .tick_curing()
            .promote_backlog()
            .start_ready_work()
            .advance_completed(config)
            .evaluate_outcome()
            .record_history()
            .commit(&mut self.state, &mut self.ledger);

        info!(
            day = result.day,
            money = result.money,
            event = result.event.map(|e| e.as_str()),
            advanced = result.advanced.len(),
            "day completed"
        );
        if result.game_over {
            info!(day = result.day, "game over");
        } else if result.game_won {
            info!(day = result.day, "game won");
        }

        self.persist();
        Some(result)
    }

    // ========================================================================
    // Operator Actions
    // ========================================================================

    /// Spend capacity on a task; returns whether it was applied
    pub fn spend_capacity(&mut self, task_id: &str, channel: Channel, amount: u32) -> bool {
        match self.try_spend_capacity(task_id, channel, amount) {
            Ok(_) => true,
            Err(e) => {
                debug!(task = task_id, %channel, amount, reason = %e, "spend rejected");
                false
            }
        }
    }

    /// Spend capacity on a task; returns the work the task absorbed
    pub fn try_spend_capacity(
        &mut self,
        task_id: &str,
        channel: Channel,
        amount: u32,
    ) -> Result<u32, CapacityError> {
        let absorbed = self.spend_inner(task_id, channel, amount)?;
        self.persist();
        Ok(absorbed)
    }

    fn spend_inner(&mut self, task_id: &str, channel: Channel, amount: u32) -> Result<u32, CapacityError> {
        let (task, pool) = self
            .state
            .task_and_capacity_mut(task_id)
            .ok_or_else(|| CapacityError::TaskNotFound(task_id.to_string()))?;
        capacity::spend(pool, task, channel, amount)
    }

    /// Manual move; silently ignored when a precondition fails
    pub fn move_task(&mut self, task_id: &str, stage: Stage, sub_stage: Option<SubStage>) {
        if let Err(e) = self.try_move_task(task_id, stage, sub_stage) {
            debug!(task = task_id, to = %stage, reason = %e, "move rejected");
        }
    }

    pub fn try_move_task(
        &mut self,
        task_id: &str,
        stage: Stage,
        sub_stage: Option<SubStage>,
    ) -> Result<(), MoveError> {
        pipeline::move_task(self.state.tasks_mut(), task_id, stage, sub_stage)?;
        self.persist();
        Ok(())
    }

    /// Spread the pool over Doing tasks, later stages first
    ///
    /// Returns the spends that were applied.
    pub fn auto_distribute_capacity(&mut self) -> Vec<Allocation> {
        let plan = capacity::plan_distribution(self.state.tasks(), self.state.capacity());

        let applied: Vec<Allocation> = plan
            .into_iter()
            .filter(|a| self.spend_inner(&a.task_id, a.channel, a.amount).is_ok())
            .collect();

        debug!(spends = applied.len(), "capacity auto-distributed");
        if !applied.is_empty() {
            self.persist();
        }
        applied
    }

    /// Clear a block; returns whether it was cleared
    pub fn unblock_task(&mut self, task_id: &str, channel: Channel, amount: u32) -> bool {
        match self.try_unblock_task(task_id, channel, amount) {
            Ok(()) => true,
            Err(e) => {
                debug!(task = task_id, %channel, amount, reason = %e, "unblock rejected");
                false
            }
        }
    }

    pub fn try_unblock_task(
        &mut self,
        task_id: &str,
        channel: Channel,
        amount: u32,
    ) -> Result<(), UnblockError> {
        let cost = self.config.unblock_cost();
        let (tasks, pool) = self.state.tasks_and_capacity_mut();
        pipeline::unblock_task(tasks, pool, task_id, channel, amount, cost)?;
        self.persist();
        Ok(())
    }

    /// Convert rd into `amount` lab; returns whether it was applied
    pub fn convert_capacity(&mut self, from: Channel, to: Channel, amount: u32) -> bool {
        match self.try_convert_capacity(from, to, amount) {
            Ok(()) => true,
            Err(e) => {
                debug!(%from, %to, amount, reason = %e, "conversion rejected");
                false
            }
        }
    }

    pub fn try_convert_capacity(
        &mut self,
        from: Channel,
        to: Channel,
        amount: u32,
    ) -> Result<(), CapacityError> {
        capacity::convert(self.state.capacity_mut(), from, to, amount)?;
        self.persist();
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Replace the game with a fresh one
    ///
    /// The stored mirror is cleared and rewritten before returning; a store
    /// failure here is reported.
    pub fn new_game(&mut self) -> Result<(), GameError> {
        self.state = initial_state(&self.config, self.dice.as_mut());
        self.ledger = Ledger::new();

        if let Some(store) = self.store.as_mut() {
            let payload = checkpoint::encode(&self.state, &self.ledger, self.dice.state())?;
            overwrite(store.as_mut(), &payload)?;
        }

        info!(money = self.state.money(), "new game started");
        Ok(())
    }

    /// Alias of [`GameEngine::new_game`]
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.new_game()
    }

    /// Empty the history log
    pub fn clear_history(&mut self) {
        self.state.clear_history();
        self.persist();
    }

    /// Write the game to the mirror; failures are logged only
    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };

        let result = checkpoint::encode(&self.state, &self.ledger, self.dice.state())
            .and_then(|payload| store.save(&payload).map_err(GameError::from));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist game");
        }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("day", &self.state.day())
            .field("money", &self.state.money())
            .field("tasks", &self.state.tasks().len())
            .field("ledger", &self.ledger)
            .field("persisted", &self.store.is_some())
            .finish()
    }
}
