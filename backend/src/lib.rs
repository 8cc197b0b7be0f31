//! Construction Kanban Simulator - Rust Engine
//!
//! Turn-based simulation of a construction project run as a kanban board:
//! tasks advance through fixed stages, pulled by WIP limits and pushed by a
//! daily pool of randomly rolled capacity, while the day clock charges
//! overhead and penalties and injects random events.
//!
//! # Architecture
//!
//! - **catalog**: Task archetypes, stage table, seed task set
//! - **dependency**: Dependency resolver
//! - **capacity**: Capacity pool operations (regenerate, spend, convert, plan)
//! - **events**: Random event drawing and application
//! - **pipeline**: Task stage transitions
//! - **ledger**: Revenue, costs, penalties, win/loss
//! - **models**: Domain types (Task, CapacityPool, GameState)
//! - **orchestrator**: Day cycle, operator actions, persisted mirror
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Money values are i64, capacity and work units are u32
//! 2. All randomness goes through an injected, seedable source
//! 3. Every mutation goes through `GameEngine`

// Module declarations
pub mod capacity;
pub mod catalog;
pub mod dependency;
pub mod events;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod rng;

// Re-exports for convenience
pub use capacity::{Allocation, CapacityError};
pub use events::{EventEffect, EventType, GameEvent};
pub use ledger::Ledger;
pub use models::{
    capacity::CapacityPool,
    state::{GameState, HistoryEntry},
    task::{BlockType, Channel, Dependency, Stage, SubStage, Task, TaskStatus, TaskType, WorkAmounts},
};
pub use orchestrator::{
    DayResult, FileStore, GameConfig, GameEngine, GameError, MemoryStore, RestoreError,
    SharedGame, SnapshotStore, StoreError,
};
pub use pipeline::{MoveError, UnblockError};
pub use rng::{DiceSource, RngManager, ScriptedDice};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn kanban_sim_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::game::PyGame>()?;
    Ok(())
}
