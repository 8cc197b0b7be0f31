//! Domain models for the construction board
//!
//! This module contains the data types of the game:
//! - Task: a construction work item moving through the stages
//! - CapacityPool: the day's tradeable work units
//! - GameState: the full game, the sole unit of persistence

pub mod capacity;
pub mod state;
pub mod task;

pub use capacity::CapacityPool;
pub use state::{stage_distribution, GameState, HistoryEntry};
pub use task::{
    BlockType, Channel, Dependency, Stage, SubStage, Task, TaskStatus, TaskType, WorkAmounts,
};
