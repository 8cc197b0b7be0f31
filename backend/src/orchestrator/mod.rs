//! Orchestrator - the day cycle and the persisted mirror
//!
//! See `engine.rs` for the day tick and operator actions.

pub mod checkpoint;
pub mod engine;
pub mod shared;
pub mod store;

// Re-export main types for convenience
pub use engine::{DayResult, GameConfig, GameEngine, GameError};

// Re-export persistence types
pub use checkpoint::{PersistedGame, RestoreError, RestoreOutcome, SNAPSHOT_VERSION};
pub use shared::SharedGame;
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError};
