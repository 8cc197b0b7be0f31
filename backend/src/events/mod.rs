//! Event generator: one stochastic disruption (or windfall) per day at most
//!
//! - `types`: event kinds, effect payloads, log records
//! - `handler`: drawing (decide) and applying (transition)

pub mod handler;
pub mod types;

pub use handler::{apply_event, draw_event};
pub use types::{EventEffect, EventType, GameEvent};
