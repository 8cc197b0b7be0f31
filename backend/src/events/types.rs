//! Random event types
//!
//! At most one event fires per day. Each event carries a typed effect that
//! either modifies the day's capacity or targets a single task.
//!
//! # Design Principles
//!
//! 1. **Determinism**: Events are drawn from the injected dice source only
//! 2. **Self-contained**: The effect names everything needed to apply it
//! 3. **Logged**: Every fired event is appended to the game's event log,
//!    including events whose effect turned out to be a no-op

use serde::{Deserialize, Serialize};

use crate::models::task::BlockType;

/// Closed set of event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Storm: the day's smr capacity is cut
    HeavyRain,

    /// Drawings were wrong: an smr task is blocked until rd is spent on it
    DesignError,

    /// Site inspection failed: an smr task is blocked until hse is spent on it
    SafetyViolation,

    /// Extra machinery on site: flat smr bonus for the day
    EquipmentBonus,

    /// Client visit: one unfinished task jumps to the expedite lane
    UrgentVisit,
}

impl EventType {
    /// Draw table, indexed by a uniform pick.
    pub const ALL: [EventType; 5] = [
        EventType::HeavyRain,
        EventType::DesignError,
        EventType::SafetyViolation,
        EventType::EquipmentBonus,
        EventType::UrgentVisit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::HeavyRain => "heavy_rain",
            EventType::DesignError => "design_error",
            EventType::SafetyViolation => "safety_violation",
            EventType::EquipmentBonus => "equipment_bonus",
            EventType::UrgentVisit => "urgent_visit",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            EventType::HeavyRain => "Heavy rain",
            EventType::DesignError => "Design error",
            EventType::SafetyViolation => "Safety violation",
            EventType::EquipmentBonus => "Equipment bonus",
            EventType::UrgentVisit => "Urgent visit",
        }
    }

    /// Block type this event inflicts, if it is a blocking event
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            EventType::DesignError => Some(BlockType::DesignError),
            EventType::SafetyViolation => Some(BlockType::SafetyViolation),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed effect payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    /// Multiply the day's smr capacity by `(100 - percent) / 100`, floored
    SmrReduction { percent: u32 },

    /// Add a flat amount to the day's smr capacity
    SmrBonus { amount: u32 },

    /// Block one task
    BlockTask {
        task_id: String,
        block_type: BlockType,
    },

    /// Relocate one task to the expedite lane
    ExpediteTask { task_id: String },
}

/// A fired event, as recorded in the game's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Day the event was applied on
    pub day: u32,

    pub description: String,

    /// `None` when a task-targeting event found no candidate
    #[serde(default)]
    pub effect: Option<EventEffect>,
}

impl GameEvent {
    /// True if the event fired but changed nothing
    pub fn is_noop(&self) -> bool {
        self.effect.is_none()
    }
}
