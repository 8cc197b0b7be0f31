//! Event drawing and application
//!
//! This module handles:
//! - Deciding whether an event fires today and which one (pure, seeded)
//! - Choosing the target task for task-targeting events
//! - Applying a drawn event's effect to tasks and capacity

use tracing::debug;
use uuid::Builder;

use crate::events::types::{EventEffect, EventType, GameEvent};
use crate::models::capacity::CapacityPool;
use crate::models::task::{Stage, Task, TaskStatus};
use crate::orchestrator::GameConfig;
use crate::rng::DiceSource;

/// Decide today's event, if any
///
/// Consumes, in order: one chance draw; on a hit, one pick for the event
/// type, one pick for the target (only when candidates exist) and two raw
/// values for the event identity.
///
/// Candidates are evaluated against `tasks` as they stand before the day's
/// pipeline steps run.
pub fn draw_event(
    tasks: &[Task],
    day: u32,
    config: &GameConfig,
    dice: &mut dyn DiceSource,
) -> Option<GameEvent> {
    if dice.next_f64() >= config.event_probability {
        return None;
    }

    let event_type = EventType::ALL[dice.pick(EventType::ALL.len())];

    let effect = match event_type {
        EventType::HeavyRain => Some(EventEffect::SmrReduction {
            percent: config.rain_reduction_pct,
        }),
        EventType::EquipmentBonus => Some(EventEffect::SmrBonus {
            amount: config.equipment_bonus,
        }),
        EventType::DesignError | EventType::SafetyViolation => {
            let candidates: Vec<&Task> = block_candidates(tasks).collect();
            pick_target(&candidates, dice).and_then(|task_id| {
                event_type
                    .block_type()
                    .map(|block_type| EventEffect::BlockTask { task_id, block_type })
            })
        }
        EventType::UrgentVisit => {
            let candidates: Vec<&Task> = expedite_candidates(tasks).collect();
            pick_target(&candidates, dice).map(|task_id| EventEffect::ExpediteTask { task_id })
        }
    };

    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&dice.next_u64().to_le_bytes());
    bytes[8..].copy_from_slice(&dice.next_u64().to_le_bytes());
    let id = Builder::from_random_bytes(bytes).into_uuid().to_string();

    Some(GameEvent {
        id,
        event_type,
        day,
        description: describe(event_type, config),
        effect,
    })
}

/// Unblocked tasks in the smr stage
pub fn block_candidates(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks
        .iter()
        .filter(|t| t.stage() == Stage::Smr && !t.is_blocked())
}

/// Tasks that are neither done nor already expedited
pub fn expedite_candidates(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|t| {
        t.stage() != Stage::Done
            && t.stage() != Stage::Expedite
            && t.status() != TaskStatus::Expedite
    })
}

fn pick_target(candidates: &[&Task], dice: &mut dyn DiceSource) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[dice.pick(candidates.len())].id().to_string())
}

fn describe(event_type: EventType, config: &GameConfig) -> String {
    match event_type {
        EventType::HeavyRain => format!(
            "SMR capacity reduced by {}% today",
            config.rain_reduction_pct
        ),
        EventType::DesignError => format!(
            "A task in SMR is blocked. {} RD required to unblock",
            config.design_error_unblock
        ),
        EventType::SafetyViolation => format!(
            "A task in SMR is blocked. {} HSE required to unblock",
            config.safety_unblock
        ),
        EventType::EquipmentBonus => format!("+{} SMR capacity today", config.equipment_bonus),
        EventType::UrgentVisit => "A task was moved to the expedite lane".to_string(),
    }
}

/// Apply a drawn event's effect
///
/// Capacity effects must be applied after the day's capacity has been
/// regenerated. A target that no longer exists is skipped.
pub fn apply_event(
    event: &GameEvent,
    tasks: &mut [Task],
    capacity: &mut CapacityPool,
    config: &GameConfig,
) {
    let Some(effect) = &event.effect else {
        debug!(event = %event.event_type, day = event.day, "event fired without a target");
        return;
    };

    match effect {
        EventEffect::SmrReduction { percent } => {
            let kept = 100u32.saturating_sub(*percent);
            capacity.smr = capacity.smr * kept / 100;
            debug!(smr = capacity.smr, "heavy rain cut smr capacity");
        }
        EventEffect::SmrBonus { amount } => {
            capacity.smr = capacity.smr.saturating_add(*amount);
            debug!(smr = capacity.smr, "equipment bonus added smr capacity");
        }
        EventEffect::BlockTask {
            task_id,
            block_type,
        } => {
            if let Some(task) = tasks.iter_mut().find(|t| t.id() == task_id) {
                task.block(*block_type);
                debug!(task = %task_id, ?block_type, "task blocked");
            }
        }
        EventEffect::ExpediteTask { task_id } => {
            if let Some(task) = tasks.iter_mut().find(|t| t.id() == task_id) {
                task.expedite();
                if let (Some(due_in), None) = (config.urgent_visit_due_days, task.fixed_date()) {
                    task.set_fixed_date(Some(event.day.saturating_add(due_in)));
                }
                debug!(task = %task_id, "task expedited");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::task::SubStage;
    use crate::rng::ScriptedDice;

    #[test]
    fn test_no_event_when_draw_misses() {
        let config = GameConfig::default();
        let tasks = catalog::seed_tasks(&config);
        let mut dice = ScriptedDice::new(1).with_draws([0.3]);

        assert!(draw_event(&tasks, 1, &config, &mut dice).is_none());
    }

    #[test]
    fn test_blocking_event_without_candidates_is_noop() {
        let config = GameConfig::default();
        let tasks = catalog::seed_tasks(&config);
        let mut dice = ScriptedDice::new(1).with_draws([0.0]).with_picks([1]);

        let event = draw_event(&tasks, 1, &config, &mut dice).unwrap();
        assert_eq!(event.event_type, EventType::DesignError);
        assert!(event.is_noop(), "no task sits in smr on a fresh board");
    }

    #[test]
    fn test_heavy_rain_floors_capacity() {
        let config = GameConfig::default();
        let mut tasks = catalog::seed_tasks(&config);
        let mut pool = CapacityPool::new(3, 2, 17, 2, 2);
        let event = GameEvent {
            id: "e".to_string(),
            event_type: EventType::HeavyRain,
            day: 1,
            description: String::new(),
            effect: Some(EventEffect::SmrReduction { percent: 80 }),
        };

        apply_event(&event, &mut tasks, &mut pool, &config);
        assert_eq!(pool.smr, 3, "17 * 0.2 = 3.4 floors to 3");
    }

    #[test]
    fn test_expedite_stamps_due_date_when_configured() {
        let config = GameConfig {
            urgent_visit_due_days: Some(4),
            ..GameConfig::default()
        };
        let mut tasks = catalog::seed_tasks(&config);
        let mut pool = CapacityPool::default();
        let target = tasks[0].id().to_string();
        let event = GameEvent {
            id: "e".to_string(),
            event_type: EventType::UrgentVisit,
            day: 6,
            description: String::new(),
            effect: Some(EventEffect::ExpediteTask {
                task_id: target.clone(),
            }),
        };

        apply_event(&event, &mut tasks, &mut pool, &config);

        let task = tasks.iter().find(|t| t.id() == target).unwrap();
        assert!(task.is_at(Stage::Expedite, SubStage::Ready));
        assert_eq!(task.status(), TaskStatus::Expedite);
        assert_eq!(task.fixed_date(), Some(10));
    }

    #[test]
    fn test_far_due_date_saturates() {
        let config = GameConfig {
            urgent_visit_due_days: Some(u32::MAX),
            ..GameConfig::default()
        };
        let mut tasks = catalog::seed_tasks(&config);
        let mut pool = CapacityPool::default();
        let target = tasks[1].id().to_string();
        let event = GameEvent {
            id: "e".to_string(),
            event_type: EventType::UrgentVisit,
            day: 9,
            description: String::new(),
            effect: Some(EventEffect::ExpediteTask {
                task_id: target.clone(),
            }),
        };

        apply_event(&event, &mut tasks, &mut pool, &config);

        let task = tasks.iter().find(|t| t.id() == target).unwrap();
        assert_eq!(task.fixed_date(), Some(u32::MAX));
        assert_eq!(task.days_late(u32::MAX), 0);
    }
}
