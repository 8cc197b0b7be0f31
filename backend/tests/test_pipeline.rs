//! Task Pipeline Tests
//!
//! Stage transitions through the engine: backlog promotion, WIP limits,
//! channel completion, curing, blocking and manual moves.

use kanban_sim_core_rs::rng::ScriptedDice;
use kanban_sim_core_rs::{
    BlockType, CapacityPool, Channel, GameConfig, GameEngine, MoveError, Stage, SubStage,
    TaskStatus, UnblockError,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn quiet_config() -> GameConfig {
    GameConfig {
        event_probability: 0.0,
        ..GameConfig::default()
    }
}

fn quiet_engine() -> GameEngine {
    GameEngine::new(quiet_config()).unwrap()
}

fn is_at(engine: &GameEngine, id: &str, stage: Stage, sub: SubStage) -> bool {
    engine.task(id).unwrap().is_at(stage, sub)
}

// ============================================================================
// Day-tick transitions
// ============================================================================

#[test]
fn test_fresh_game() {
    let engine = quiet_engine();
    let state = engine.state();

    assert_eq!(state.money(), 50_000);
    assert_eq!(state.day(), 0);
    assert_eq!(state.tasks().len(), 10);
    assert!(state.tasks().iter().all(|t| t.stage() == Stage::Backlog));
    assert!(!state.game_over());
    assert!(!state.game_won());
}

#[test]
fn test_earthwork_finishes_rd_then_moves_to_geo() {
    let dice = ScriptedDice::new(3).with_rolls([1, 1, 1, 1, 6, 6, 6, 6]);
    let mut engine = GameEngine::with_dice(quiet_config(), Box::new(dice)).unwrap();

    let day1 = engine.next_day().unwrap();
    assert_eq!(day1.promoted.len(), 5);
    assert_eq!(day1.started.len(), 3);
    assert!(is_at(&engine, "task-road-earthwork-A", Stage::Rd, SubStage::Doing));
    assert!(is_at(&engine, "task-road-earthwork-C", Stage::Rd, SubStage::Doing));
    assert!(is_at(&engine, "task-road-earthwork-D", Stage::Rd, SubStage::Ready));
    assert!(is_at(&engine, "task-bridge-pier-1", Stage::Rd, SubStage::Ready));
    assert_eq!(engine.state().capacity().rd, 18);

    assert!(engine.spend_capacity("task-road-earthwork-A", Channel::Rd, 2));
    assert_eq!(engine.task("task-road-earthwork-A").unwrap().progress().rd, 0);
    assert!(is_at(&engine, "task-road-earthwork-A", Stage::Rd, SubStage::Doing));

    let day2 = engine.next_day().unwrap();
    assert_eq!(day2.advanced, vec!["task-road-earthwork-A".to_string()]);
    assert!(is_at(&engine, "task-road-earthwork-A", Stage::Geo, SubStage::Ready));
    assert_eq!(engine.state().money(), 49_000);
}

#[test]
fn test_asphalt_waits_for_its_own_earthwork() {
    let mut engine = quiet_engine();
    engine
        .state_mut()
        .task_mut("task-road-earthwork-B")
        .unwrap()
        .place(Stage::Acceptance, SubStage::Ready);

    engine.next_day().unwrap();

    assert_eq!(engine.task("task-road-asphalt-A").unwrap().stage(), Stage::Backlog);
    assert_eq!(engine.task("task-road-asphalt-B").unwrap().stage(), Stage::Rd);
}

#[test]
fn test_wip_limit_never_exceeded() {
    let mut engine = quiet_engine();

    for _ in 0..25 {
        engine.auto_distribute_capacity();
        if engine.next_day().is_none() {
            break;
        }
        for stage in Stage::WORK {
            let doing = engine.state().tasks_in(stage, SubStage::Doing).count();
            assert!(doing <= 3, "{} has {} tasks in Doing", stage, doing);
        }
    }
}

#[test]
fn test_acceptance_then_done_credits_revenue() {
    let mut engine = quiet_engine();
    {
        let task = engine.state_mut().task_mut("task-road-earthwork-A").unwrap();
        task.place(Stage::Lab, SubStage::Doing);
        task.apply_work(Channel::Lab, 8);
    }

    let day1 = engine.next_day().unwrap();
    assert_eq!(day1.revenue, 5_000);
    assert_eq!(engine.task("task-road-earthwork-A").unwrap().stage(), Stage::Acceptance);

    let day2 = engine.next_day().unwrap();
    assert_eq!(day2.revenue, 10_000);
    assert_eq!(day2.completed, vec!["task-road-earthwork-A".to_string()]);
    let task = engine.task("task-road-earthwork-A").unwrap();
    assert_eq!(task.stage(), Stage::Done);
    assert_eq!(task.completed_at(), Some(2));

    assert_eq!(engine.ledger().total_revenue(), 15_000);
    assert_eq!(engine.state().money(), 50_000 - 1_000 + 15_000);
}

#[test]
fn test_pier_cures_for_three_days() {
    let mut engine = quiet_engine();
    {
        let pier = engine.state_mut().task_mut("task-bridge-pier-1").unwrap();
        pier.place(Stage::Smr, SubStage::Doing);
        pier.apply_work(Channel::Smr, 20);
    }

    let day1 = engine.next_day().unwrap();
    assert_eq!(day1.curing_started, vec!["task-bridge-pier-1".to_string()]);
    assert!(day1.advanced.is_empty());
    let pier = engine.task("task-bridge-pier-1").unwrap();
    assert_eq!(pier.status(), TaskStatus::Curing);
    assert!(pier.is_at(Stage::Smr, SubStage::Ready));
    assert_eq!(pier.curing_days(), Some(3));

    engine.next_day().unwrap();
    engine.next_day().unwrap();
    assert!(engine.task("task-bridge-pier-1").unwrap().is_curing());

    let day4 = engine.next_day().unwrap();
    assert_eq!(day4.released, vec!["task-bridge-pier-1".to_string()]);
    let pier = engine.task("task-bridge-pier-1").unwrap();
    assert_eq!(pier.status(), TaskStatus::Normal);
    assert!(pier.is_at(Stage::Lab, SubStage::Doing));
}

#[test]
fn test_span_waits_for_pier() {
    let mut engine = quiet_engine();
    engine
        .state_mut()
        .task_mut("task-bridge-pier-1")
        .unwrap()
        .place(Stage::Lab, SubStage::Doing);

    engine.next_day().unwrap();
    assert_eq!(engine.task("task-bridge-span-1").unwrap().stage(), Stage::Backlog);

    engine
        .state_mut()
        .task_mut("task-bridge-pier-1")
        .unwrap()
        .place(Stage::Done, SubStage::Ready);
    engine.next_day().unwrap();
    assert_eq!(engine.task("task-bridge-span-1").unwrap().stage(), Stage::Rd);
}

// ============================================================================
// Blocking
// ============================================================================

#[test]
fn test_unblock_below_requirement_is_rejected() {
    let mut engine = quiet_engine();
    engine.state_mut().set_capacity(CapacityPool::new(12, 4, 9, 6, 2));
    {
        let task = engine.state_mut().task_mut("task-road-earthwork-A").unwrap();
        task.place(Stage::Smr, SubStage::Doing);
        task.block(BlockType::DesignError);
    }

    assert!(!engine.unblock_task("task-road-earthwork-A", Channel::Rd, 3));
    assert!(engine.task("task-road-earthwork-A").unwrap().is_blocked());
    assert_eq!(engine.state().capacity().rd, 12);

    assert!(engine.unblock_task("task-road-earthwork-A", Channel::Rd, 5));
    assert!(!engine.task("task-road-earthwork-A").unwrap().is_blocked());
    assert_eq!(engine.state().capacity().rd, 7);
}

#[test]
fn test_safety_violation_needs_hse() {
    let mut engine = quiet_engine();
    engine.state_mut().set_capacity(CapacityPool::new(12, 4, 9, 6, 2));
    engine
        .state_mut()
        .task_mut("task-road-earthwork-A")
        .unwrap()
        .block(BlockType::SafetyViolation);

    assert!(matches!(
        engine.try_unblock_task("task-road-earthwork-A", Channel::Rd, 5),
        Err(UnblockError::WrongChannel { .. })
    ));
    assert!(matches!(
        engine.try_unblock_task("task-road-earthwork-A", Channel::Hse, 3),
        Err(UnblockError::Insufficient { .. })
    ));
    assert_eq!(
        engine.try_unblock_task("task-road-earthwork-B", Channel::Hse, 2),
        Err(UnblockError::NotBlocked("task-road-earthwork-B".to_string()))
    );
    assert_eq!(
        engine.try_unblock_task("task-road-earthwork-A", Channel::Hse, 2),
        Ok(())
    );
    assert_eq!(engine.state().capacity().hse, 0);
}

#[test]
fn test_blocked_task_holds_its_place() {
    let mut engine = quiet_engine();
    {
        let task = engine.state_mut().task_mut("task-road-earthwork-A").unwrap();
        task.place(Stage::Smr, SubStage::Doing);
        task.apply_work(Channel::Smr, 10);
        task.block(BlockType::DesignError);
    }

    for _ in 0..3 {
        engine.next_day().unwrap();
    }
    assert!(is_at(&engine, "task-road-earthwork-A", Stage::Smr, SubStage::Doing));
}

// ============================================================================
// Manual moves
// ============================================================================

#[test]
fn test_manual_move_rules() {
    let mut engine = quiet_engine();

    engine.move_task("task-road-earthwork-A", Stage::Rd, None);
    assert!(is_at(&engine, "task-road-earthwork-A", Stage::Rd, SubStage::Ready));

    engine.move_task("task-road-asphalt-A", Stage::Rd, None);
    assert_eq!(engine.task("task-road-asphalt-A").unwrap().stage(), Stage::Backlog);

    assert_eq!(
        engine.try_move_task("task-road-earthwork-A", Stage::Acceptance, None),
        Err(MoveError::ForbiddenDestination(Stage::Acceptance))
    );

    for id in ["task-road-earthwork-B", "task-road-earthwork-C", "task-road-earthwork-D"] {
        engine.try_move_task(id, Stage::Geo, Some(SubStage::Doing)).unwrap();
    }
    assert_eq!(
        engine.try_move_task("task-road-earthwork-A", Stage::Geo, None),
        Err(MoveError::WipLimitReached {
            stage: Stage::Geo,
            limit: 3
        })
    );
}

#[test]
fn test_expedited_task_leaves_lane_only_through_the_gates() {
    let mut engine = quiet_engine();
    engine
        .state_mut()
        .task_mut("task-road-asphalt-C")
        .unwrap()
        .expedite();

    engine.next_day().unwrap();
    assert!(is_at(&engine, "task-road-asphalt-C", Stage::Expedite, SubStage::Ready));

    // Earthwork C is still in rd, so asphalt C has to wait in the lane.
    assert_eq!(
        engine.try_move_task("task-road-asphalt-C", Stage::Smr, Some(SubStage::Doing)),
        Err(MoveError::DependencyUnmet("task-road-asphalt-C".to_string()))
    );
    let task = engine.task("task-road-asphalt-C").unwrap();
    assert!(task.is_at(Stage::Expedite, SubStage::Ready));
    assert_eq!(task.status(), TaskStatus::Expedite);

    engine
        .state_mut()
        .task_mut("task-road-earthwork-C")
        .unwrap()
        .place(Stage::Done, SubStage::Ready);
    engine.move_task("task-road-asphalt-C", Stage::Smr, Some(SubStage::Doing));
    let task = engine.task("task-road-asphalt-C").unwrap();
    assert!(task.is_at(Stage::Smr, SubStage::Doing));
    assert_eq!(task.status(), TaskStatus::Normal);
}
