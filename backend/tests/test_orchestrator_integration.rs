//! Orchestrator Integration Tests
//!
//! Full day cycles: finances, outcome latches, history and lifecycle.

use kanban_sim_core_rs::{GameConfig, GameEngine, SharedGame, Stage, SubStage};

fn quiet_config() -> GameConfig {
    GameConfig {
        event_probability: 0.0,
        ..GameConfig::default()
    }
}

#[test]
fn test_overhead_charged_daily() {
    let mut engine = GameEngine::new(quiet_config()).unwrap();

    for day in 1..=5 {
        let result = engine.next_day().unwrap();
        assert_eq!(result.day, day);
        assert_eq!(result.costs, 500);
        assert_eq!(result.money, 50_000 - 500 * i64::from(day));
    }
    assert_eq!(engine.ledger().total_costs(), 2_500);
}

#[test]
fn test_late_penalty_per_day_overdue() {
    let mut engine = GameEngine::new(quiet_config()).unwrap();
    engine
        .state_mut()
        .task_mut("task-road-earthwork-A")
        .unwrap()
        .set_fixed_date(Some(1));

    engine.next_day().unwrap();
    engine.next_day().unwrap();
    let day3 = engine.next_day().unwrap();

    assert_eq!(day3.costs, 500 + 2 * 2_000);
}

#[test]
fn test_loss_is_latched() {
    let config = GameConfig {
        initial_money: 1_000,
        daily_overhead: 600,
        ..quiet_config()
    };
    let mut engine = GameEngine::new(config).unwrap();

    let day1 = engine.next_day().unwrap();
    assert!(!day1.game_over);

    let day2 = engine.next_day().unwrap();
    assert!(day2.game_over);
    assert_eq!(day2.money, -200);

    // Even a windfall does not revive the game.
    engine.state_mut().set_money(1_000_000);
    assert!(engine.next_day().is_none());
    assert!(engine.state().game_over());
    assert_eq!(engine.state().day(), 2);
}

#[test]
fn test_win_when_everything_is_done() {
    let mut engine = GameEngine::new(quiet_config()).unwrap();
    let ids: Vec<String> = engine.state().tasks().iter().map(|t| t.id().to_string()).collect();
    for (i, id) in ids.iter().enumerate() {
        let stage = if i == 0 { Stage::Acceptance } else { Stage::Done };
        engine
            .state_mut()
            .task_mut(id)
            .unwrap()
            .place(stage, SubStage::Ready);
    }

    let result = engine.next_day().unwrap();
    assert!(result.game_won);
    assert!(!result.game_over);
    assert_eq!(result.revenue, 10_000);
    assert!(engine.next_day().is_none());
}

#[test]
fn test_financial_conservation() {
    let mut engine = GameEngine::new(GameConfig::default()).unwrap();

    for _ in 0..60 {
        engine.auto_distribute_capacity();
        if engine.next_day().is_none() {
            break;
        }

        let ledger = engine.ledger();
        let last = engine.state().history().last().unwrap();
        assert_eq!(last.profit, ledger.total_revenue() - ledger.total_costs());
        assert_eq!(last.revenue, ledger.total_revenue());
        assert_eq!(last.costs, ledger.total_costs());
        assert_eq!(engine.state().money(), 50_000 + ledger.profit());
    }
}

#[test]
fn test_history_snapshots() {
    let mut engine = GameEngine::new(quiet_config()).unwrap();
    assert_eq!(engine.state().history().len(), 1);
    assert_eq!(engine.state().history()[0].column_distribution["backlog"], 10);

    engine.next_day().unwrap();
    let entry = engine.state().history().last().unwrap();
    assert_eq!(entry.day, 1);
    assert_eq!(entry.column_distribution["backlog"], 5);
    assert_eq!(entry.column_distribution["rd"], 5);

    engine.clear_history();
    assert!(engine.state().history().is_empty());
    assert_eq!(engine.state().day(), 1);

    engine.next_day().unwrap();
    assert_eq!(engine.state().history().len(), 1);
}

#[test]
fn test_new_game_resets_everything() {
    let mut engine = GameEngine::new(GameConfig::default()).unwrap();
    for _ in 0..10 {
        engine.auto_distribute_capacity();
        engine.next_day();
    }

    engine.new_game().unwrap();

    let state = engine.state();
    assert_eq!(state.day(), 0);
    assert_eq!(state.money(), 50_000);
    assert!(state.events().is_empty());
    assert_eq!(state.history().len(), 1);
    assert!(state.tasks().iter().all(|t| t.stage() == Stage::Backlog));
    assert_eq!(engine.ledger().profit(), 0);

    engine.start_game().unwrap();
    assert_eq!(engine.state().day(), 0);
}

#[test]
fn test_shared_game_runs_operations_under_one_lock() {
    let game = SharedGame::new(GameEngine::new(quiet_config()).unwrap());

    let result = game.next_day().unwrap();
    assert_eq!(result.day, 1);

    let doing = game.with(|engine| {
        engine.auto_distribute_capacity();
        engine
            .state()
            .tasks_in(Stage::Rd, SubStage::Doing)
            .count()
    });
    assert_eq!(doing, 3);
}
