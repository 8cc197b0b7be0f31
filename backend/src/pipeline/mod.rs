//! Task pipeline state machine
//!
//! Owns every stage transition of a task:
//!
//! ```text
//! backlog → rd → geo → smr → lab → acceptance → done
//!           (each work stage: Ready ⇄ Doing)
//!
//! bridge pier: smr ─(curing N days)→ lab Ready
//! any task:    ─(urgent visit)→ expedite ─(manual move)→ backlog / work stage
//! ```
//!
//! The day-tick steps (`promote_backlog`, `start_ready_work`,
//! `advance_completed`, `tick_curing`) each make exactly one pass over the
//! task set. Dependency checks inside a pass read the task set as it stood
//! when the pass began, so no task cascades through two stages in one day.

use thiserror::Error;
use tracing::debug;

use crate::catalog;
use crate::dependency;
use crate::models::capacity::CapacityPool;
use crate::models::task::{Channel, Stage, SubStage, Task, TaskStatus};

/// Reasons a manual move is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Tasks cannot be moved into {0} by hand")]
    ForbiddenDestination(Stage),

    #[error("Task {0} is not in its stage's Ready slot")]
    NotReady(String),

    #[error("Task {0} is blocked")]
    Blocked(String),

    #[error("Task {0} is curing")]
    Curing(String),

    #[error("Stage {stage} is at its WIP limit ({limit})")]
    WipLimitReached { stage: Stage, limit: usize },

    #[error("Dependency of task {0} is not satisfied")]
    DependencyUnmet(String),
}

/// Reasons an unblock is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnblockError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Insufficient {channel} capacity: required {required}, available {available}")]
    Insufficient {
        channel: Channel,
        required: u32,
        available: u32,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task {0} is not blocked")]
    NotBlocked(String),

    #[error("Block on task {task_id} must be cleared with {expected}, not {offered}")]
    WrongChannel {
        task_id: String,
        expected: Channel,
        offered: Channel,
    },

    #[error("Clearing the block needs {required}, only {offered} offered")]
    BelowRequirement { required: u32, offered: u32 },
}

/// Capacity needed to clear a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnblockCost {
    /// Rd needed to clear a design error
    pub design_error: u32,
    /// Hse needed to clear a safety violation
    pub safety_violation: u32,
}

/// What the completion pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Tasks that moved to another stage (including acceptance and done)
    pub advanced: Vec<String>,

    /// Tasks that entered curing instead of advancing
    pub curing_started: Vec<String>,

    /// Tasks that reached done this pass
    pub completed: Vec<String>,

    /// Revenue credited by acceptance and done entries
    pub revenue: i64,
}

/// Step 7: move dependency-satisfied backlog tasks into rd's Ready slot
pub fn promote_backlog(tasks: &mut [Task]) -> Vec<String> {
    let view: &[Task] = tasks;
    let eligible: Vec<usize> = view
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            t.stage() == Stage::Backlog && t.is_workable() && dependency::is_satisfied(t, view)
        })
        .map(|(i, _)| i)
        .collect();

    eligible
        .into_iter()
        .map(|i| {
            tasks[i].place(Stage::Rd, SubStage::Ready);
            tasks[i].id().to_string()
        })
        .collect()
}

/// Step 8: pull Ready tasks into Doing while each stage has a free slot
///
/// Tasks are visited in task order. The Doing count is updated as tasks are
/// started, so a stage never ends up over its limit.
pub fn start_ready_work(tasks: &mut [Task]) -> Vec<String> {
    let mut doing = [0usize; 4];
    for task in tasks.iter() {
        if let Some(slot) = work_slot(task.stage()) {
            if task.sub_stage() == SubStage::Doing {
                doing[slot] += 1;
            }
        }
    }

    let mut started = Vec::new();
    for task in tasks.iter_mut() {
        let Some(slot) = work_slot(task.stage()) else {
            continue;
        };
        if task.sub_stage() != SubStage::Ready || !task.is_workable() {
            continue;
        }
        let limit = catalog::wip_limit(task.stage()).unwrap_or(usize::MAX);
        if doing[slot] < limit {
            task.place(task.stage(), SubStage::Doing);
            doing[slot] += 1;
            started.push(task.id().to_string());
        }
    }

    started
}

fn work_slot(stage: Stage) -> Option<usize> {
    Stage::WORK.iter().position(|s| *s == stage)
}

/// Step 9: advance tasks whose active channel is complete
///
/// - Acceptance moves to done, crediting `revenue_on_done` and stamping
///   `completed_at`.
/// - A curing archetype finishing smr enters curing for `curing_days` and
///   stays in smr's Ready slot.
/// - A task finishing lab enters acceptance unconditionally, crediting
///   `revenue_on_acceptance`.
/// - Any other finished task enters the next stage's Ready slot if its
///   dependency passes.
///
/// Blocked tasks never advance.
pub fn advance_completed(tasks: &mut [Task], day: u32, curing_days: u32) -> AdvanceReport {
    let snapshot = tasks.to_vec();
    let mut report = AdvanceReport::default();

    for task in tasks.iter_mut() {
        if task.is_blocked() {
            continue;
        }

        if task.stage() == Stage::Acceptance {
            task.place(Stage::Done, SubStage::Ready);
            task.mark_completed(day);
            report.revenue += task.revenue_on_done();
            report.advanced.push(task.id().to_string());
            report.completed.push(task.id().to_string());
            continue;
        }

        if task.sub_stage() != SubStage::Doing || task.is_curing() || !task.is_stage_complete() {
            continue;
        }

        if task.stage() == Stage::Smr && catalog::cures_after_smr(task.task_type()) {
            task.start_curing(curing_days);
            report.curing_started.push(task.id().to_string());
            continue;
        }

        let Some(next) = task.stage().next() else {
            continue;
        };

        if next == Stage::Acceptance {
            task.place(Stage::Acceptance, SubStage::Ready);
            report.revenue += task.revenue_on_acceptance();
            report.advanced.push(task.id().to_string());
        } else if dependency::is_satisfied(task, &snapshot) {
            task.place(next, SubStage::Ready);
            report.advanced.push(task.id().to_string());
        }
    }

    report
}

/// Step 6: count curing tasks down, releasing them to lab's Ready slot at 0
pub fn tick_curing(tasks: &mut [Task]) -> Vec<String> {
    let mut released = Vec::new();

    for task in tasks.iter_mut().filter(|t| t.is_curing()) {
        if task.tick_curing() == 0 {
            task.finish_curing(Stage::Lab);
            released.push(task.id().to_string());
        }
    }

    released
}

/// Manual move of a task to `destination`
///
/// The task must sit in its stage's Ready slot, be neither blocked nor
/// curing, the destination's Doing slot must have room and the dependency
/// must pass. The same gates apply to a task leaving the expedite lane,
/// which returns to normal status once the move succeeds.
pub fn move_task(
    tasks: &mut [Task],
    task_id: &str,
    destination: Stage,
    sub_stage: Option<SubStage>,
) -> Result<(), MoveError> {
    let index = tasks
        .iter()
        .position(|t| t.id() == task_id)
        .ok_or_else(|| MoveError::TaskNotFound(task_id.to_string()))?;

    if destination != Stage::Backlog && !destination.is_work_stage() {
        return Err(MoveError::ForbiddenDestination(destination));
    }

    let task = &tasks[index];
    if task.sub_stage() != SubStage::Ready {
        return Err(MoveError::NotReady(task_id.to_string()));
    }
    if task.is_blocked() {
        return Err(MoveError::Blocked(task_id.to_string()));
    }
    if task.is_curing() {
        return Err(MoveError::Curing(task_id.to_string()));
    }

    let sub_stage = sub_stage.unwrap_or(SubStage::Ready);

    if let Some(limit) = catalog::wip_limit(destination) {
        let doing = tasks
            .iter()
            .filter(|t| t.is_at(destination, SubStage::Doing))
            .count();
        if doing >= limit {
            return Err(MoveError::WipLimitReached {
                stage: destination,
                limit,
            });
        }
    }

    if !dependency::is_satisfied(&tasks[index], tasks) {
        return Err(MoveError::DependencyUnmet(task_id.to_string()));
    }

    let task = &mut tasks[index];
    if task.stage() == Stage::Expedite {
        task.set_status(TaskStatus::Normal);
        debug!(task = task_id, to = %destination, "task left the expedite lane");
    }
    task.place(destination, sub_stage);
    Ok(())
}

/// Clear a block by spending capacity on the channel tied to its cause
///
/// The full offered `amount` is deducted.
pub fn unblock_task(
    tasks: &mut [Task],
    pool: &mut CapacityPool,
    task_id: &str,
    channel: Channel,
    amount: u32,
    cost: UnblockCost,
) -> Result<(), UnblockError> {
    if amount == 0 {
        return Err(UnblockError::InvalidAmount);
    }
    if !pool.can_afford(channel, amount) {
        return Err(UnblockError::Insufficient {
            channel,
            required: amount,
            available: pool.get(channel),
        });
    }

    let task = tasks
        .iter_mut()
        .find(|t| t.id() == task_id)
        .ok_or_else(|| UnblockError::TaskNotFound(task_id.to_string()))?;

    let block_type = match (task.is_blocked(), task.block_type()) {
        (true, Some(block_type)) => block_type,
        _ => return Err(UnblockError::NotBlocked(task_id.to_string())),
    };

    let expected = block_type.unblock_channel();
    if channel != expected {
        return Err(UnblockError::WrongChannel {
            task_id: task_id.to_string(),
            expected,
            offered: channel,
        });
    }

    let required = match expected {
        Channel::Rd => cost.design_error,
        _ => cost.safety_violation,
    };
    if amount < required {
        return Err(UnblockError::BelowRequirement {
            required,
            offered: amount,
        });
    }

    if !pool.withdraw(channel, amount) {
        return Err(UnblockError::Insufficient {
            channel,
            required: amount,
            available: pool.get(channel),
        });
    }
    task.unblock();
    Ok(())
}
