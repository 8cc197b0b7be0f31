//! Capacity resource pool operations
//!
//! - Regeneration: one die per work channel times a fixed multiplier, hse fixed
//! - Spending: capacity burns down one task's remaining work on one channel
//! - Conversion: 2 rd → 1 lab, nothing else
//! - Auto-distribution: greedy plan, tasks closest to done first
//!
//! CRITICAL: every rejection leaves both the pool and the task untouched.

use thiserror::Error;

use crate::models::capacity::CapacityPool;
use crate::models::task::{Channel, SubStage, Task};
use crate::rng::DiceSource;

/// Die multiplier for rd
pub const RD_MULTIPLIER: u32 = 3;
/// Die multiplier for geo
pub const GEO_MULTIPLIER: u32 = 2;
/// Die multiplier for smr
pub const SMR_MULTIPLIER: u32 = 3;
/// Die multiplier for lab
pub const LAB_MULTIPLIER: u32 = 2;
/// Hse is not rolled
pub const HSE_DAILY: u32 = 2;

/// Rd units consumed per lab unit produced
pub const RD_PER_LAB: u32 = 2;

/// Reasons a spend or conversion is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
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

    #[error("Task {task_id} is in stage {stage}, which does not consume {channel}")]
    WrongStage {
        task_id: String,
        stage: String,
        channel: Channel,
    },

    #[error("Task {0} is not in its stage's Doing slot")]
    NotDoing(String),

    #[error("Task {0} is blocked")]
    Blocked(String),

    #[error("Task {0} is curing")]
    Curing(String),

    #[error("Conversion {from} -> {to} is not supported")]
    UnsupportedConversion { from: Channel, to: Channel },
}

/// Roll the day's capacity
///
/// Rolls rd, geo, smr, lab in that order. rd/smr ∈ [3, 18], geo/lab ∈ [2, 12],
/// hse = 2.
pub fn regenerate(dice: &mut dyn DiceSource) -> CapacityPool {
    let rd = dice.roll_d6() * RD_MULTIPLIER;
    let geo = dice.roll_d6() * GEO_MULTIPLIER;
    let smr = dice.roll_d6() * SMR_MULTIPLIER;
    let lab = dice.roll_d6() * LAB_MULTIPLIER;

    CapacityPool::new(rd, geo, smr, lab, HSE_DAILY)
}

/// Check that `amount` of `channel` may be spent on `task`
pub fn check_spend(
    pool: &CapacityPool,
    task: &Task,
    channel: Channel,
    amount: u32,
) -> Result<(), CapacityError> {
    if amount == 0 {
        return Err(CapacityError::InvalidAmount);
    }
    if !pool.can_afford(channel, amount) {
        return Err(CapacityError::Insufficient {
            channel,
            required: amount,
            available: pool.get(channel),
        });
    }
    if task.stage().channel() != Some(channel) {
        return Err(CapacityError::WrongStage {
            task_id: task.id().to_string(),
            stage: task.stage().to_string(),
            channel,
        });
    }
    if task.sub_stage() != SubStage::Doing {
        return Err(CapacityError::NotDoing(task.id().to_string()));
    }
    if task.is_blocked() {
        return Err(CapacityError::Blocked(task.id().to_string()));
    }
    if task.is_curing() {
        return Err(CapacityError::Curing(task.id().to_string()));
    }
    Ok(())
}

/// Spend capacity on a task
///
/// The full `amount` leaves the pool; the task absorbs at most its remaining
/// work. Returns the units the task absorbed.
pub fn spend(
    pool: &mut CapacityPool,
    task: &mut Task,
    channel: Channel,
    amount: u32,
) -> Result<u32, CapacityError> {
    check_spend(pool, task, channel, amount)?;

    if !pool.withdraw(channel, amount) {
        return Err(CapacityError::Insufficient {
            channel,
            required: amount,
            available: pool.get(channel),
        });
    }
    Ok(task.apply_work(channel, amount))
}

/// Convert rd into lab at the fixed 2:1 rate
///
/// `amount` is the number of lab units to produce.
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{capacity, CapacityPool, Channel};
///
/// let mut pool = CapacityPool::new(9, 2, 3, 2, 2);
/// capacity::convert(&mut pool, Channel::Rd, Channel::Lab, 3).unwrap();
/// assert_eq!((pool.rd, pool.lab), (3, 5));
/// ```
pub fn convert(
    pool: &mut CapacityPool,
    from: Channel,
    to: Channel,
    amount: u32,
) -> Result<(), CapacityError> {
    if from != Channel::Rd || to != Channel::Lab {
        return Err(CapacityError::UnsupportedConversion { from, to });
    }
    if amount == 0 {
        return Err(CapacityError::InvalidAmount);
    }

    let cost = amount
        .checked_mul(RD_PER_LAB)
        .ok_or(CapacityError::Insufficient {
            channel: from,
            required: u32::MAX,
            available: pool.get(from),
        })?;

    if !pool.withdraw(from, cost) {
        return Err(CapacityError::Insufficient {
            channel: from,
            required: cost,
            available: pool.get(from),
        });
    }
    pool.deposit(to, amount);
    Ok(())
}

/// One planned spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub task_id: String,
    pub channel: Channel,
    pub amount: u32,
}

/// Plan an auto-distribution of the pool
///
/// Eligible tasks sit in a work stage's `Doing` slot, unblocked and not
/// curing. They are visited by descending stage (lab first, rd last; ties
/// keep task order) and each gets `min(remaining work, remaining pool)` on
/// its stage's channel.
pub fn plan_distribution(tasks: &[Task], pool: &CapacityPool) -> Vec<Allocation> {
    let mut eligible: Vec<&Task> = tasks
        .iter()
        .filter(|t| {
            t.stage().is_work_stage() && t.sub_stage() == SubStage::Doing && t.is_workable()
        })
        .collect();
    eligible.sort_by(|a, b| b.stage().sequence_index().cmp(&a.stage().sequence_index()));

    let mut remaining = *pool;
    let mut plan = Vec::new();

    for task in eligible {
        let Some(channel) = task.stage().channel() else {
            continue;
        };
        let need = task.progress().get(channel).unwrap_or(0);
        let amount = need.min(remaining.get(channel));
        if amount > 0 && remaining.withdraw(channel, amount) {
            plan.push(Allocation {
                task_id: task.id().to_string(),
                channel,
                amount,
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Stage, TaskType, WorkAmounts};
    use crate::rng::ScriptedDice;

    fn task_in(stage: Stage, sub: SubStage) -> Task {
        let mut task = Task::new(
            format!("t-{}", stage),
            "t".to_string(),
            TaskType::RoadEarthwork,
            WorkAmounts::new(2, 4, 10, 8),
        );
        task.place(stage, sub);
        task
    }

    #[test]
    fn test_regenerate_uses_multipliers() {
        let mut dice = ScriptedDice::new(1).with_rolls([1, 6, 2, 5]);
        let pool = regenerate(&mut dice);
        assert_eq!(pool, CapacityPool::new(3, 12, 6, 10, 2));
    }

    #[test]
    fn test_spend_wastes_excess() {
        let mut pool = CapacityPool::new(10, 0, 0, 0, 2);
        let mut task = task_in(Stage::Rd, SubStage::Doing);

        assert_eq!(spend(&mut pool, &mut task, Channel::Rd, 5), Ok(2));
        assert_eq!(pool.rd, 5, "the whole amount leaves the pool");
        assert_eq!(task.progress().rd, 0);
    }

    #[test]
    fn test_spend_rejections_leave_state_untouched() {
        let mut pool = CapacityPool::new(10, 10, 10, 10, 2);

        let mut ready = task_in(Stage::Rd, SubStage::Ready);
        assert_eq!(
            spend(&mut pool, &mut ready, Channel::Rd, 1),
            Err(CapacityError::NotDoing(ready.id().to_string()))
        );

        let mut wrong = task_in(Stage::Geo, SubStage::Doing);
        assert!(matches!(
            spend(&mut pool, &mut wrong, Channel::Rd, 1),
            Err(CapacityError::WrongStage { .. })
        ));

        let mut hse = task_in(Stage::Smr, SubStage::Doing);
        assert!(matches!(
            spend(&mut pool, &mut hse, Channel::Hse, 1),
            Err(CapacityError::WrongStage { .. })
        ));

        assert_eq!(pool, CapacityPool::new(10, 10, 10, 10, 2));
        assert_eq!(wrong.progress(), wrong.requirements());
    }

    #[test]
    fn test_convert_only_rd_to_lab() {
        let mut pool = CapacityPool::new(5, 4, 4, 4, 2);

        assert_eq!(
            convert(&mut pool, Channel::Geo, Channel::Lab, 1),
            Err(CapacityError::UnsupportedConversion {
                from: Channel::Geo,
                to: Channel::Lab
            })
        );
        assert!(convert(&mut pool, Channel::Rd, Channel::Lab, 3).is_err());
        assert_eq!(convert(&mut pool, Channel::Rd, Channel::Lab, 2), Ok(()));
        assert_eq!((pool.rd, pool.lab), (1, 6));
    }

    #[test]
    fn test_plan_prioritises_later_stages() {
        let tasks = vec![
            task_in(Stage::Smr, SubStage::Doing),
            task_in(Stage::Lab, SubStage::Doing),
            task_in(Stage::Smr, SubStage::Ready),
        ];
        let pool = CapacityPool::new(0, 0, 4, 5, 2);

        let plan = plan_distribution(&tasks, &pool);
        assert_eq!(
            plan,
            vec![
                Allocation {
                    task_id: "t-lab".to_string(),
                    channel: Channel::Lab,
                    amount: 5,
                },
                Allocation {
                    task_id: "t-smr".to_string(),
                    channel: Channel::Smr,
                    amount: 4,
                },
            ]
        );
    }
}
