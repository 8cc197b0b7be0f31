//! Task model
//!
//! A task is one construction work item moving through the board.
//! Each task has:
//! - An archetype (`type`) and an optional section it belongs to
//! - Remaining work per channel (`progress`) and the original totals
//!   (`requirements`)
//! - A position: stage (`columnId`) and sub-stage (`subColumn`)
//! - Overlay state: blocked flag, curing counter, expedite status
//! - Financial terms: due day and revenue credits
//!
//! CRITICAL: `progress[c] <= requirements[c]` for every work channel `c`.
//! Work can only ever reduce `progress`, never raise it.

use serde::{Deserialize, Serialize};

/// Pipeline stage (board column)
///
/// Working stages run in the fixed order `rd → geo → smr → lab`, followed by
/// the terminal stages `acceptance → done`. `expedite` is an out-of-band lane
/// entered only through an event effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Backlog,
    Rd,
    Geo,
    Smr,
    Lab,
    Acceptance,
    Done,
    Expedite,
}

impl Stage {
    /// Every stage, in board order (expedite last).
    pub const ALL: [Stage; 8] = [
        Stage::Backlog,
        Stage::Rd,
        Stage::Geo,
        Stage::Smr,
        Stage::Lab,
        Stage::Acceptance,
        Stage::Done,
        Stage::Expedite,
    ];

    /// Stages with a work channel and a two-slot sub-pipeline.
    pub const WORK: [Stage; 4] = [Stage::Rd, Stage::Geo, Stage::Smr, Stage::Lab];

    /// The main sequence a task advances through after leaving the backlog.
    const SEQUENCE: [Stage; 6] = [
        Stage::Rd,
        Stage::Geo,
        Stage::Smr,
        Stage::Lab,
        Stage::Acceptance,
        Stage::Done,
    ];

    /// Wire name of the stage (`"rd"`, `"acceptance"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Backlog => "backlog",
            Stage::Rd => "rd",
            Stage::Geo => "geo",
            Stage::Smr => "smr",
            Stage::Lab => "lab",
            Stage::Acceptance => "acceptance",
            Stage::Done => "done",
            Stage::Expedite => "expedite",
        }
    }

    /// Work channel consumed while a task sits in this stage.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Stage::Rd => Some(Channel::Rd),
            Stage::Geo => Some(Channel::Geo),
            Stage::Smr => Some(Channel::Smr),
            Stage::Lab => Some(Channel::Lab),
            _ => None,
        }
    }

    /// True for rd/geo/smr/lab.
    pub fn is_work_stage(&self) -> bool {
        self.channel().is_some()
    }

    /// Position in the main sequence (`rd` = 0 ... `done` = 5).
    ///
    /// Backlog and expedite are outside the sequence.
    pub fn sequence_index(&self) -> Option<usize> {
        Self::SEQUENCE.iter().position(|s| s == self)
    }

    /// Next stage in the main sequence, `None` for done/backlog/expedite.
    ///
    /// # Example
    /// ```
    /// use kanban_sim_core_rs::Stage;
    ///
    /// assert_eq!(Stage::Lab.next(), Some(Stage::Acceptance));
    /// assert_eq!(Stage::Done.next(), None);
    /// ```
    pub fn next(&self) -> Option<Stage> {
        let index = self.sequence_index()?;
        Self::SEQUENCE.get(index + 1).copied()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot within a work stage's internal two-slot sub-pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubStage {
    Doing,
    Ready,
}

/// Capacity channel
///
/// The four work channels are tracked both in the pool and in each task's
/// progress. `hse` (health & safety) only exists in the pool and is spent on
/// clearing safety violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Rd,
    Geo,
    Smr,
    Lab,
    Hse,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Rd,
        Channel::Geo,
        Channel::Smr,
        Channel::Lab,
        Channel::Hse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Rd => "rd",
            Channel::Geo => "geo",
            Channel::Smr => "smr",
            Channel::Lab => "lab",
            Channel::Hse => "hse",
        }
    }

    /// Stage whose tasks consume this channel (`None` for hse).
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Channel::Rd => Some(Stage::Rd),
            Channel::Geo => Some(Stage::Geo),
            Channel::Smr => Some(Stage::Smr),
            Channel::Lab => Some(Stage::Lab),
            Channel::Hse => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work units per work channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkAmounts {
    pub rd: u32,
    pub geo: u32,
    pub smr: u32,
    pub lab: u32,
}

impl WorkAmounts {
    pub const fn new(rd: u32, geo: u32, smr: u32, lab: u32) -> Self {
        Self { rd, geo, smr, lab }
    }

    /// Amount on a work channel, `None` for hse.
    pub fn get(&self, channel: Channel) -> Option<u32> {
        match channel {
            Channel::Rd => Some(self.rd),
            Channel::Geo => Some(self.geo),
            Channel::Smr => Some(self.smr),
            Channel::Lab => Some(self.lab),
            Channel::Hse => None,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> Option<&mut u32> {
        match channel {
            Channel::Rd => Some(&mut self.rd),
            Channel::Geo => Some(&mut self.geo),
            Channel::Smr => Some(&mut self.smr),
            Channel::Lab => Some(&mut self.lab),
            Channel::Hse => None,
        }
    }

    /// True when every channel of `self` is within the matching channel of `limit`.
    pub fn within(&self, limit: &WorkAmounts) -> bool {
        self.rd <= limit.rd && self.geo <= limit.geo && self.smr <= limit.smr && self.lab <= limit.lab
    }
}

/// Task archetype identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RoadEarthwork,
    RoadAsphalt,
    BridgePier,
    BridgeSpan,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RoadEarthwork => "road_earthwork",
            TaskType::RoadAsphalt => "road_asphalt",
            TaskType::BridgePier => "bridge_pier",
            TaskType::BridgeSpan => "bridge_span",
        }
    }
}

/// Dependency template: the prerequisite archetype, optionally scoped to a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "type")]
    pub task_type: TaskType,

    #[serde(rename = "sectionID", default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

/// Cause of a block; decides which capacity channel clears it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    DesignError,
    SafetyViolation,
}

impl BlockType {
    /// Channel that must be spent to clear this block.
    pub fn unblock_channel(&self) -> Channel {
        match self {
            BlockType::DesignError => Channel::Rd,
            BlockType::SafetyViolation => Channel::Hse,
        }
    }
}

/// Overlay status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Normal,
    Curing,
    Expedite,
}

/// A construction task on the board
///
/// Fields are private; the pipeline moves tasks only through the methods
/// below so the progress invariant cannot be broken from outside.
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{Channel, Stage, SubStage, Task, TaskType, WorkAmounts};
///
/// let mut task = Task::new(
///     "task-1".to_string(),
///     "Road: earthwork (section A)".to_string(),
///     TaskType::RoadEarthwork,
///     WorkAmounts::new(2, 4, 10, 8),
/// );
/// task.place(Stage::Rd, SubStage::Doing);
/// task.apply_work(Channel::Rd, 5);
/// assert_eq!(task.progress().rd, 0); // floored at zero
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: String,
    title: String,

    #[serde(rename = "type")]
    task_type: TaskType,

    /// Physical section; scopes dependency lookups
    #[serde(rename = "sectionID", default, skip_serializing_if = "Option::is_none")]
    section_id: Option<String>,

    /// Remaining work per channel
    progress: WorkAmounts,

    /// Original totals, immutable after creation
    requirements: WorkAmounts,

    #[serde(default)]
    dependency: Option<Dependency>,

    #[serde(rename = "columnId")]
    stage: Stage,

    #[serde(rename = "subColumn")]
    sub_stage: SubStage,

    is_blocked: bool,

    #[serde(default)]
    block_type: Option<BlockType>,

    /// Days left in curing (bridge pier only)
    #[serde(default)]
    curing_days: Option<u32>,

    #[serde(default)]
    status: TaskStatus,

    /// Due day; each day past it costs a late penalty
    #[serde(default)]
    fixed_date: Option<u32>,

    revenue_on_acceptance: i64,
    revenue_on_done: i64,
    created_at: u32,

    #[serde(default)]
    completed_at: Option<u32>,
}

impl Task {
    /// Create a task in the backlog with full remaining work
    pub fn new(id: String, title: String, task_type: TaskType, requirements: WorkAmounts) -> Self {
        Self {
            id,
            title,
            task_type,
            section_id: None,
            progress: requirements,
            requirements,
            dependency: None,
            stage: Stage::Backlog,
            sub_stage: SubStage::Ready,
            is_blocked: false,
            block_type: None,
            curing_days: None,
            status: TaskStatus::Normal,
            fixed_date: None,
            revenue_on_acceptance: 0,
            revenue_on_done: 0,
            created_at: 0,
            completed_at: None,
        }
    }

    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Option<Dependency>) -> Self {
        self.dependency = dependency;
        self
    }

    pub fn with_revenue(mut self, on_acceptance: i64, on_done: i64) -> Self {
        self.revenue_on_acceptance = on_acceptance;
        self.revenue_on_done = on_done;
        self
    }

    pub fn with_fixed_date(mut self, day: u32) -> Self {
        self.fixed_date = Some(day);
        self
    }

    pub fn created_on(mut self, day: u32) -> Self {
        self.created_at = day;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn section_id(&self) -> Option<&str> {
        self.section_id.as_deref()
    }

    pub fn progress(&self) -> &WorkAmounts {
        &self.progress
    }

    pub fn requirements(&self) -> &WorkAmounts {
        &self.requirements
    }

    pub fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn sub_stage(&self) -> SubStage {
        self.sub_stage
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.block_type
    }

    pub fn curing_days(&self) -> Option<u32> {
        self.curing_days
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_curing(&self) -> bool {
        self.status == TaskStatus::Curing
    }

    pub fn fixed_date(&self) -> Option<u32> {
        self.fixed_date
    }

    pub fn revenue_on_acceptance(&self) -> i64 {
        self.revenue_on_acceptance
    }

    pub fn revenue_on_done(&self) -> i64 {
        self.revenue_on_done
    }

    pub fn created_at(&self) -> u32 {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<u32> {
        self.completed_at
    }

    /// Check if task is at a position (stage + sub-stage)
    pub fn is_at(&self, stage: Stage, sub_stage: SubStage) -> bool {
        self.stage == stage && self.sub_stage == sub_stage
    }

    /// Remaining work on the channel of the current stage
    ///
    /// `None` outside the work stages.
    pub fn active_remaining(&self) -> Option<u32> {
        self.stage.channel().and_then(|c| self.progress.get(c))
    }

    /// True when the current stage's channel has no work left
    pub fn is_stage_complete(&self) -> bool {
        self.active_remaining() == Some(0)
    }

    /// True when a day tick may start or advance this task
    pub fn is_workable(&self) -> bool {
        !self.is_blocked && self.status != TaskStatus::Curing
    }

    /// Days past the due date as of `day` (0 if not overdue or no due date)
    pub fn days_late(&self, day: u32) -> u32 {
        match self.fixed_date {
            Some(due) if self.stage != Stage::Done => day.saturating_sub(due),
            _ => 0,
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Move to a stage and sub-stage
    pub fn place(&mut self, stage: Stage, sub_stage: SubStage) {
        self.stage = stage;
        self.sub_stage = sub_stage;
    }

    /// Burn work on a channel, floored at zero
    ///
    /// Returns the work actually absorbed (excess is wasted). Hse is never
    /// absorbed by task progress.
    pub fn apply_work(&mut self, channel: Channel, amount: u32) -> u32 {
        match self.progress.slot_mut(channel) {
            Some(remaining) => {
                let absorbed = (*remaining).min(amount);
                *remaining -= absorbed;
                absorbed
            }
            None => 0,
        }
    }

    pub fn block(&mut self, block_type: BlockType) {
        self.is_blocked = true;
        self.block_type = Some(block_type);
    }

    pub fn unblock(&mut self) {
        self.is_blocked = false;
        self.block_type = None;
    }

    /// Enter curing: stay in the current stage's ready slot for `days`
    pub fn start_curing(&mut self, days: u32) {
        self.status = TaskStatus::Curing;
        self.curing_days = Some(days);
        self.sub_stage = SubStage::Ready;
    }

    /// Count one curing day down; returns the days still left
    pub fn tick_curing(&mut self) -> u32 {
        let left = self.curing_days.unwrap_or(0).saturating_sub(1);
        self.curing_days = Some(left);
        left
    }

    /// Leave curing into `stage`'s ready slot
    pub fn finish_curing(&mut self, stage: Stage) {
        self.status = TaskStatus::Normal;
        self.curing_days = Some(0);
        self.place(stage, SubStage::Ready);
    }

    /// Relocate to the expedite lane
    pub fn expedite(&mut self) {
        self.status = TaskStatus::Expedite;
        self.place(Stage::Expedite, SubStage::Ready);
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub fn set_fixed_date(&mut self, day: Option<u32>) {
        self.fixed_date = day;
    }

    pub fn mark_completed(&mut self, day: u32) {
        self.completed_at = Some(day);
    }
}
