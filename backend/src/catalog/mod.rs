//! Task catalog
//!
//! Static configuration of the board:
//! - Task archetypes (per-channel requirements, dependency template,
//!   special handling)
//! - The stage table (board order, WIP limits, sub-pipeline flag)
//! - The seed task set a new game starts with

use crate::models::task::{Dependency, Stage, Task, TaskType, WorkAmounts};
use crate::orchestrator::GameConfig;

/// Special handling flag of an archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    /// After smr completes, wait a fixed number of days before lab
    Curing,
}

/// Static template of a task type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetype {
    pub task_type: TaskType,
    pub name: &'static str,
    pub requirements: WorkAmounts,
    /// Archetype that must reach acceptance/done first
    pub depends_on: Option<TaskType>,
    pub special: Option<Special>,
}

pub const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        task_type: TaskType::RoadEarthwork,
        name: "Road (earthwork)",
        requirements: WorkAmounts::new(2, 4, 10, 8),
        depends_on: None,
        special: None,
    },
    Archetype {
        task_type: TaskType::RoadAsphalt,
        name: "Road (asphalt)",
        requirements: WorkAmounts::new(1, 2, 15, 12),
        depends_on: Some(TaskType::RoadEarthwork),
        special: None,
    },
    Archetype {
        task_type: TaskType::BridgePier,
        name: "Bridge (piers)",
        requirements: WorkAmounts::new(5, 3, 20, 10),
        depends_on: None,
        special: Some(Special::Curing),
    },
    Archetype {
        task_type: TaskType::BridgeSpan,
        name: "Bridge (span)",
        requirements: WorkAmounts::new(4, 5, 25, 15),
        depends_on: Some(TaskType::BridgePier),
        special: None,
    },
];

/// Look up the archetype of a task type
pub fn archetype(task_type: TaskType) -> &'static Archetype {
    match task_type {
        TaskType::RoadEarthwork => &ARCHETYPES[0],
        TaskType::RoadAsphalt => &ARCHETYPES[1],
        TaskType::BridgePier => &ARCHETYPES[2],
        TaskType::BridgeSpan => &ARCHETYPES[3],
    }
}

/// True if tasks of this type cure after smr
pub fn cures_after_smr(task_type: TaskType) -> bool {
    archetype(task_type).special == Some(Special::Curing)
}

/// One board column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub stage: Stage,
    pub name: &'static str,
    /// Board order; the expedite lane sits above the board at -1
    pub order: i32,
    /// Maximum tasks in the `Doing` slot, `None` = unlimited
    pub wip_limit: Option<usize>,
    pub has_sub_stages: bool,
}

pub const STAGES: [StageSpec; 8] = [
    StageSpec {
        stage: Stage::Backlog,
        name: "Backlog",
        order: 0,
        wip_limit: None,
        has_sub_stages: false,
    },
    StageSpec {
        stage: Stage::Rd,
        name: "Working documentation",
        order: 1,
        wip_limit: Some(3),
        has_sub_stages: true,
    },
    StageSpec {
        stage: Stage::Geo,
        name: "Geodetic surveys",
        order: 2,
        wip_limit: Some(3),
        has_sub_stages: true,
    },
    StageSpec {
        stage: Stage::Smr,
        name: "Construction & installation",
        order: 3,
        wip_limit: Some(3),
        has_sub_stages: true,
    },
    StageSpec {
        stage: Stage::Lab,
        name: "Laboratory testing",
        order: 4,
        wip_limit: Some(3),
        has_sub_stages: true,
    },
    StageSpec {
        stage: Stage::Acceptance,
        name: "Acceptance",
        order: 5,
        wip_limit: None,
        has_sub_stages: false,
    },
    StageSpec {
        stage: Stage::Done,
        name: "Done",
        order: 6,
        wip_limit: None,
        has_sub_stages: false,
    },
    StageSpec {
        stage: Stage::Expedite,
        name: "Expedite",
        order: -1,
        wip_limit: None,
        has_sub_stages: false,
    },
];

pub fn stage_spec(stage: Stage) -> &'static StageSpec {
    let index = Stage::ALL
        .iter()
        .position(|s| *s == stage)
        .unwrap_or_default();
    &STAGES[index]
}

pub fn wip_limit(stage: Stage) -> Option<usize> {
    stage_spec(stage).wip_limit
}

/// Road sections seeded at game start
pub const ROAD_SECTIONS: [&str; 4] = ["A", "B", "C", "D"];

/// Bridge span seeded at game start
pub const BRIDGE_SECTION: &str = "P1";

fn seed_task(config: &GameConfig, task_type: TaskType, id: String, place: &str, section: &str) -> Task {
    let arch = archetype(task_type);
    let title = format!("{}, {}", arch.name, place);
    let dependency = arch.depends_on.map(|prerequisite| Dependency {
        task_type: prerequisite,
        section_id: Some(section.to_string()),
    });

    Task::new(id, title, task_type, arch.requirements)
        .with_section(section)
        .with_dependency(dependency)
        .with_revenue(config.revenue_on_acceptance, config.revenue_on_done)
        .created_on(0)
}

/// Generate the fixed seed task set, all in the backlog
///
/// Each road section gets an earthwork task and an asphalt task that depends
/// on it; the bridge gets a pier and a span that depends on the pier.
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{catalog, GameConfig, Stage};
///
/// let tasks = catalog::seed_tasks(&GameConfig::default());
/// assert_eq!(tasks.len(), 10);
/// assert!(tasks.iter().all(|t| t.stage() == Stage::Backlog));
/// ```
pub fn seed_tasks(config: &GameConfig) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(ROAD_SECTIONS.len() * 2 + 2);

    for section in ROAD_SECTIONS {
        tasks.push(seed_task(
            config,
            TaskType::RoadEarthwork,
            format!("task-road-earthwork-{}", section),
            &format!("section {}", section),
            section,
        ));
        tasks.push(seed_task(
            config,
            TaskType::RoadAsphalt,
            format!("task-road-asphalt-{}", section),
            &format!("section {}", section),
            section,
        ));
    }

    tasks.push(seed_task(
        config,
        TaskType::BridgePier,
        "task-bridge-pier-1".to_string(),
        "span 1",
        BRIDGE_SECTION,
    ));
    tasks.push(seed_task(
        config,
        TaskType::BridgeSpan,
        "task-bridge-span-1".to_string(),
        "span 1",
        BRIDGE_SECTION,
    ));

    tasks
}
