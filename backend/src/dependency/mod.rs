//! Dependency resolver
//!
//! Answers "is this task unblocked to enter the pipeline / its next stage?".
//! The answer is recomputed from the live task set on every call; nothing is
//! cached between calls.

use crate::models::task::{Stage, Task};

/// True if the task carries no dependency, or some other task of the
/// prerequisite archetype (in the same section when scoped) sits in
/// acceptance or done.
///
/// # Example
/// ```
/// use kanban_sim_core_rs::{catalog, dependency, GameConfig};
///
/// let tasks = catalog::seed_tasks(&GameConfig::default());
/// let earthwork = &tasks[0];
/// let asphalt = &tasks[1];
///
/// assert!(dependency::is_satisfied(earthwork, &tasks));
/// assert!(!dependency::is_satisfied(asphalt, &tasks));
/// ```
pub fn is_satisfied(task: &Task, tasks: &[Task]) -> bool {
    task.dependency().is_none() || prerequisite(task, tasks).is_some()
}

/// The task currently satisfying `task`'s dependency, if any
pub fn prerequisite<'a>(task: &Task, tasks: &'a [Task]) -> Option<&'a Task> {
    let dep = task.dependency()?;

    tasks.iter().find(|other| {
        other.id() != task.id()
            && other.task_type() == dep.task_type
            && dep
                .section_id
                .as_deref()
                .map_or(true, |section| other.section_id() == Some(section))
            && matches!(other.stage(), Stage::Acceptance | Stage::Done)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::models::task::SubStage;
    use crate::orchestrator::GameConfig;

    fn find<'a>(tasks: &'a mut [Task], id: &str) -> &'a mut Task {
        tasks.iter_mut().find(|t| t.id() == id).unwrap()
    }

    #[test]
    fn test_section_scope_is_respected() {
        let mut tasks = catalog::seed_tasks(&GameConfig::default());
        find(&mut tasks, "task-road-earthwork-B").place(Stage::Acceptance, SubStage::Ready);

        let asphalt_a = tasks.iter().find(|t| t.id() == "task-road-asphalt-A").unwrap();
        let asphalt_b = tasks.iter().find(|t| t.id() == "task-road-asphalt-B").unwrap();

        assert!(!is_satisfied(asphalt_a, &tasks), "section B must not unlock section A");
        assert!(is_satisfied(asphalt_b, &tasks));
    }

    #[test]
    fn test_prerequisite_in_lab_is_not_enough() {
        let mut tasks = catalog::seed_tasks(&GameConfig::default());
        find(&mut tasks, "task-bridge-pier-1").place(Stage::Lab, SubStage::Doing);

        let span = tasks.iter().find(|t| t.id() == "task-bridge-span-1").unwrap();
        assert!(!is_satisfied(span, &tasks));

        find(&mut tasks, "task-bridge-pier-1").place(Stage::Done, SubStage::Ready);
        let span = tasks.iter().find(|t| t.id() == "task-bridge-span-1").unwrap();
        assert_eq!(
            prerequisite(span, &tasks).map(|t| t.id()),
            Some("task-bridge-pier-1")
        );
    }
}
