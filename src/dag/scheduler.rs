// src/dag/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::{BuildGraph, TaskNode};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a task is ready to run (deps satisfied)
/// - marking tasks as succeeded or failed
/// - skipping dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: BuildGraph,
    tasks: BTreeMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    pub fn new(graph: BuildGraph) -> Self {
        let mut tasks = BTreeMap::new();

        for name in graph.tasks() {
            if let Some(node) = graph.node(name) {
                let deps = graph.dependencies_of(name).to_vec();
                tasks.insert(name.to_string(), TaskInfo::from_node(node, deps));
            }
        }

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    pub fn node(&self, task: &str) -> Option<&TaskNode> {
        self.graph.node(task)
    }

    /// Start a new run over the whole graph and return the first tasks to
    /// dispatch (the roots).
    pub fn start_run(&mut self) -> SchedulerStep {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new graph run");

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        for root in self.graph.roots() {
            manager.mark_task_and_dependents_pending(&root);
        }
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            run_just_finished,
            ..SchedulerStep::default()
        }
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(task = %task, "completion with no active run; ignoring");
                return SchedulerStep::default();
            }
        };

        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state == Some(RunState::Running) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    debug!(task = %info.name, run_id, "task completed successfully");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    step.newly_scheduled = manager.collect_new_ready_tasks();
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    warn!(task = %info.name, run_id, "task failed; skipping dependents");
                    step.newly_failed.push(info.name.clone());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    step.newly_skipped = manager.mark_dependents_skipped(task);
                }
            },
            Some(_) => {
                warn!(task = %task, "completion for task that is not running; ignoring");
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }

    /// Returns the task names, sorted.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Clear `current_run_id` if every task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::graph::TaskKind;
    use crate::dag::plan::{Step, default_build_plan};
    use crate::types::AssetClass;

    fn names(step: &SchedulerStep) -> Vec<String> {
        let mut v: Vec<String> = step.newly_scheduled.iter().map(|t| t.name.clone()).collect();
        v.sort();
        v
    }

    #[test]
    fn series_waits_for_each_predecessor() {
        let graph = BuildGraph::from_plan(&default_build_plan(false)).unwrap();
        let mut s = Scheduler::new(graph);

        assert_eq!(names(&s.start_run()), vec!["clean"]);
        assert_eq!(
            names(&s.step_completion("clean", TaskOutcome::Success)),
            vec!["markup"]
        );
        assert_eq!(
            names(&s.step_completion("markup", TaskOutcome::Success)),
            vec!["images", "scripts", "styles"]
        );
        s.step_completion("styles", TaskOutcome::Success);
        s.step_completion("scripts", TaskOutcome::Success);
        let last = s.step_completion("images", TaskOutcome::Success);
        assert!(last.run_just_finished);
        assert!(s.is_idle());
    }

    #[test]
    fn failure_skips_transitive_dependents() {
        let plan = Step::Series(vec![
            Step::task(TaskKind::Clean),
            Step::task(TaskKind::Transform(AssetClass::Markup)),
            Step::task(TaskKind::Transform(AssetClass::Styles)),
        ]);
        let mut s = Scheduler::new(BuildGraph::from_plan(&plan).unwrap());
        s.start_run();

        let step = s.step_completion("clean", TaskOutcome::Failed);
        assert_eq!(step.newly_failed, vec!["clean".to_string()]);
        assert_eq!(step.newly_skipped.len(), 2);
        assert!(step.run_just_finished);
        assert_eq!(s.run_state_of("styles"), Some(TaskRunState::Skipped));
    }

    #[test]
    fn dependency_outside_the_run_is_never_satisfied() {
        use crate::dag::state_manager::ReadOnlyStateManager;

        let plan = Step::Series(vec![
            Step::task(TaskKind::Clean),
            Step::task(TaskKind::Transform(AssetClass::Markup)),
        ]);
        let mut s = Scheduler::new(BuildGraph::from_plan(&plan).unwrap());
        s.start_run();
        s.step_completion("clean", TaskOutcome::Success);
        let finished = s.step_completion("markup", TaskOutcome::Success);
        assert!(finished.run_just_finished);

        // A finished run leaves no credit behind for the next one.
        for info in s.tasks.values_mut() {
            info.run_state = None;
        }
        let ro = ReadOnlyStateManager::new(&s.tasks);
        assert!(!ro.deps_satisfied_for_info(&s.tasks["markup"]));

        assert_eq!(names(&s.start_run()), vec!["clean"]);
    }
}
