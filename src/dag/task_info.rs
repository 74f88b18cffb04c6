// src/dag/task_info.rs

//! Task metadata and per-run state management.

use crate::dag::graph::{TaskKind, TaskNode};
use crate::engine::{TaskName, TaskOrigin};
use crate::types::AssetClass;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task is part of this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task completed successfully in this run.
    DoneSuccess,
    /// Task ran and failed in this run.
    DoneFailed,
    /// Task never ran because an upstream task failed.
    Skipped,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Skipped
        )
    }
}

/// Public, read-only view of a task's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task information from the graph, plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Direct dependencies of this task.
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,
}

impl TaskInfo {
    pub fn from_node(node: &TaskNode, deps: Vec<TaskName>) -> Self {
        Self {
            name: node.name.clone(),
            kind: node.kind,
            deps,
            run_state: None,
        }
    }
}

/// Description of a task that should be run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Whether this belongs to a graph run or a watch-loop rebuild.
    pub origin: TaskOrigin,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            kind: info.kind,
            origin: TaskOrigin::Graph { run_id },
        }
    }

    /// A watch-loop rebuild of one asset class, outside any graph run.
    pub fn rebuild(class: AssetClass) -> Self {
        let kind = TaskKind::Transform(class);
        Self {
            name: kind.default_name(),
            kind,
            origin: TaskOrigin::Rebuild { class },
        }
    }
}
