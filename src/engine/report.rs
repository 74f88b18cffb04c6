// src/engine/report.rs

//! Per-task and per-build result reporting.

use std::fmt;
use std::path::PathBuf;

use crate::engine::{TaskName, TaskOutcome};
use crate::errors::TaskError;

/// What a single task run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Destination files written.
    pub written: Vec<PathBuf>,
    /// Files and directories removed (clean only).
    pub removed: Vec<PathBuf>,
    /// Sources skipped because their destination was up to date.
    pub fresh: usize,
    /// Failures collected while processing the batch.
    pub errors: Vec<TaskError>,
}

impl TaskReport {
    /// A report carrying a single failure.
    pub fn failed(err: TaskError) -> Self {
        Self {
            errors: vec![err],
            ..Self::default()
        }
    }

    pub fn outcome(&self) -> TaskOutcome {
        if self.errors.is_empty() {
            TaskOutcome::Success
        } else {
            TaskOutcome::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// All failures of one task in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub errors: Vec<TaskError>,
}

/// Aggregated result of a graph run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    succeeded: Vec<TaskName>,
    failures: Vec<TaskFailure>,
}

impl BuildReport {
    pub fn record_success(&mut self, task: impl Into<TaskName>) {
        self.succeeded.push(task.into());
    }

    pub fn record_failure(&mut self, task: impl Into<TaskName>, errors: Vec<TaskError>) {
        self.failures.push(TaskFailure {
            task: task.into(),
            errors,
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self) -> &[TaskName] {
        &self.succeeded
    }

    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    /// Failure entry for `task`, if it failed or was skipped.
    pub fn failure_of(&self, task: &str) -> Option<&TaskFailure> {
        self.failures.iter().find(|f| f.task == task)
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "{} task(s) succeeded", self.succeeded.len());
        }
        write!(
            f,
            "{} task(s) succeeded, {} failed",
            self.succeeded.len(),
            self.failures.len()
        )?;
        for failure in self.failures.iter() {
            write!(f, "\n  {}:", failure.task)?;
            for err in failure.errors.iter() {
                write!(f, "\n    - {err}")?;
            }
        }
        Ok(())
    }
}
