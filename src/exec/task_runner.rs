// src/exec/task_runner.rs

//! Runs a single task body and reports back to the runtime.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{ScheduledTask, TaskKind};
use crate::engine::{RuntimeEvent, TaskReport};
use crate::errors::TaskError;
use crate::pipeline::Pipeline;

/// Run one scheduled task on the blocking pool and emit `TaskCompleted`.
///
/// Transform tasks are synchronous and potentially slow (image encoding),
/// so they never run on the runtime's worker threads. A panicking task is
/// reported as `TaskError::Aborted`.
pub async fn run_task(
    task: ScheduledTask,
    pipeline: Arc<Pipeline>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    if task.kind == TaskKind::Watch {
        debug!(task = %task.name, "watch node has no task body");
        return;
    }

    info!(task = %task.name, origin = ?task.origin, "running task");

    let kind = task.kind;
    let report = match tokio::task::spawn_blocking(move || pipeline.run(kind)).await {
        Ok(report) => report,
        Err(join_err) => {
            error!(task = %task.name, error = %join_err, "task panicked");
            TaskReport::failed(TaskError::Aborted(join_err.to_string()))
        }
    };

    debug!(task = %task.name, success = report.is_success(), "task body returned");

    let event = RuntimeEvent::TaskCompleted {
        task: task.name.clone(),
        origin: task.origin,
        report,
    };
    if runtime_tx.send(event).await.is_err() {
        warn!(task = %task.name, "runtime channel closed before completion was delivered");
    }
}
