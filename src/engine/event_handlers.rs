// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, info, warn};

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep, TaskKind};
use crate::engine::report::{BuildReport, TaskReport};
use crate::engine::watch_loop::{ReloadSignal, WatchLoop};
use crate::engine::{TaskName, TaskOrigin};
use crate::errors::TaskError;
use crate::types::AssetClass;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// Run these tasks.
    DispatchTasks(Vec<ScheduledTask>),
    /// The watch node was reached: start the watcher and dev server.
    StartWatch,
    /// Tell connected sessions about a successful rebuild.
    Reload(ReloadSignal),
    /// The graph run finished and nothing else will happen.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Start the graph run and dispatch its roots.
pub fn start_graph_run(
    scheduler: &mut Scheduler,
    watch: &mut WatchLoop,
    report: &mut BuildReport,
) -> CoreStep {
    let step = scheduler.start_run();
    apply_scheduler_step(scheduler, watch, report, step)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    watch: &mut WatchLoop,
    report: &mut BuildReport,
    task: TaskName,
    origin: TaskOrigin,
    task_report: TaskReport,
) -> CoreStep {
    match origin {
        TaskOrigin::Graph { run_id } => {
            if scheduler.current_run_id() != Some(run_id) {
                warn!(task = %task, run_id, "completion for a finished run; ignoring");
                return CoreStep::continue_with(Vec::new());
            }

            log_task_report(&task, &task_report);
            let outcome = task_report.outcome();
            if task_report.is_success() {
                report.record_success(task.clone());
            } else {
                report.record_failure(task.clone(), task_report.errors);
            }

            let step = scheduler.step_completion(&task, outcome);
            apply_scheduler_step(scheduler, watch, report, step)
        }
        TaskOrigin::Rebuild { class } => handle_rebuild_completion(watch, class, task_report),
    }
}

/// Handle a change to a source file.
pub fn handle_source_changed(watch: &mut WatchLoop, class: AssetClass, path: String) -> CoreStep {
    if !watch.is_active() {
        debug!(%class, path = %path, "source changed before watch started; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    let mut commands = Vec::new();
    if watch.on_change(class) {
        info!(%class, path = %path, "source changed; rebuilding");
        commands.push(CoreCommand::DispatchTasks(vec![ScheduledTask::rebuild(class)]));
    } else {
        debug!(%class, path = %path, "source changed during rebuild; coalesced");
    }
    CoreStep::continue_with(commands)
}

fn handle_rebuild_completion(
    watch: &mut WatchLoop,
    class: AssetClass,
    task_report: TaskReport,
) -> CoreStep {
    let mut commands = Vec::new();

    if task_report.is_success() {
        info!(
            %class,
            written = task_report.written.len(),
            fresh = task_report.fresh,
            "rebuild finished"
        );
        if let Some(signal) = watch.reload_signal(class, &task_report) {
            commands.push(CoreCommand::Reload(signal));
        }
    } else {
        for err in task_report.errors.iter() {
            error!(%class, error = %err, "rebuild failed");
        }
    }

    if watch.on_rebuild_finished(class) {
        info!(%class, "sources changed during rebuild; rebuilding again");
        commands.push(CoreCommand::DispatchTasks(vec![ScheduledTask::rebuild(class)]));
    }

    CoreStep::continue_with(commands)
}

/// Turn a scheduler step into commands.
///
/// A ready watch node is never dispatched as a task: it activates the watch
/// loop and stays `Running` for the rest of the process.
fn apply_scheduler_step(
    scheduler: &Scheduler,
    watch: &mut WatchLoop,
    report: &mut BuildReport,
    step: SchedulerStep,
) -> CoreStep {
    let mut commands = Vec::new();

    for (skipped, upstream) in step.newly_skipped {
        warn!(task = %skipped, upstream = %upstream, "task skipped");
        report.record_failure(skipped, vec![TaskError::Graph { upstream }]);
    }

    let (watch_nodes, tasks): (Vec<ScheduledTask>, Vec<ScheduledTask>) = step
        .newly_scheduled
        .into_iter()
        .partition(|t| t.kind == TaskKind::Watch);

    if !tasks.is_empty() {
        commands.push(CoreCommand::DispatchTasks(tasks));
    }

    if !watch_nodes.is_empty() && !watch.is_active() {
        info!("build finished; starting watch mode");
        watch.activate();
        commands.push(CoreCommand::StartWatch);
    }

    let mut keep_running = true;
    if step.run_just_finished && scheduler.is_idle() && !watch.is_active() {
        info!(success = report.is_success(), "build graph finished");
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn log_task_report(task: &str, task_report: &TaskReport) {
    if task_report.is_success() {
        info!(
            task = %task,
            written = task_report.written.len(),
            removed = task_report.removed.len(),
            fresh = task_report.fresh,
            "task finished"
        );
    } else {
        for err in task_report.errors.iter() {
            error!(task = %task, error = %err, "task error");
        }
    }
}
