// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - starting the watch session and forwarding reload signals
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! transforms.

use crate::dag::Scheduler;
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{
    CoreStep, handle_source_changed, handle_task_completion, start_graph_run,
};
use crate::engine::report::BuildReport;
use crate::engine::watch_loop::{ClassState, WatchLoop};
use crate::types::AssetClass;

/// Pure core runtime state.
///
/// This owns:
/// - the graph scheduler
/// - the per-class watch loop
/// - the build report accumulated over the graph run
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    watch: WatchLoop,
    report: BuildReport,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, watch: WatchLoop) -> Self {
        Self {
            scheduler,
            watch,
            report: BuildReport::default(),
        }
    }

    /// Begin the graph run. Must be called once before feeding events.
    pub fn start(&mut self) -> CoreStep {
        start_graph_run(&mut self.scheduler, &mut self.watch, &mut self.report)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted {
                task,
                origin,
                report,
            } => handle_task_completion(
                &mut self.scheduler,
                &mut self.watch,
                &mut self.report,
                task,
                origin,
                report,
            ),
            RuntimeEvent::SourceChanged { class, path } => {
                handle_source_changed(&mut self.watch, class, path)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn watch_active(&self) -> bool {
        self.watch.is_active()
    }

    pub fn watch_state(&self, class: AssetClass) -> ClassState {
        self.watch.state(class)
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn into_report(self) -> BuildReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathTable;
    use crate::dag::{BuildGraph, ScheduledTask, default_build_plan};
    use crate::engine::event_handlers::CoreCommand;
    use crate::engine::TaskOrigin;
    use crate::engine::report::TaskReport;
    use crate::errors::{TaskError, TransformError};

    fn core(with_watch: bool) -> CoreRuntime {
        let graph = BuildGraph::from_plan(&default_build_plan(with_watch)).unwrap();
        CoreRuntime::new(
            Scheduler::new(graph),
            WatchLoop::from_table(&PathTable::default()),
        )
    }

    fn dispatched(step: &CoreStep) -> Vec<ScheduledTask> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(t) => Some(t.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn complete(core: &mut CoreRuntime, task: &ScheduledTask, report: TaskReport) -> CoreStep {
        core.step(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            origin: task.origin,
            report,
        })
    }

    /// Drive the graph to completion, succeeding every task.
    fn run_graph(core: &mut CoreRuntime) -> CoreStep {
        let mut queue = dispatched(&core.start());
        let mut last = None;
        while let Some(task) = queue.pop() {
            let step = complete(core, &task, TaskReport::default());
            queue.extend(dispatched(&step));
            last = Some(step);
        }
        last.unwrap()
    }

    #[test]
    fn once_mode_exits_after_last_task() {
        let mut core = core(false);
        let last = run_graph(&mut core);
        assert!(!last.keep_running);
        assert!(last.commands.contains(&CoreCommand::RequestExit));
        assert!(core.report().is_success());
        assert_eq!(core.report().succeeded().len(), 5);
    }

    #[test]
    fn watch_node_starts_watch_and_keeps_running() {
        let mut core = core(true);
        let last = run_graph(&mut core);
        assert!(last.keep_running);
        assert!(last.commands.contains(&CoreCommand::StartWatch));
        assert!(core.watch_active());
        assert!(!core.is_idle());
    }

    #[test]
    fn markup_failure_skips_rest_and_exits() {
        let mut core = core(true);
        let clean = dispatched(&core.start()).remove(0);
        let markup = dispatched(&complete(&mut core, &clean, TaskReport::default())).remove(0);

        let err = TaskError::from(TransformError::new("template", "src/index.html", "boom"));
        let step = complete(&mut core, &markup, TaskReport::failed(err));

        assert!(!step.keep_running);
        assert!(!core.watch_active());
        let report = core.report();
        assert_eq!(report.failures().len(), 5);
        assert!(matches!(
            report.failure_of("watch").unwrap().errors[0],
            TaskError::Graph { ref upstream } if upstream == "markup"
        ));
    }

    #[test]
    fn rebuild_reports_do_not_touch_the_build_report() {
        let mut core = core(true);
        run_graph(&mut core);

        let step = core.step(RuntimeEvent::SourceChanged {
            class: AssetClass::Scripts,
            path: "src/scripts/app.js".into(),
        });
        let rebuild = dispatched(&step).remove(0);
        assert_eq!(rebuild.origin, TaskOrigin::Rebuild { class: AssetClass::Scripts });

        let err = TaskError::io("src/scripts/app.js", "gone");
        let step = complete(&mut core, &rebuild, TaskReport::failed(err));
        assert!(step.keep_running);
        assert!(step.commands.is_empty());
        assert!(core.report().is_success());
        assert_eq!(core.watch_state(AssetClass::Scripts), ClassState::Idle);
    }
}
