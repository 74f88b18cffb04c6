// tests/watch_loop.rs

use assetpipe::config::PathTable;
use assetpipe::dag::{BuildGraph, ScheduledTask, Scheduler, TaskKind, single_task_plan};
use assetpipe::engine::{
    ClassState, CoreCommand, CoreRuntime, CoreStep, RuntimeEvent, TaskOrigin, TaskReport, WatchLoop,
};
use assetpipe::types::AssetClass;

fn watching_core() -> CoreRuntime {
    let graph = BuildGraph::from_plan(&single_task_plan(TaskKind::Watch)).unwrap();
    let mut core = CoreRuntime::new(
        Scheduler::new(graph),
        WatchLoop::from_table(&PathTable::default()),
    );
    let start = core.start();
    assert!(start.commands.contains(&CoreCommand::StartWatch));
    assert!(start.keep_running);
    core
}

fn changed(core: &mut CoreRuntime, class: AssetClass) -> CoreStep {
    core.step(RuntimeEvent::SourceChanged {
        class,
        path: format!("src/{class}/x"),
    })
}

fn finished(core: &mut CoreRuntime, class: AssetClass) -> CoreStep {
    core.step(RuntimeEvent::TaskCompleted {
        task: class.to_string(),
        origin: TaskOrigin::Rebuild { class },
        report: TaskReport::default(),
    })
}

fn rebuilds(step: &CoreStep) -> Vec<ScheduledTask> {
    step.commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchTasks(t) => Some(t.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[test]
fn changes_during_rebuild_coalesce_into_one_follow_up() {
    let mut core = watching_core();

    let first = changed(&mut core, AssetClass::Styles);
    assert_eq!(rebuilds(&first), vec![ScheduledTask::rebuild(AssetClass::Styles)]);
    assert_eq!(
        core.watch_state(AssetClass::Styles),
        ClassState::Rebuilding { pending: false }
    );

    // Two more changes while the rebuild runs: no new dispatch.
    assert!(rebuilds(&changed(&mut core, AssetClass::Styles)).is_empty());
    assert!(rebuilds(&changed(&mut core, AssetClass::Styles)).is_empty());
    assert_eq!(
        core.watch_state(AssetClass::Styles),
        ClassState::Rebuilding { pending: true }
    );

    // First rebuild done: exactly one follow-up.
    let done = finished(&mut core, AssetClass::Styles);
    assert_eq!(rebuilds(&done).len(), 1);
    assert!(
        done.commands
            .iter()
            .any(|c| matches!(c, CoreCommand::Reload(s) if s.class == AssetClass::Styles))
    );

    // Follow-up done: back to idle, nothing else queued.
    let done = finished(&mut core, AssetClass::Styles);
    assert!(rebuilds(&done).is_empty());
    assert_eq!(core.watch_state(AssetClass::Styles), ClassState::Idle);
}

#[test]
fn classes_rebuild_independently() {
    let mut core = watching_core();

    assert_eq!(rebuilds(&changed(&mut core, AssetClass::Styles)).len(), 1);
    assert_eq!(rebuilds(&changed(&mut core, AssetClass::Scripts)).len(), 1);

    assert!(matches!(
        core.watch_state(AssetClass::Scripts),
        ClassState::Rebuilding { .. }
    ));
    assert_eq!(core.watch_state(AssetClass::Images), ClassState::Idle);

    finished(&mut core, AssetClass::Scripts);
    assert_eq!(core.watch_state(AssetClass::Scripts), ClassState::Idle);
    assert!(matches!(
        core.watch_state(AssetClass::Styles),
        ClassState::Rebuilding { .. }
    ));
}

#[test]
fn changes_before_watch_start_are_ignored() {
    let graph = BuildGraph::from_plan(&single_task_plan(TaskKind::Clean)).unwrap();
    let mut core = CoreRuntime::new(
        Scheduler::new(graph),
        WatchLoop::from_table(&PathTable::default()),
    );
    core.start();

    let step = changed(&mut core, AssetClass::Markup);
    assert!(step.commands.is_empty());
    assert!(step.keep_running);
    assert!(!core.watch_active());
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = watching_core();
    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
}
