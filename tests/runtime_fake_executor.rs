// tests/runtime_fake_executor.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep, timeout};

use assetpipe::config::PathTable;
use assetpipe::dag::{BuildGraph, Scheduler, TaskKind, default_build_plan, single_task_plan};
use assetpipe::engine::{CoreRuntime, Runtime, RuntimeEvent, TaskOrigin, WatchLoop};
use assetpipe::types::{AssetClass, ReloadPolicy};
use assetpipe_test_utils::fake_executor::{FakeExecutor, FakeLog};

type TestResult = Result<(), Box<dyn Error>>;

/// Poll the shared log until `pred` holds (or give up after 3 seconds).
async fn wait_for(log: &Arc<Mutex<FakeLog>>, pred: impl Fn(&FakeLog) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if pred(&log.lock().unwrap()) {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

fn core_for(graph: BuildGraph) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::new(graph),
        WatchLoop::from_table(&PathTable::default()),
    )
}

#[tokio::test]
async fn styles_change_rebuilds_styles_and_reloads_once() -> TestResult {
    init_tracing();

    let graph = BuildGraph::from_plan(&default_build_plan(true))?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor =
        FakeExecutor::new(rt_tx.clone()).writes("styles", &["./dist/css/main.min.css"]);
    let log = executor.log();

    let handle = tokio::spawn(Runtime::new(core_for(graph), rt_rx, executor).run());

    assert!(wait_for(&log, |l| l.watch_starts == 1).await, "watch never started");
    assert_eq!(log.lock().unwrap().executed.len(), 5);

    rt_tx
        .send(RuntimeEvent::SourceChanged {
            class: AssetClass::Styles,
            path: "src/styles/main.scss".to_string(),
        })
        .await?;

    assert!(wait_for(&log, |l| l.reloads.len() == 1).await, "no reload delivered");

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let report = timeout(Duration::from_secs(3), handle).await???;
    assert!(report.is_success(), "{report}");

    let log = log.lock().unwrap().clone();
    assert_eq!(log.rebuilds_of("styles"), 1);
    assert_eq!(log.rebuilds_of("scripts"), 0);
    assert_eq!(log.rebuilds_of("markup"), 0);
    assert_eq!(log.watch_starts, 1);

    let signal = &log.reloads[0];
    assert_eq!(signal.class, AssetClass::Styles);
    assert_eq!(signal.policy, ReloadPolicy::Inject);
    assert_eq!(signal.paths, vec![PathBuf::from("./dist/css/main.min.css")]);

    let (name, origin) = log.executed.last().unwrap();
    assert_eq!(name, "styles");
    assert_eq!(*origin, TaskOrigin::Rebuild { class: AssetClass::Styles });
    Ok(())
}

#[tokio::test]
async fn failed_rebuild_keeps_watching_without_reload() -> TestResult {
    init_tracing();

    let graph = BuildGraph::from_plan(&single_task_plan(TaskKind::Watch))?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = FakeExecutor::new(rt_tx.clone()).fail("scripts");
    let log = executor.log();

    let handle = tokio::spawn(Runtime::new(core_for(graph), rt_rx, executor).run());
    assert!(wait_for(&log, |l| l.watch_starts == 1).await);

    rt_tx
        .send(RuntimeEvent::SourceChanged {
            class: AssetClass::Scripts,
            path: "src/scripts/app.js".to_string(),
        })
        .await?;
    assert!(wait_for(&log, |l| l.rebuilds_of("scripts") == 1).await);

    // The loop is still alive: a markup change is picked up afterwards.
    rt_tx
        .send(RuntimeEvent::SourceChanged {
            class: AssetClass::Markup,
            path: "src/index.html".to_string(),
        })
        .await?;
    assert!(wait_for(&log, |l| l.reloads.len() == 1).await);

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let report = timeout(Duration::from_secs(3), handle).await???;
    // Rebuild failures are logged, not part of the graph run's report.
    assert!(report.is_success());

    let log = log.lock().unwrap().clone();
    assert_eq!(log.reloads[0].class, AssetClass::Markup);
    assert_eq!(log.reloads[0].policy, ReloadPolicy::Full);
    Ok(())
}

#[tokio::test]
async fn images_rebuild_sends_no_reload() -> TestResult {
    init_tracing();

    let graph = BuildGraph::from_plan(&single_task_plan(TaskKind::Watch))?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(rt_tx.clone());
    let log = executor.log();

    let handle = tokio::spawn(Runtime::new(core_for(graph), rt_rx, executor).run());
    assert!(wait_for(&log, |l| l.watch_starts == 1).await);

    rt_tx
        .send(RuntimeEvent::SourceChanged {
            class: AssetClass::Images,
            path: "src/images/logo.png".to_string(),
        })
        .await?;
    assert!(wait_for(&log, |l| l.rebuilds_of("images") == 1).await);

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    timeout(Duration::from_secs(3), handle).await???;

    assert!(log.lock().unwrap().reloads.is_empty());
    Ok(())
}
