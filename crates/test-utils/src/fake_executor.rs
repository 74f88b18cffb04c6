use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetpipe::dag::ScheduledTask;
use assetpipe::engine::{ReloadSignal, RuntimeEvent, TaskOrigin, TaskReport};
use assetpipe::errors::{Result, TaskError, TransformError};
use assetpipe::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// Everything the fake executor observed.
#[derive(Debug, Default, Clone)]
pub struct FakeLog {
    /// Tasks in dispatch order, with why they ran.
    pub executed: Vec<(String, TaskOrigin)>,
    pub watch_starts: usize,
    pub reloads: Vec<ReloadSignal>,
}

impl FakeLog {
    pub fn executed_names(&self) -> Vec<String> {
        self.executed.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn rebuilds_of(&self, task: &str) -> usize {
        self.executed
            .iter()
            .filter(|(name, origin)| name == task && matches!(origin, TaskOrigin::Rebuild { .. }))
            .count()
    }
}

/// A fake executor that:
/// - records which tasks were "run", watch starts and reload broadcasts
/// - immediately reports `TaskCompleted` for each scheduled task, failing
///   the ones configured with [`FakeExecutor::fail`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: Arc<Mutex<FakeLog>>,
    failing: BTreeSet<String>,
    written: BTreeMap<String, Vec<PathBuf>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            log: Arc::new(Mutex::new(FakeLog::default())),
            failing: BTreeSet::new(),
            written: BTreeMap::new(),
        }
    }

    /// Make every run of `task` fail with a transform error.
    pub fn fail(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    /// Report these destination paths as written by `task`.
    pub fn writes(mut self, task: &str, paths: &[&str]) -> Self {
        self.written
            .insert(task.to_string(), paths.iter().map(PathBuf::from).collect());
        self
    }

    /// Shared view of the log, usable after the executor moved into the
    /// runtime.
    pub fn log(&self) -> Arc<Mutex<FakeLog>> {
        Arc::clone(&self.log)
    }

    fn report_for(&self, task: &str) -> TaskReport {
        if self.failing.contains(task) {
            return TaskReport::failed(TaskError::Transform(TransformError::new(
                "fake",
                task,
                "configured to fail",
            )));
        }
        TaskReport {
            written: self.written.get(task).cloned().unwrap_or_default(),
            ..TaskReport::default()
        }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for t in tasks {
                self.log
                    .lock()
                    .unwrap()
                    .executed
                    .push((t.name.clone(), t.origin));

                let report = self.report_for(&t.name);
                self.runtime_tx
                    .send(RuntimeEvent::TaskCompleted {
                        task: t.name.clone(),
                        origin: t.origin,
                        report,
                    })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn start_watch(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().watch_starts += 1;
            Ok(())
        })
    }

    fn broadcast_reload(
        &mut self,
        signal: ReloadSignal,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.log.lock().unwrap().reloads.push(signal);
            Ok(())
        })
    }
}
