// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running tasks
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation here.
//!
//! - `PipelineExecutor` runs task bodies from a [`Pipeline`] on the blocking
//!   pool and owns the watch session once the watch node starts.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ServeSection;
use crate::dag::ScheduledTask;
use crate::engine::{ReloadSignal, RuntimeEvent};
use crate::errors::Result;
use crate::pipeline::Pipeline;
use crate::watch::WatchSession;

use super::task_runner::run_task;

/// Trait abstracting how scheduled work is carried out.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution. Completion is reported back
    /// as `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// The watch node became ready: start watching sources (and serving).
    fn start_watch(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Deliver a reload signal to connected sessions.
    fn broadcast_reload(
        &mut self,
        signal: ReloadSignal,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production.
pub struct PipelineExecutor {
    pipeline: Arc<Pipeline>,
    serve: ServeSection,
    dest_root: PathBuf,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    session: Option<WatchSession>,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("pipeline", &self.pipeline)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl PipelineExecutor {
    pub fn new(
        pipeline: Arc<Pipeline>,
        serve: ServeSection,
        dest_root: impl Into<PathBuf>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            pipeline,
            serve,
            dest_root: dest_root.into(),
            runtime_tx,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&WatchSession> {
        self.session.as_ref()
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            for task in tasks {
                tokio::spawn(run_task(task, Arc::clone(&pipeline), tx.clone()));
            }
            Ok(())
        })
    }

    fn start_watch(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.session.is_some() {
                debug!("watch session already running");
                return Ok(());
            }

            let session = WatchSession::start(
                self.pipeline.root(),
                &self.dest_root,
                self.pipeline.profiles(),
                &self.serve,
                self.runtime_tx.clone(),
            )?;
            info!("watching for source changes");
            self.session = Some(session);
            Ok(())
        })
    }

    fn broadcast_reload(
        &mut self,
        signal: ReloadSignal,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match &self.session {
                Some(session) => {
                    session.broadcast(&signal);
                }
                None => warn!(class = %signal.class, "reload requested without a watch session"),
            }
            Ok(())
        })
    }
}
