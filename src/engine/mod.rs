// src/engine/mod.rs

//! Orchestration engine for assetpipe.
//!
//! This module ties together:
//! - the graph scheduler
//! - the per-class watch loop (what happens when sources change while a
//!   rebuild is already running)
//! - the main runtime event loop that reacts to:
//!   - task completion events
//!   - source change events from the watcher
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::AssetClass;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task instance is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    /// Dispatched by the scheduler as part of graph run `run_id`.
    Graph { run_id: u64 },
    /// Dispatched by the watch loop after a source change.
    Rebuild { class: AssetClass },
}

/// Events flowing into the runtime from the watcher, task runners, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished and produced a report.
    TaskCompleted {
        task: TaskName,
        origin: TaskOrigin,
        report: TaskReport,
    },
    /// A source file of `class` changed on disk.
    SourceChanged { class: AssetClass, path: String },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;
pub mod watch_loop;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{BuildReport, TaskFailure, TaskReport};
pub use runtime::Runtime;
pub use watch_loop::{ClassState, ReloadSignal, WatchLoop};
