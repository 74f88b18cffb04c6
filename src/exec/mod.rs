// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `PipelineExecutor`, which tests can replace with a fake implementation.
//! - [`task_runner`] runs one task body and reports its `TaskReport`.

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use task_runner::run_task;
