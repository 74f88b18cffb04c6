// src/errors.rs

//! Crate-wide error types.
//!
//! - [`TransformError`]: one step of a transform chain rejected one file.
//! - [`TaskError`]: one entry in a task's failure list (transform, IO, or a
//!   skipped dependent).
//! - [`PipelineError`]: everything that can end a CLI invocation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::TaskName;
use crate::engine::report::BuildReport;

/// A single transform step failed for a single source file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} failed on {}: {cause}", file.display())]
pub struct TransformError {
    pub step: String,
    pub file: PathBuf,
    pub cause: String,
}

impl TransformError {
    pub fn new(step: impl Into<String>, file: impl Into<PathBuf>, cause: impl fmt::Display) -> Self {
        Self {
            step: step.into(),
            file: file.into(),
            cause: cause.to_string(),
        }
    }
}

/// Failure entry collected by a task while processing its batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("skipped because upstream task '{upstream}' failed")]
    Graph { upstream: TaskName },

    #[error("task aborted: {0}")]
    Aborted(String),
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        TaskError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in build graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("build failed\n{0}")]
    BuildFailed(BuildReport),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
