// src/pipeline/transform.rs

//! The transform seam: a transform turns one source file into one output,
//! or rejects it with a [`TransformError`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::TransformError;

/// A file travelling through a transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path of the original source file.
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Contents as UTF-8, or a `TransformError` attributed to `step`.
    pub fn text(&self, step: &str) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| TransformError::new(step, &self.path, format!("invalid UTF-8: {e}")))
    }

    /// Same file, new contents.
    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: self.path,
            contents: contents.into(),
        }
    }
}

/// One stateless step of a transform chain.
pub trait Transform: Send + Sync {
    /// Step name used in error reports.
    fn name(&self) -> &str;

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError>;
}

/// Ordered list of transforms applied to every file of a class.
#[derive(Clone, Default)]
pub struct TransformChain {
    steps: Vec<Arc<dyn Transform>>,
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: impl Transform + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order; the first failing step ends the chain.
    pub fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        self.steps.iter().try_fold(file, |file, step| step.apply(file))
    }
}

/// Transform backed by a closure.
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(SourceFile) -> Result<SourceFile, TransformError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        (self.f)(file)
    }
}

/// Wrap a closure as a named transform.
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnTransform<F>
where
    F: Fn(SourceFile) -> Result<SourceFile, TransformError> + Send + Sync,
{
    FnTransform {
        name: name.into(),
        f,
    }
}
