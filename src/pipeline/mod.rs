// src/pipeline/mod.rs

//! Concrete task bodies: the clean task and the per-class transform tasks.
//!
//! A [`Pipeline`] binds the path table, the compiled glob profiles and one
//! [`TransformChain`] per asset class to a [`FileSystem`]. The engine only
//! ever calls [`Pipeline::run`] with a task kind.

pub mod clean;
pub mod freshness;
pub mod task;
pub mod transform;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::config::{ConfigFile, PathTable};
use crate::dag::TaskKind;
use crate::engine::TaskReport;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::transforms::builtin_chain;
use crate::types::AssetClass;
use crate::watch::patterns::ClassWatchProfile;

pub use clean::CleanSpec;
pub use task::TransformTask;
pub use transform::{FnTransform, SourceFile, Transform, TransformChain, from_fn};

pub struct Pipeline {
    root: PathBuf,
    table: Arc<PathTable>,
    clean: CleanSpec,
    profiles: BTreeMap<AssetClass, ClassWatchProfile>,
    chains: BTreeMap<AssetClass, TransformChain>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("clean", &self.clean)
            .field("chains", &self.chains)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline with the built-in transform chains.
    pub fn from_config(
        root: impl Into<PathBuf>,
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let mut chains = BTreeMap::new();
        for paths in cfg.paths.iter() {
            chains.insert(paths.class, builtin_chain(paths.class, &paths.options)?);
        }
        Self::with_chains(root, cfg, fs, chains)
    }

    /// Build a pipeline with caller-supplied chains. Classes without a chain
    /// copy their sources unchanged.
    pub fn with_chains(
        root: impl Into<PathBuf>,
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        chains: BTreeMap<AssetClass, TransformChain>,
    ) -> Result<Self> {
        let mut profiles = BTreeMap::new();
        for paths in cfg.paths.iter() {
            profiles.insert(paths.class, ClassWatchProfile::from_paths(paths)?);
        }

        Ok(Self {
            root: root.into(),
            table: Arc::new(cfg.paths.clone()),
            clean: CleanSpec::new(&cfg.config.dest_root, &cfg.config.preserve)?,
            profiles,
            chains,
            fs,
        })
    }

    /// Replace the chain of one class.
    pub fn with_chain(mut self, class: AssetClass, chain: TransformChain) -> Self {
        self.chains.insert(class, chain);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table(&self) -> &Arc<PathTable> {
        &self.table
    }

    pub fn chain(&self, class: AssetClass) -> Option<&TransformChain> {
        self.chains.get(&class)
    }

    /// Compiled glob profiles, one per class.
    pub fn profiles(&self) -> Vec<ClassWatchProfile> {
        self.profiles.values().cloned().collect()
    }

    /// Run one task to completion. Blocking.
    pub fn run(&self, kind: TaskKind) -> TaskReport {
        match kind {
            TaskKind::Clean => self.clean.run(self.fs.as_ref(), &self.root),
            TaskKind::Transform(class) => self.run_transform(class),
            TaskKind::Watch => {
                warn!("the watch node has no task body; ignoring");
                TaskReport::default()
            }
        }
    }

    fn run_transform(&self, class: AssetClass) -> TaskReport {
        let empty = TransformChain::new();
        let chain = self.chains.get(&class).unwrap_or(&empty);
        let Some(profile) = self.profiles.get(&class) else {
            return TaskReport::default();
        };

        TransformTask {
            fs: self.fs.as_ref(),
            root: &self.root,
            paths: self.table.get(class),
            profile,
            chain,
        }
        .run()
    }
}
