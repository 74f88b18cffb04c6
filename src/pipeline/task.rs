// src/pipeline/task.rs

//! The per-class transform task.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::AssetPaths;
use crate::engine::TaskReport;
use crate::errors::TaskError;
use crate::fs::FileSystem;
use crate::pipeline::freshness::is_fresh;
use crate::pipeline::transform::{SourceFile, TransformChain};
use crate::watch::patterns::{ClassWatchProfile, collect_matching_files, rel_string};

/// Everything a transform task needs, borrowed from the pipeline.
pub struct TransformTask<'a> {
    pub fs: &'a dyn FileSystem,
    pub root: &'a Path,
    pub paths: &'a AssetPaths,
    pub profile: &'a ClassWatchProfile,
    pub chain: &'a TransformChain,
}

impl TransformTask<'_> {
    /// Process every matching source file.
    ///
    /// Per-file failures are collected in the report; the rest of the batch
    /// still runs.
    pub fn run(&self) -> TaskReport {
        let class = self.paths.class;
        let mut sources = match collect_matching_files(self.fs, self.root, self.profile) {
            Ok(sources) => sources,
            Err(e) => return TaskReport::failed(TaskError::io(self.root, format!("{e:#}"))),
        };
        if self.paths.skip_partials {
            sources.retain(|src| !is_partial(src));
        }

        if sources.is_empty() {
            debug!(%class, "no matching sources; nothing to do");
            return TaskReport::default();
        }

        info!(%class, files = sources.len(), chain = ?self.chain, "running transforms");

        let dest_dir = self.root.join(&self.paths.dest);
        match &self.paths.bundle {
            Some(bundle) => self.run_bundle(&sources, &dest_dir.join(bundle)),
            None => self.run_mirror(&sources, &dest_dir),
        }
    }

    /// One output per source, mirroring the source layout below the glob base.
    fn run_mirror(&self, sources: &[PathBuf], dest_dir: &Path) -> TaskReport {
        let mut report = TaskReport::default();

        for src in sources {
            let dest = self.mirror_destination(src, dest_dir);

            if self.paths.incremental && is_fresh(self.fs, src, &dest) {
                debug!(src = %src.display(), "destination up to date; skipping");
                report.fresh += 1;
                continue;
            }

            let Some(output) = self.transform_one(src, &mut report) else {
                continue;
            };

            match self.fs.write(&dest, &output.contents) {
                Ok(()) => {
                    debug!(src = %src.display(), dest = %dest.display(), "wrote output");
                    report.written.push(dest);
                }
                Err(e) => report.errors.push(TaskError::io(&dest, format!("{e:#}"))),
            }
        }

        report
    }

    /// All successful outputs concatenated into a single file.
    fn run_bundle(&self, sources: &[PathBuf], dest: &Path) -> TaskReport {
        let mut report = TaskReport::default();
        let mut parts: Vec<Vec<u8>> = Vec::new();

        for src in sources {
            if let Some(output) = self.transform_one(src, &mut report) {
                parts.push(output.contents);
            }
        }

        if parts.is_empty() {
            debug!(dest = %dest.display(), "no successful outputs; bundle not written");
            return report;
        }

        let bundle = parts.join(&b"\n"[..]);
        match self.fs.write(dest, &bundle) {
            Ok(()) => {
                debug!(dest = %dest.display(), parts = parts.len(), "wrote bundle");
                report.written.push(dest.to_path_buf());
            }
            Err(e) => report.errors.push(TaskError::io(dest, format!("{e:#}"))),
        }

        report
    }

    /// Read one source and run the chain over it, recording any failure.
    fn transform_one(&self, src: &Path, report: &mut TaskReport) -> Option<SourceFile> {
        let contents = match self.fs.read(src) {
            Ok(c) => c,
            Err(e) => {
                report.errors.push(TaskError::io(src, format!("{e:#}")));
                return None;
            }
        };

        match self.chain.apply(SourceFile::new(src, contents)) {
            Ok(output) => Some(output),
            Err(e) => {
                report.errors.push(e.into());
                None
            }
        }
    }

    fn mirror_destination(&self, src: &Path, dest_dir: &Path) -> PathBuf {
        let rel = rel_string(self.root, src).unwrap_or_else(|| src.to_string_lossy().into_owned());
        let mut dest = dest_dir.join(self.profile.relative_to_base(&rel));
        if let Some(ext) = &self.paths.extension {
            dest.set_extension(ext);
        }
        dest
    }
}

/// `_name.scss` style partials are only ever pulled in by `@use`/`@import`.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'))
}
