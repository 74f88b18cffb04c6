// src/pipeline/clean.rs

//! The clean task: empty the destination tree, leaving preserved paths alone.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, info};

use crate::engine::TaskReport;
use crate::errors::{Result, TaskError};
use crate::fs::FileSystem;
use crate::watch::patterns::{build_globset, rel_string};

#[derive(Debug, Clone)]
pub struct CleanSpec {
    /// Destination root, relative to the project root.
    pub dest_root: PathBuf,
    /// Paths (relative to the project root) that are never removed. A
    /// matching directory is skipped with everything below it.
    preserve: GlobSet,
}

impl CleanSpec {
    pub fn new(dest_root: impl Into<PathBuf>, preserve: &[String]) -> Result<Self> {
        Ok(Self {
            dest_root: dest_root.into(),
            preserve: build_globset(preserve)?,
        })
    }

    fn is_preserved(&self, rel: &str) -> bool {
        self.preserve.is_match(rel)
    }

    /// Remove everything under the destination root except preserved paths,
    /// then prune directories left empty. The root itself is kept.
    pub fn run(&self, fs: &dyn FileSystem, root: &Path) -> TaskReport {
        let dest = root.join(&self.dest_root);
        let mut report = TaskReport::default();

        if !fs.exists(&dest) {
            debug!(dest = %dest.display(), "destination does not exist; nothing to clean");
            return report;
        }
        if !fs.is_dir(&dest) {
            report
                .errors
                .push(TaskError::io(&dest, "destination root is not a directory"));
            return report;
        }

        let entries = match fs.read_dir(&dest) {
            Ok(entries) => entries,
            Err(e) => {
                report.errors.push(TaskError::io(&dest, format!("{e:#}")));
                return report;
            }
        };

        for entry in entries {
            self.clean_entry(fs, root, &entry, &mut report);
        }

        info!(
            dest = %dest.display(),
            removed = report.removed.len(),
            "clean finished"
        );
        report
    }

    /// Returns true if `path` no longer exists afterwards.
    fn clean_entry(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        path: &Path,
        report: &mut TaskReport,
    ) -> bool {
        let rel = rel_string(root, path).unwrap_or_default();
        if self.is_preserved(&rel) {
            debug!(path = %rel, "preserved");
            return false;
        }

        if fs.is_dir(path) {
            let children = match fs.read_dir(path) {
                Ok(children) => children,
                Err(e) => {
                    report.errors.push(TaskError::io(path, format!("{e:#}")));
                    return false;
                }
            };

            let mut all_removed = true;
            for child in children {
                all_removed &= self.clean_entry(fs, root, &child, report);
            }
            if !all_removed {
                return false;
            }

            match fs.remove_dir(path) {
                Ok(()) => {
                    report.removed.push(path.to_path_buf());
                    true
                }
                Err(e) => {
                    report.errors.push(TaskError::io(path, format!("{e:#}")));
                    false
                }
            }
        } else {
            match fs.remove_file(path) {
                Ok(()) => {
                    report.removed.push(path.to_path_buf());
                    true
                }
                Err(e) => {
                    report.errors.push(TaskError::io(path, format!("{e:#}")));
                    false
                }
            }
        }
    }
}
