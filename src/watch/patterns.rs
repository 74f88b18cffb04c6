// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::paths::{AssetPaths, PathTable};
use crate::fs::FileSystem;
use crate::types::AssetClass;

/// Compiled source/exclude glob patterns for a single asset class.
///
/// The patterns are assumed to be relative to the project root. The watcher
/// and the transform tasks pass relative, forward-slash paths (e.g.
/// `"src/styles/main.scss"`) into `matches`.
#[derive(Clone)]
pub struct ClassWatchProfile {
    class: AssetClass,
    src_set: GlobSet,
    exclude_set: Option<GlobSet>,
    /// Literal directory prefix of each source pattern, in pattern order.
    bases: Vec<String>,
}

impl fmt::Debug for ClassWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassWatchProfile")
            .field("class", &self.class)
            .field("bases", &self.bases)
            .finish_non_exhaustive()
    }
}

impl ClassWatchProfile {
    /// Compile the profile for one path table entry.
    pub fn from_paths(paths: &AssetPaths) -> Result<Self> {
        let src_set = build_globset(&paths.src)
            .with_context(|| format!("building source globset for {}", paths.class))?;

        let exclude_set = if paths.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&paths.exclude)
                    .with_context(|| format!("building exclude globset for {}", paths.class))?,
            )
        };

        let bases = paths.src.iter().map(|p| glob_base(p)).collect();

        Ok(Self {
            class: paths.class,
            src_set,
            exclude_set,
            bases,
        })
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    /// Returns true if this class is interested in the given path (relative
    /// to the project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.src_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Strip the glob base from a matching relative path.
    ///
    /// `src/images/icons/a.png` matched by `src/images/**/*` becomes
    /// `icons/a.png`. Falls back to the file name when no base applies.
    pub fn relative_to_base(&self, rel_path: &str) -> PathBuf {
        let path = Path::new(rel_path);
        for base in self.bases.iter() {
            if let Ok(stripped) = path.strip_prefix(base) {
                if !stripped.as_os_str().is_empty() {
                    return stripped.to_path_buf();
                }
            }
        }
        path.file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf())
    }
}

/// Compile one profile per asset class in the table.
pub fn build_class_profiles(table: &PathTable) -> Result<Vec<ClassWatchProfile>> {
    table.iter().map(ClassWatchProfile::from_paths).collect()
}

/// Build a GlobSet from simple string patterns.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix of a glob pattern.
///
/// Everything up to (not including) the first path component that contains a
/// glob metacharacter, or the pattern's parent directory if it has none.
pub fn glob_base(pattern: &str) -> String {
    let is_glob = |s: &str| s.contains(['*', '?', '[', '{']);
    let mut parts: Vec<&str> = Vec::new();
    let components: Vec<&str> = pattern.split('/').collect();
    let has_glob = components.iter().any(|c| is_glob(c));

    for (idx, comp) in components.iter().enumerate() {
        if is_glob(comp) {
            break;
        }
        // A literal file pattern: its base is the parent directory.
        if !has_glob && idx + 1 == components.len() {
            break;
        }
        if !comp.is_empty() && *comp != "." {
            parts.push(comp);
        }
    }

    parts.join("/")
}

/// Convert a path under `root` into the forward-slash string the globs are
/// written against.
pub fn rel_string(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Collect all files under `root` that match this class's src/exclude
/// patterns, sorted by path.
///
/// The walk starts at each pattern's glob base, so unrelated trees under the
/// root are never listed. Missing bases contribute nothing.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &ClassWatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack: Vec<PathBuf> = walk_starts(root, &profile.bases)
        .into_iter()
        .filter(|dir| fs.is_dir(dir))
        .collect();

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel_str) = rel_string(root, &path) {
                    if profile.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Directories to walk for a set of glob bases, with nested bases folded into
/// their ancestors.
fn walk_starts(root: &Path, bases: &[String]) -> Vec<PathBuf> {
    let mut starts: Vec<PathBuf> = bases
        .iter()
        .map(|base| {
            if base.is_empty() {
                root.to_path_buf()
            } else {
                root.join(base)
            }
        })
        .collect();
    starts.sort();
    starts.dedup();

    starts
        .iter()
        .filter(|dir| !starts.iter().any(|other| other != *dir && dir.starts_with(other)))
        .cloned()
        .collect()
}
