// src/config/paths.rs

//! The path table: where each asset class comes from and where it goes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::model::{PathsSection, RawAssetPaths};
use crate::types::{AssetClass, ReloadPolicy};

/// Effective path table entry for one asset class.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    pub class: AssetClass,
    pub src: Vec<String>,
    pub exclude: Vec<String>,
    pub dest: PathBuf,
    pub bundle: Option<String>,
    pub extension: Option<String>,
    pub incremental: bool,
    /// Leave `_`-prefixed files out of the compile inputs. They still match
    /// for watching, so an edited partial rebuilds its class.
    pub skip_partials: bool,
    pub reload: ReloadPolicy,
    pub options: toml::Table,
}

impl AssetPaths {
    /// Built-in entry for `class`.
    pub fn builtin(class: AssetClass) -> Self {
        let (src, dest, bundle, incremental, reload) = match class {
            AssetClass::Styles => (
                "src/styles/**/*.scss",
                "dist/css",
                Some("main.min.css"),
                false,
                ReloadPolicy::Inject,
            ),
            AssetClass::Scripts => (
                "src/scripts/**/*.js",
                "dist/js",
                Some("main.min.js"),
                false,
                ReloadPolicy::Full,
            ),
            AssetClass::Images => (
                "src/images/**/*",
                "dist/images",
                None,
                true,
                ReloadPolicy::Never,
            ),
            AssetClass::Markup => ("src/*.html", "dist", None, false, ReloadPolicy::Full),
        };

        Self {
            class,
            src: vec![src.to_string()],
            exclude: Vec::new(),
            dest: PathBuf::from(dest),
            bundle: bundle.map(str::to_string),
            extension: None,
            incremental,
            skip_partials: class == AssetClass::Styles,
            reload,
            options: toml::Table::new(),
        }
    }

    /// Apply the overrides from a `[paths.<class>]` section.
    pub fn with_overrides(mut self, raw: &RawAssetPaths) -> Self {
        if let Some(src) = &raw.src {
            self.src = src.clone();
        }
        if let Some(exclude) = &raw.exclude {
            self.exclude = exclude.clone();
        }
        if let Some(dest) = &raw.dest {
            self.dest = dest.clone();
        }
        if let Some(bundle) = &raw.bundle {
            self.bundle = if bundle.is_empty() {
                None
            } else {
                Some(bundle.clone())
            };
        }
        if let Some(ext) = &raw.extension {
            self.extension = Some(ext.trim_start_matches('.').to_string());
        }
        if let Some(incremental) = raw.incremental {
            self.incremental = incremental;
        }
        if let Some(skip) = raw.skip_partials {
            self.skip_partials = skip;
        }
        if let Some(reload) = raw.reload {
            self.reload = reload;
        }
        if let Some(options) = &raw.options {
            self.options = options.clone();
        }
        self
    }
}

/// Static mapping from asset class to its path table entry.
///
/// Always holds exactly one entry per [`AssetClass`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathTable {
    entries: BTreeMap<AssetClass, AssetPaths>,
}

impl Default for PathTable {
    fn default() -> Self {
        let entries = AssetClass::ALL
            .iter()
            .map(|class| (*class, AssetPaths::builtin(*class)))
            .collect();
        Self { entries }
    }
}

impl PathTable {
    /// Merge a `[paths]` section over the built-in table.
    pub fn from_section(section: &PathsSection) -> Self {
        let mut table = Self::default();
        let overrides = [
            (AssetClass::Styles, &section.styles),
            (AssetClass::Scripts, &section.scripts),
            (AssetClass::Images, &section.images),
            (AssetClass::Markup, &section.markup),
        ];
        for (class, raw) in overrides {
            if let Some(raw) = raw {
                let merged = AssetPaths::builtin(class).with_overrides(raw);
                table.entries.insert(class, merged);
            }
        }
        table
    }

    pub fn get(&self, class: AssetClass) -> &AssetPaths {
        // Every class is inserted by `Default`, and entries are never removed.
        &self.entries[&class]
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetPaths> {
        self.entries.values()
    }
}
