#![allow(dead_code)]

use std::path::PathBuf;

use assetpipe::config::{ConfigFile, ConfigSection, RawAssetPaths, RawConfigFile, ServeSection};
use assetpipe::types::{AssetClass, ReloadPolicy};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in path table with the dev server disabled.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                serve: ServeSection {
                    enabled: false,
                    ..ServeSection::default()
                },
                paths: Default::default(),
            },
        }
    }

    pub fn dest_root(mut self, dest_root: &str) -> Self {
        self.config.config.dest_root = PathBuf::from(dest_root);
        self
    }

    pub fn preserve(mut self, patterns: &[&str]) -> Self {
        self.config.config.preserve = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_paths(mut self, class: AssetClass, paths: RawAssetPaths) -> Self {
        let slot = match class {
            AssetClass::Styles => &mut self.config.paths.styles,
            AssetClass::Scripts => &mut self.config.paths.scripts,
            AssetClass::Images => &mut self.config.paths.images,
            AssetClass::Markup => &mut self.config.paths.markup,
        };
        *slot = Some(paths);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Validation result instead of panicking, for negative tests.
    pub fn try_build(self) -> assetpipe::errors::Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `[paths.<class>]` override.
pub struct AssetPathsBuilder {
    paths: RawAssetPaths,
}

impl AssetPathsBuilder {
    pub fn new() -> Self {
        Self {
            paths: RawAssetPaths::default(),
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.paths.src.get_or_insert_with(Vec::new).push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.paths
            .exclude
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.paths.dest = Some(PathBuf::from(dest));
        self
    }

    pub fn bundle(mut self, name: &str) -> Self {
        self.paths.bundle = Some(name.to_string());
        self
    }

    /// Mirror the source tree instead of bundling.
    pub fn mirror(mut self) -> Self {
        self.paths.bundle = Some(String::new());
        self
    }

    pub fn extension(mut self, ext: &str) -> Self {
        self.paths.extension = Some(ext.to_string());
        self
    }

    pub fn incremental(mut self, val: bool) -> Self {
        self.paths.incremental = Some(val);
        self
    }

    pub fn skip_partials(mut self, val: bool) -> Self {
        self.paths.skip_partials = Some(val);
        self
    }

    pub fn reload(mut self, policy: ReloadPolicy) -> Self {
        self.paths.reload = Some(policy);
        self
    }

    pub fn build(self) -> RawAssetPaths {
        self.paths
    }
}

impl Default for AssetPathsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
