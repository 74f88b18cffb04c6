// src/config/model.rs

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::paths::PathTable;
use crate::types::ReloadPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// dest_root = "dist"
/// preserve = ["dist/images"]
///
/// [serve]
/// port = 3000
///
/// [paths.styles]
/// src = ["src/styles/**/*.scss"]
/// dest = "dist/css"
/// bundle = "main.min.css"
/// ```
///
/// All sections are optional; a missing `[paths.<class>]` section falls back
/// to the built-in entry for that class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub paths: PathsSection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub serve: ServeSection,
    pub paths: PathTable,
}

impl ConfigFile {
    /// Assemble a `ConfigFile` whose parts have already been validated.
    pub(crate) fn new_unchecked(config: ConfigSection, serve: ServeSection, paths: PathTable) -> Self {
        Self {
            config,
            serve,
            paths,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Root of the destination tree; this is what `clean` empties.
    #[serde(default = "default_dest_root")]
    pub dest_root: PathBuf,

    /// Glob patterns (relative to the project root) that `clean` leaves alone.
    #[serde(default = "default_preserve")]
    pub preserve: Vec<String>,
}

fn default_dest_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_preserve() -> Vec<String> {
    vec!["dist/images".to_string()]
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            dest_root: default_dest_root(),
            preserve: default_preserve(),
        }
    }
}

/// `[serve]` section: development server used by the watch session.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// WebSocket port used to push reload signals.
    #[serde(default = "default_reload_port")]
    pub reload_port: u16,
}

fn default_true() -> bool {
    true
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3000
}

fn default_reload_port() -> u16 {
    35729
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_host(),
            port: default_port(),
            reload_port: default_reload_port(),
        }
    }
}

/// `[paths]` section, one optional entry per asset class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default)]
    pub styles: Option<RawAssetPaths>,
    #[serde(default)]
    pub scripts: Option<RawAssetPaths>,
    #[serde(default)]
    pub images: Option<RawAssetPaths>,
    #[serde(default)]
    pub markup: Option<RawAssetPaths>,
}

/// `[paths.<class>]` section.
///
/// Every field is optional and overrides the built-in value for that class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAssetPaths {
    /// Source glob patterns, relative to the project root.
    #[serde(default)]
    pub src: Option<Vec<String>>,

    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Destination directory, relative to the project root.
    #[serde(default)]
    pub dest: Option<PathBuf>,

    /// Concatenate all outputs into this file name. An empty string turns
    /// bundling off and mirrors the source tree instead.
    #[serde(default)]
    pub bundle: Option<String>,

    /// Replace the extension of mirrored outputs (e.g. `"css"`).
    #[serde(default)]
    pub extension: Option<String>,

    /// Skip sources whose destination is not older than the source.
    #[serde(default)]
    pub incremental: Option<bool>,

    /// Compile `_`-prefixed sources only through their importers.
    #[serde(default)]
    pub skip_partials: Option<bool>,

    #[serde(default)]
    pub reload: Option<ReloadPolicy>,

    /// Opaque options handed to the class's transforms.
    #[serde(default)]
    pub options: Option<toml::Table>,
}
