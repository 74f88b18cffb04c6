// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Hold the per-class path table (`paths.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate globs and output naming (`validate.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ConfigSection, PathsSection, RawAssetPaths, RawConfigFile, ServeSection,
};
pub use paths::{AssetPaths, PathTable};
