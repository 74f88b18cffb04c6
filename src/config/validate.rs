// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile};
use crate::config::paths::{AssetPaths, PathTable};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let paths = PathTable::from_section(&raw.paths);
        validate_global_config(&raw.config)?;
        validate_path_table(&paths)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.serve, paths))
    }
}

fn validate_global_config(cfg: &ConfigSection) -> Result<()> {
    if cfg.dest_root.as_os_str().is_empty() {
        return Err(PipelineError::ConfigError(
            "[config].dest_root must not be empty".to_string(),
        ));
    }

    for pattern in cfg.preserve.iter() {
        check_glob(pattern, "[config].preserve")?;
    }

    Ok(())
}

fn validate_path_table(table: &PathTable) -> Result<()> {
    for entry in table.iter() {
        validate_entry(entry)?;
    }
    Ok(())
}

fn validate_entry(entry: &AssetPaths) -> Result<()> {
    let section = format!("[paths.{}]", entry.class);

    if entry.src.is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "{section}.src must contain at least one glob pattern"
        )));
    }

    for pattern in entry.src.iter() {
        check_glob(pattern, &format!("{section}.src"))?;
    }
    for pattern in entry.exclude.iter() {
        check_glob(pattern, &format!("{section}.exclude"))?;
    }

    if entry.dest.as_os_str().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "{section}.dest must not be empty"
        )));
    }

    if let Some(bundle) = &entry.bundle {
        if bundle.contains('/') || bundle.contains('\\') {
            return Err(PipelineError::ConfigError(format!(
                "{section}.bundle must be a plain file name (got '{bundle}')"
            )));
        }
    }

    if let Some(ext) = &entry.extension {
        if ext.is_empty() || ext.contains('/') || ext.contains('\\') {
            return Err(PipelineError::ConfigError(format!(
                "{section}.extension must be a plain extension (got '{ext}')"
            )));
        }
    }

    // Options are opaque to the table but typed by the built-in transforms.
    crate::transforms::builtin_chain(entry.class, &entry.options)?;

    Ok(())
}

fn check_glob(pattern: &str, field: &str) -> Result<()> {
    Glob::new(pattern).map_err(|e| {
        PipelineError::ConfigError(format!("invalid glob pattern '{pattern}' in {field}: {e}"))
    })?;
    Ok(())
}
