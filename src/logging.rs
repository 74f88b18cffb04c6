// src/logging.rs

//! Logging setup for `assetpipe` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `ASSETPIPE_LOG` environment variable, either a bare level ("debug")
//!    or full `EnvFilter` directives ("assetpipe=debug,notify=warn")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that `--dry-run` output on stdout stays clean.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "ASSETPIPE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = match cli_level {
        Some(lvl) => level_from_log_level(lvl).to_string(),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .map(|s| normalize_directives(&s))
            .unwrap_or_else(|| tracing::Level::INFO.to_string()),
    };

    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{directives}'"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Bare levels (any case, "warning" included) become canonical level
/// names; anything else is passed through as filter directives.
fn normalize_directives(s: &str) -> String {
    let trimmed = s.trim();
    match trimmed.to_lowercase().as_str() {
        "" => tracing::Level::INFO.to_string(),
        "warning" => tracing::Level::WARN.to_string(),
        lower @ ("error" | "warn" | "info" | "debug" | "trace") => lower.to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_are_normalized() {
        assert_eq!(normalize_directives(" DEBUG "), "debug");
        assert_eq!(normalize_directives("warning"), "WARN");
        assert_eq!(normalize_directives(""), "INFO");
    }

    #[test]
    fn directives_pass_through() {
        assert_eq!(
            normalize_directives("assetpipe=debug,notify=warn"),
            "assetpipe=debug,notify=warn"
        );
    }
}
