// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::dag::{Step, TaskKind, default_build_plan, single_task_plan};
use crate::types::AssetClass;

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build front-end assets as a task graph, then watch and live-reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetpipe.toml` in the current working directory. When the
    /// default file is absent, the built-in path table is used.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the path table and plan, but run nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean, build every class, then watch (the default).
    Build {
        /// Stop after the build instead of watching.
        #[arg(long)]
        once: bool,
    },
    /// Empty the destination tree, keeping preserved paths.
    Clean,
    /// Compile and minify stylesheets.
    Styles,
    /// Minify scripts.
    Scripts,
    /// Optimize images.
    Images,
    /// Render and minify markup.
    Markup,
    /// Watch sources and serve, without an initial build.
    Watch,
}

impl Command {
    /// Task plan this command runs.
    pub fn plan(&self) -> Step {
        match self {
            Command::Build { once } => default_build_plan(!once),
            Command::Clean => single_task_plan(TaskKind::Clean),
            Command::Styles => single_task_plan(TaskKind::Transform(AssetClass::Styles)),
            Command::Scripts => single_task_plan(TaskKind::Transform(AssetClass::Scripts)),
            Command::Images => single_task_plan(TaskKind::Transform(AssetClass::Images)),
            Command::Markup => single_task_plan(TaskKind::Transform(AssetClass::Markup)),
            Command::Watch => single_task_plan(TaskKind::Watch),
        }
    }
}

impl CliArgs {
    /// The selected command, `build` when none was given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Build { once: false })
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
