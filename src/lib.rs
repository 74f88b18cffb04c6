// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod transforms;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_or_default;
use crate::dag::{BuildGraph, Scheduler, Step};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, WatchLoop};
use crate::errors::{PipelineError, Result};
use crate::exec::PipelineExecutor;
use crate::fs::RealFileSystem;
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - plan → graph → scheduler / watch loop / runtime
/// - pipeline executor (task bodies, watch session)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;
    let command = args.command();
    let plan = command.plan();
    let graph = BuildGraph::from_plan(&plan)?;

    if args.dry_run {
        print_dry_run(&cfg, &plan, &graph);
        return Ok(());
    }

    let root = project_root(&config_path);
    info!(root = %root.display(), ?command, "starting assetpipe");

    let pipeline = Arc::new(Pipeline::from_config(
        root,
        &cfg,
        Arc::new(RealFileSystem),
    )?);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = PipelineExecutor::new(
        Arc::clone(&pipeline),
        cfg.serve.clone(),
        cfg.config.dest_root.clone(),
        rt_tx.clone(),
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(Scheduler::new(graph), WatchLoop::from_table(&cfg.paths));
    let report = Runtime::new(core, rt_rx, executor).run().await?;

    if report.is_success() {
        info!(tasks = report.succeeded().len(), "build finished");
        Ok(())
    } else {
        Err(PipelineError::BuildFailed(report))
    }
}

/// Globs and destinations are relative to the directory holding the config
/// file; a bare file name means the current directory.
fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Print the path table and the task graph without running anything.
fn print_dry_run(cfg: &ConfigFile, plan: &Step, graph: &BuildGraph) {
    println!("assetpipe dry-run");
    println!("  config.dest_root = {}", cfg.config.dest_root.display());
    if !cfg.config.preserve.is_empty() {
        println!("  config.preserve = {:?}", cfg.config.preserve);
    }
    if cfg.serve.enabled {
        println!(
            "  serve = http://{}:{} (reload port {})",
            cfg.serve.host, cfg.serve.port, cfg.serve.reload_port
        );
    }
    println!();

    println!("paths:");
    for paths in cfg.paths.iter() {
        println!("  - {}", paths.class);
        println!("      src: {:?}", paths.src);
        if !paths.exclude.is_empty() {
            println!("      exclude: {:?}", paths.exclude);
        }
        println!("      dest: {}", paths.dest.display());
        if let Some(ref bundle) = paths.bundle {
            println!("      bundle: {bundle}");
        }
        if let Some(ref ext) = paths.extension {
            println!("      extension: {ext}");
        }
        if paths.incremental {
            println!("      incremental: true");
        }
        if paths.skip_partials {
            println!("      skip_partials: true");
        }
        println!("      reload: {}", paths.reload);
        if !paths.options.is_empty() {
            println!("      options: {}", paths.options);
        }
    }
    println!();

    println!("tasks ({}):", graph.len());
    for node in plan.nodes() {
        let deps = graph.dependencies_of(&node.name);
        if deps.is_empty() {
            println!("  - {}", node.name);
        } else {
            println!("  - {} (after {})", node.name, deps.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
