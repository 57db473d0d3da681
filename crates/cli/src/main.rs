// SPDX-License-Identifier: MIT

//! `cylc` — the CLI surface for the one subsystem spec.md keeps a direct
//! external interface for (spec.md §4.15, §6): `cylc clean`. Everything
//! else (hold/release/trigger/...) is the in-process command queue's
//! contract, consumed by a running scheduler rather than this binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cylc_engine::clean::{self, CleanRequest, SymlinkDirs};

#[derive(Parser)]
#[command(name = "cylc", about = "Cylc workflow engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove a workflow's run directory, locally and/or on its remote platforms.
    Clean(CleanArgs),
}

#[derive(Args)]
struct CleanArgs {
    /// The workflow to clean, e.g. `myflow` or `myflow/run1`.
    workflow: String,

    /// Only clean the local run directory; skip remote platforms.
    #[arg(long, conflicts_with = "remote_only")]
    local_only: bool,

    /// Only clean remote platforms; skip the local run directory.
    #[arg(long)]
    remote_only: bool,

    /// Glob pattern to remove, relative to the run directory. Repeatable;
    /// if omitted, the entire run directory is removed.
    #[arg(long = "rm")]
    rm: Vec<String>,

    /// Per-platform SSH timeout, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Root directory holding workflow run directories (default `$HOME/cylc-run`).
    #[arg(long)]
    cylc_run_root: Option<PathBuf>,

    /// Path to the workflow's TOML definition, needed to know its
    /// platforms for remote clean. Local-only clean doesn't need this.
    #[arg(long)]
    workflow_def: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Clean(args) => run_clean(args).await,
    }
}

async fn run_clean(args: CleanArgs) -> Result<()> {
    let cylc_run_root = match args.cylc_run_root {
        Some(root) => root,
        None => {
            let home = std::env::var("HOME").context("HOME is not set; pass --cylc-run-root")?;
            PathBuf::from(home).join("cylc-run")
        }
    };

    let request = CleanRequest {
        workflow: args.workflow.clone(),
        cylc_run_root,
        rm_patterns: args.rm.clone(),
        local_only: args.local_only,
        remote_only: args.remote_only,
        remote_timeout: Duration::from_secs(args.timeout),
    };

    if !args.remote_only {
        let contact_file = request.cylc_run_root.join(&args.workflow).join(".service").join("contact");
        let is_live = contact_file.exists();
        let run_dir = clean::local_check(&request, is_live)?;
        let symlinks = SymlinkDirs::default();
        if request.rm_patterns.is_empty() {
            clean::wholesale_clean(&request, &symlinks)?;
            println!("cleaned {}", run_dir.display());
        } else {
            let removed = clean::targeted_clean(&request, &symlinks)?;
            for path in removed {
                println!("removed {}", path.display());
            }
        }
    }

    if !args.local_only {
        let Some(def_path) = &args.workflow_def else {
            if args.remote_only {
                bail!("--remote-only requires --workflow-def to know the workflow's platforms");
            }
            return Ok(());
        };
        let contents = std::fs::read_to_string(def_path)
            .with_context(|| format!("reading workflow definition {}", def_path.display()))?;
        let config = cylc_runbook::load_str(&contents)?;
        let platforms: Vec<_> = config.platforms.values().cloned().collect();
        let results = clean::remote_clean(&request, platforms).await?;
        for (target, outcome) in results {
            println!("{target}: {outcome:?}");
        }
    }

    Ok(())
}
