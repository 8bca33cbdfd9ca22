//! Rehearse — tutorial notebook batch runner.
//!
//! # Usage
//!
//! ```text
//! rehearse list --manifest <PATH> [--json]
//! rehearse plan [NOTEBOOK]... --manifest <PATH> [--with REQ]... [--all] [--json]
//! rehearse run  [NOTEBOOK]... --manifest <PATH> [--with REQ]... [--all]
//!               [--base-url URL] [--data-dir DIR] [--exec-cmd CMD]
//!               [--fetch-workers N] [--time-budget SECS] [--json]
//! ```
//!
//! Exit status is 0 unless at least one notebook run failed; skipped
//! notebooks (missing soft dependencies, failed dataset fetches) are an
//! expected condition and do not fail the batch.

mod commands;
mod executor;
mod fetcher;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{list::ListArgs, plan::PlanArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rehearse",
    version,
    about = "Fetch tutorial datasets and execute notebooks with per-notebook failure isolation",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the validated notebook manifest.
    List(ListArgs),

    /// Resolve and print the execution plan without doing any I/O.
    Plan(PlanArgs),

    /// Fetch demanded datasets and execute the selected notebooks.
    Run(RunArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::List(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Run(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
