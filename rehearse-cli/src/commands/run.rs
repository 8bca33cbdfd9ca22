//! `rehearse run` — full orchestration: fetch demanded datasets, execute
//! runnable notebooks, print the report, and set the exit status.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use rehearse_plan::{plan, resolve};
use rehearse_runner::{BatchReport, FetchOutcome, Outcome, RunOptions, Runner};

use crate::commands::{available_requirements, load_manifest, selected_names};
use crate::executor::{CommandExecutor, DEFAULT_EXEC_TEMPLATE};
use crate::fetcher::{DatasetSource, HttpFetcher};

/// Arguments for `rehearse run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Notebooks to run (default: all official tutorials).
    pub notebooks: Vec<String>,

    /// Path to the notebook manifest YAML.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Run every manifest entry, tutorial or not.
    #[arg(long, conflicts_with = "notebooks")]
    pub all: bool,

    /// Declare a soft dependency as available (repeatable).
    #[arg(long = "with", value_name = "REQ")]
    pub with: Vec<String>,

    /// Dataset source: base URL or local directory
    /// (default: $REHEARSE_DATASET_URL).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Where fetched datasets land
    /// (default: $REHEARSE_DATA, else ~/.rehearse/datasets).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Command template for notebook execution; {url} and {name} are
    /// substituted, and the url is appended when no {url} token is present.
    #[arg(long, default_value = DEFAULT_EXEC_TEMPLATE)]
    pub exec_cmd: String,

    /// Concurrent dataset fetches.
    #[arg(long, default_value_t = 4)]
    pub fetch_workers: usize,

    /// Wall-clock budget in seconds; expiry cancels undispatched work.
    #[arg(long, value_name = "SECS")]
    pub time_budget: Option<u64>,

    /// Emit the full report as JSON instead of per-step lines.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let manifest = load_manifest(&self.manifest)?;
        let requested = selected_names(&manifest, &self.notebooks, self.all);
        let available = available_requirements(&self.with);

        let resolution =
            resolve(&manifest, &requested, &available).context("dependency resolution failed")?;
        let execution_plan = plan(&manifest, &resolution);

        let data_dir = resolve_data_dir(self.data_dir)?;
        let source = resolve_source(self.base_url, execution_plan.fetch_steps().count())?;

        let fetcher = HttpFetcher::new(source, data_dir.clone())
            .context("failed to open the dataset directory")?;
        let executor = CommandExecutor::from_template(&self.exec_cmd, data_dir)?;
        let runner = Runner::new(
            fetcher,
            executor,
            RunOptions {
                fetch_workers: self.fetch_workers,
                time_budget: self.time_budget.map(Duration::from_secs),
            },
        );

        let report = runner
            .run_blocking(&execution_plan, &resolution)
            .context("runner infrastructure failure")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .context("failed to serialize report JSON")?
            );
        } else {
            print_report(&report);
        }

        let counts = report.counts();
        if report.has_failures() {
            bail!("{} notebook(s) failed", counts.failed);
        }
        Ok(())
    }
}

/// `--data-dir` flag, else `$REHEARSE_DATA`, else `~/.rehearse/datasets`.
fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Ok(env) = std::env::var("REHEARSE_DATA") {
        if !env.is_empty() {
            return Ok(PathBuf::from(env));
        }
    }
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".rehearse").join("datasets"))
}

/// `--base-url` flag, else `$REHEARSE_DATASET_URL`; required only when the
/// plan actually contains fetch steps.
fn resolve_source(flag: Option<String>, fetch_steps: usize) -> Result<DatasetSource> {
    let base = flag.or_else(|| {
        std::env::var("REHEARSE_DATASET_URL")
            .ok()
            .filter(|v| !v.is_empty())
    });
    match base {
        Some(base) => Ok(DatasetSource::parse(&base)),
        None if fetch_steps == 0 => Ok(DatasetSource::Url(String::new())),
        None => bail!(
            "the plan needs {fetch_steps} dataset fetch(es); \
             pass --base-url or set $REHEARSE_DATASET_URL"
        ),
    }
}

fn print_report(report: &BatchReport) {
    for (dataset, outcome) in &report.datasets {
        match outcome {
            FetchOutcome::Fetched { duration_ms } => {
                println!("  {}  {dataset} ({duration_ms} ms)", "↓".cyan());
            }
            FetchOutcome::Failed { error, .. } => {
                println!("  {}  {dataset} — {error}", "✗".red());
            }
            FetchOutcome::Cancelled => {
                println!("  {}  {dataset} — cancelled", "∅".bright_black());
            }
        }
    }

    for (name, outcome) in &report.notebooks {
        match outcome {
            Outcome::Success { duration_ms } => {
                println!("  {}  {name} ({duration_ms} ms)", "✓".green());
            }
            Outcome::Skipped { reason } => {
                println!("  {}  {name} — {reason}", "∅".yellow());
            }
            Outcome::Failed { error, .. } => {
                println!("  {}  {name} — {error}", "✗".red());
            }
        }
    }

    let counts = report.counts();
    println!(
        "{} succeeded, {} skipped, {} failed",
        counts.succeeded, counts.skipped, counts.failed,
    );
}
