//! `rehearse plan` — print the deterministic execution plan without I/O.
//!
//! This is the auditing surface: the same resolve + plan pipeline as
//! `rehearse run`, stopping short of fetching or executing anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use rehearse_plan::{plan, resolve, ExecutionPlan, PlanStep};

use crate::commands::{available_requirements, load_manifest, selected_names};

/// Arguments for `rehearse plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Notebooks to plan for (default: all official tutorials).
    pub notebooks: Vec<String>,

    /// Path to the notebook manifest YAML.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Plan for every manifest entry, tutorial or not.
    #[arg(long, conflicts_with = "notebooks")]
    pub all: bool,

    /// Declare a soft dependency as available (repeatable).
    #[arg(long = "with", value_name = "REQ")]
    pub with: Vec<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    plan: &'a ExecutionPlan,
    skipped: Vec<SkippedJson>,
}

#[derive(Serialize)]
struct SkippedJson {
    name: String,
    reason: String,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let manifest = load_manifest(&self.manifest)?;
        let requested = selected_names(&manifest, &self.notebooks, self.all);
        let available = available_requirements(&self.with);

        let resolution =
            resolve(&manifest, &requested, &available).context("dependency resolution failed")?;
        let execution_plan = plan(&manifest, &resolution);

        let skipped: Vec<SkippedJson> = resolution
            .results
            .iter()
            .filter(|(_, r)| !r.runnable)
            .map(|(name, r)| SkippedJson {
                name: name.0.clone(),
                reason: r
                    .blocking_reason
                    .clone()
                    .unwrap_or_else(|| "missing requirement(s)".to_string()),
            })
            .collect();

        if self.json {
            let payload = PlanJson {
                plan: &execution_plan,
                skipped,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        let runnable = resolution.runnable_names().len();
        println!(
            "Plan for {} notebook(s): {} runnable, {} skipped",
            requested.len(),
            runnable,
            skipped.len(),
        );

        for step in &execution_plan.steps {
            match step {
                PlanStep::FetchDataset { dataset } => {
                    println!("  {}  fetch {dataset}", "↓".cyan());
                }
                PlanStep::RunNotebook { name, url } => {
                    println!("  {}  run {name} ({url})", "▶".green());
                }
            }
        }

        if !skipped.is_empty() {
            println!("Skipped:");
            for entry in &skipped {
                println!("  {}  {} — {}", "∅".yellow(), entry.name, entry.reason);
            }
        }
        Ok(())
    }
}
