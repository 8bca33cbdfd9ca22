//! `rehearse list` — render the validated manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use rehearse_core::Notebook;

use crate::commands::load_manifest;

/// Arguments for `rehearse list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Path to the notebook manifest YAML.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ListJson {
    summary: ListSummaryJson,
    notebooks: Vec<NotebookJson>,
}

#[derive(Serialize)]
struct ListSummaryJson {
    notebooks: usize,
    tutorials: usize,
}

#[derive(Serialize)]
struct NotebookJson {
    name: String,
    url: String,
    tutorial: bool,
    datasets: Vec<String>,
    requires: Vec<String>,
}

#[derive(Tabled)]
struct ListTableRow {
    #[tabled(rename = "notebook")]
    notebook: String,
    #[tabled(rename = "tutorial")]
    tutorial: String,
    #[tabled(rename = "datasets")]
    datasets: String,
    #[tabled(rename = "requires")]
    requires: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let manifest = load_manifest(&self.manifest)?;

        if self.json {
            let payload = ListJson {
                summary: ListSummaryJson {
                    notebooks: manifest.len(),
                    tutorials: manifest.tutorial_names().len(),
                },
                notebooks: manifest.iter().map(notebook_json).collect(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize list JSON")?
            );
            return Ok(());
        }

        println!(
            "Rehearse v{} | {} notebooks | {} tutorials",
            env!("CARGO_PKG_VERSION"),
            manifest.len(),
            manifest.tutorial_names().len(),
        );

        if manifest.is_empty() {
            println!("Manifest is empty.");
            return Ok(());
        }

        let rows: Vec<ListTableRow> = manifest
            .iter()
            .map(|nb| ListTableRow {
                notebook: nb.name.0.clone(),
                tutorial: if nb.tutorial {
                    "✓".green().to_string()
                } else {
                    String::new()
                },
                datasets: join_set(nb.datasets.iter().map(|d| d.0.as_str())),
                requires: join_set(nb.requires.iter().map(|r| r.0.as_str())),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn notebook_json(nb: &Notebook) -> NotebookJson {
    NotebookJson {
        name: nb.name.0.clone(),
        url: nb.url.clone(),
        tutorial: nb.tutorial,
        datasets: nb.datasets.iter().map(|d| d.0.clone()).collect(),
        requires: nb.requires.iter().map(|r| r.0.clone()).collect(),
    }
}

fn join_set<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "·".to_string()
    } else {
        joined
    }
}
