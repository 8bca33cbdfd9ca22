//! Execution planner — ordered step list from a resolution.
//!
//! The planner is a pure function: fetch steps first (sorted by dataset id,
//! one per distinct demanded dataset), then run steps for every runnable
//! requested notebook (sorted by name). Non-runnable notebooks produce no
//! step at all; the runner merges their skip outcomes into the report from
//! the resolution, keeping the plan free of dead work.

use serde::{Deserialize, Serialize};

use rehearse_core::{DatasetId, Manifest, NotebookName};

use crate::resolver::{DatasetDemand, Resolution};

/// One atomic unit of orchestrated work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlanStep {
    FetchDataset { dataset: DatasetId },
    RunNotebook { name: NotebookName, url: String },
}

/// Ordered step sequence plus the demand map it was built from.
///
/// Invariants: every fetch step precedes every run step, and each dataset id
/// appears as a fetch step at most once regardless of how many notebooks need
/// it. The demand map travels with the plan so the runner can tie each run
/// step back to its prerequisite fetches without consulting the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    pub demand: DatasetDemand,
}

impl ExecutionPlan {
    /// Dataset ids of all fetch steps, in plan order.
    pub fn fetch_steps(&self) -> impl Iterator<Item = &DatasetId> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::FetchDataset { dataset } => Some(dataset),
            PlanStep::RunNotebook { .. } => None,
        })
    }

    /// `(name, url)` of all run steps, in plan order.
    pub fn run_steps(&self) -> impl Iterator<Item = (&NotebookName, &str)> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::FetchDataset { .. } => None,
            PlanStep::RunNotebook { name, url } => Some((name, url.as_str())),
        })
    }

    /// Prerequisite datasets of one notebook, sorted.
    pub fn prerequisites(&self, name: &NotebookName) -> Vec<&DatasetId> {
        self.demand
            .iter()
            .filter(|(_, requesters)| requesters.contains(name))
            .map(|(dataset, _)| dataset)
            .collect()
    }
}

/// Build the execution plan for a resolution.
pub fn plan(manifest: &Manifest, resolution: &Resolution) -> ExecutionPlan {
    let mut steps = Vec::new();

    for dataset in resolution.demand.keys() {
        steps.push(PlanStep::FetchDataset {
            dataset: dataset.clone(),
        });
    }

    for name in resolution.runnable_names() {
        // Resolution names come from the manifest, so the lookup cannot miss;
        // skipping a stale name here beats panicking in a pure function.
        if let Some(notebook) = manifest.get(&name) {
            steps.push(PlanStep::RunNotebook {
                name,
                url: notebook.url.clone(),
            });
        }
    }

    ExecutionPlan {
        steps,
        demand: resolution.demand.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
