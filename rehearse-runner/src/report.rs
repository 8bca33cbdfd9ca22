//! Batch report — per-notebook and per-dataset terminal outcomes.
//!
//! The report is owned and mutated exclusively by the runner while the run is
//! in progress and handed off by value once it ends. Every requested notebook
//! appears with exactly one terminal outcome; nothing is silently dropped.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rehearse_core::{DatasetId, NotebookName};

/// Terminal outcome of one notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { duration_ms: u64 },
    Skipped { reason: String },
    Failed { error: String, duration_ms: u64 },
}

/// Terminal outcome of one dataset fetch.
///
/// `Cancelled` records a fetch that was never dispatched because cancellation
/// hit first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched { duration_ms: u64 },
    Failed { error: String, duration_ms: u64 },
    Cancelled,
}

/// Outcome tallies for the human-readable summary and the exit-code decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Final record of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub datasets: BTreeMap<DatasetId, FetchOutcome>,
    pub notebooks: BTreeMap<NotebookName, Outcome>,
}

impl BatchReport {
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts {
            succeeded: 0,
            skipped: 0,
            failed: 0,
        };
        for outcome in self.notebooks.values() {
            match outcome {
                Outcome::Success { .. } => counts.succeeded += 1,
                Outcome::Skipped { .. } => counts.skipped += 1,
                Outcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Dataset ids whose fetch failed, sorted.
    pub fn fetch_failures(&self) -> BTreeSet<DatasetId> {
        self.datasets
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FetchOutcome::Failed { .. }))
            .map(|(dataset, _)| dataset.clone())
            .collect()
    }

    /// True iff at least one notebook `Failed`. Skips alone never fail the
    /// batch: a missing soft dependency is an expected condition.
    pub fn has_failures(&self) -> bool {
        self.notebooks
            .values()
            .any(|outcome| matches!(outcome, Outcome::Failed { .. }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
