//! Orchestration runtime.
//!
//! Two phases per run:
//!
//! 1. **Fetch** — a bounded pool of `spawn_blocking` workers pulls dataset
//!    ids off the plan; each worker reports through one mpsc channel and
//!    only the orchestrating task mutates the report.
//! 2. **Execute** — run steps proceed sequentially, in plan order, each call
//!    wrapped in `spawn_blocking`. Phase 2 starts only after phase 1 is
//!    fully terminal, so a run step never observes an in-flight fetch.
//!
//! Failure isolation: a failed fetch skips exactly the notebooks that need
//! that dataset; a failed execution marks exactly that notebook. The runner
//! never retries — retry policy belongs to the collaborators.
//!
//! Cancellation (handle or time budget) lets in-flight steps finish but
//! dispatches nothing further; undispatched fetches are recorded `Cancelled`
//! and undispatched notebooks `Skipped("cancelled")`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use rehearse_core::DatasetId;
use rehearse_plan::{ExecutionPlan, Resolution};

use crate::collab::{DatasetFetcher, NotebookExecutor};
use crate::error::RunnerError;
use crate::report::{BatchReport, FetchOutcome, Outcome};

// ---------------------------------------------------------------------------
// Options and cancellation
// ---------------------------------------------------------------------------

/// Tuning knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Concurrent dataset fetches; clamped to at least 1. A value of 1
    /// degrades to a fully sequential scheduler with identical semantics.
    pub fetch_workers: usize,
    /// Wall-clock bound for the whole run; expiry triggers cancellation.
    pub time_budget: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fetch_workers: 4,
            time_budget: None,
        }
    }
}

/// Cloneable cancellation flag; obtain one via [`Runner::cancel_handle`]
/// before the run starts.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives an [`ExecutionPlan`] against the fetch and execute collaborators.
pub struct Runner<F, E> {
    fetcher: Arc<F>,
    executor: Arc<E>,
    options: RunOptions,
    cancel: CancelHandle,
}

impl<F, E> Runner<F, E>
where
    F: DatasetFetcher + 'static,
    E: NotebookExecutor + 'static,
{
    pub fn new(fetcher: F, executor: E, options: RunOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            executor: Arc::new(executor),
            options,
            cancel: CancelHandle::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Build a multi-thread runtime and block on [`Runner::run`].
    pub fn run_blocking(
        &self,
        plan: &ExecutionPlan,
        resolution: &Resolution,
    ) -> Result<BatchReport, RunnerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(RunnerError::Runtime)?;
        runtime.block_on(self.run(plan, resolution))
    }

    /// Execute the plan and return the report.
    ///
    /// Fetch and execution failures are recorded in the report, never
    /// propagated; `Err` means the runner's own infrastructure broke.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        resolution: &Resolution,
    ) -> Result<BatchReport, RunnerError> {
        let started_at = Utc::now();
        let deadline = self.options.time_budget.map(|budget| Instant::now() + budget);

        let mut report = BatchReport {
            started_at,
            finished_at: started_at,
            datasets: BTreeMap::new(),
            notebooks: BTreeMap::new(),
        };

        // Skip decisions from resolution are already terminal; seed them
        // before any I/O so the report is complete even if the run is cut off.
        for (name, result) in &resolution.results {
            if !result.runnable {
                let reason = result
                    .blocking_reason
                    .clone()
                    .unwrap_or_else(|| "missing requirement(s)".to_string());
                tracing::info!(notebook = %name, reason = %reason, "skipping notebook");
                report.notebooks.insert(name.clone(), Outcome::Skipped { reason });
            }
        }

        self.fetch_phase(plan, deadline, &mut report).await?;
        self.execute_phase(plan, deadline, &mut report).await?;

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn fetch_phase(
        &self,
        plan: &ExecutionPlan,
        deadline: Option<Instant>,
        report: &mut BatchReport,
    ) -> Result<(), RunnerError> {
        let datasets: Vec<DatasetId> = plan.fetch_steps().cloned().collect();
        if datasets.is_empty() {
            return Ok(());
        }

        let workers = self.options.fetch_workers.max(1);
        let (tx, mut rx) = mpsc::channel::<(DatasetId, FetchOutcome)>(workers);

        let mut pending = datasets.into_iter();
        let mut in_flight = 0usize;
        let mut dispatching = true;

        loop {
            while dispatching && in_flight < workers {
                if self.cancelled(deadline) {
                    dispatching = false;
                    break;
                }
                let Some(dataset) = pending.next() else {
                    dispatching = false;
                    break;
                };
                tracing::info!(dataset = %dataset, "fetching dataset");
                let fetcher = self.fetcher.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let started = std::time::Instant::now();
                    let result = tokio::task::spawn_blocking({
                        let dataset = dataset.clone();
                        move || fetcher.fetch(&dataset)
                    })
                    .await;
                    let duration_ms = started.elapsed().as_millis() as u64;
                    let outcome = match result {
                        Ok(Ok(())) => FetchOutcome::Fetched { duration_ms },
                        Ok(Err(err)) => FetchOutcome::Failed {
                            error: err.to_string(),
                            duration_ms,
                        },
                        Err(err) => FetchOutcome::Failed {
                            error: format!("fetch task panicked: {err}"),
                            duration_ms,
                        },
                    };
                    let _ = tx.send((dataset, outcome)).await;
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }

            let (dataset, outcome) = rx
                .recv()
                .await
                .ok_or(RunnerError::ChannelClosed("fetch results"))?;
            in_flight -= 1;
            match &outcome {
                FetchOutcome::Fetched { duration_ms } => {
                    tracing::info!(dataset = %dataset, duration_ms, "dataset fetched");
                }
                FetchOutcome::Failed { error, .. } => {
                    tracing::warn!(dataset = %dataset, error = %error, "dataset fetch failed");
                }
                FetchOutcome::Cancelled => {}
            }
            report.datasets.insert(dataset, outcome);
        }

        // Whatever was never dispatched lost the race against cancellation.
        for dataset in pending {
            tracing::info!(dataset = %dataset, "fetch cancelled before dispatch");
            report.datasets.insert(dataset, FetchOutcome::Cancelled);
        }
        Ok(())
    }

    async fn execute_phase(
        &self,
        plan: &ExecutionPlan,
        deadline: Option<Instant>,
        report: &mut BatchReport,
    ) -> Result<(), RunnerError> {
        let failed = report.fetch_failures();

        for (name, url) in plan.run_steps() {
            let prerequisites = plan.prerequisites(name);

            let failed_prereqs: Vec<&str> = prerequisites
                .iter()
                .filter(|d| failed.contains(*d))
                .map(|d| d.0.as_str())
                .collect();
            if !failed_prereqs.is_empty() {
                let reason = format!("dataset fetch failed: {}", failed_prereqs.join(", "));
                tracing::warn!(notebook = %name, reason = %reason, "skipping notebook");
                report
                    .notebooks
                    .insert(name.clone(), Outcome::Skipped { reason });
                continue;
            }

            let prereq_cancelled = prerequisites
                .iter()
                .any(|d| !matches!(report.datasets.get(*d), Some(FetchOutcome::Fetched { .. })));
            if self.cancelled(deadline) || prereq_cancelled {
                tracing::info!(notebook = %name, "skipping notebook: cancelled");
                report.notebooks.insert(
                    name.clone(),
                    Outcome::Skipped {
                        reason: "cancelled".to_string(),
                    },
                );
                continue;
            }

            tracing::info!(notebook = %name, url = %url, "running notebook");
            let executor = self.executor.clone();
            let task_name = name.clone();
            let task_url = url.to_string();
            let started = std::time::Instant::now();
            let result = tokio::task::spawn_blocking(move || {
                executor.execute(&task_name, &task_url)
            })
            .await
            .map_err(|err| RunnerError::Join(format!("execute task for '{name}': {err}")))?;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(()) => {
                    tracing::info!(notebook = %name, duration_ms, "notebook succeeded");
                    Outcome::Success { duration_ms }
                }
                Err(err) => {
                    tracing::warn!(notebook = %name, error = %err, "notebook failed");
                    Outcome::Failed {
                        error: err.to_string(),
                        duration_ms,
                    }
                }
            };
            report.notebooks.insert(name.clone(), outcome);
        }
        Ok(())
    }

    fn cancelled(&self, deadline: Option<Instant>) -> bool {
        self.cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
