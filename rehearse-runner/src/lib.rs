//! Batch runner: bounded fetch pool + sequential notebook execution with
//! per-step failure isolation.

pub mod collab;
mod error;
pub mod report;
mod runner;

pub use collab::{DatasetFetcher, NotebookExecutor};
pub use error::{ExecutionError, FetchError, RunnerError};
pub use report::{BatchReport, FetchOutcome, Outcome, OutcomeCounts};
pub use runner::{CancelHandle, RunOptions, Runner};
