//! External collaborator traits.
//!
//! Both collaborators are synchronous by contract; the runner wraps every
//! call in `tokio::task::spawn_blocking`, so implementations are free to do
//! blocking I/O. The runner guarantees `fetch` is called at most once per
//! dataset id per run and `execute` is never called before all of the
//! notebook's prerequisite fetches reached a terminal state.

use rehearse_core::{DatasetId, NotebookName};

use crate::error::{ExecutionError, FetchError};

/// Transfers one dataset into the local environment.
///
/// Must be idempotent: fetching an already-present dataset is a cheap no-op.
pub trait DatasetFetcher: Send + Sync {
    fn fetch(&self, dataset: &DatasetId) -> Result<(), FetchError>;
}

/// Executes one notebook.
pub trait NotebookExecutor: Send + Sync {
    fn execute(&self, name: &NotebookName, url: &str) -> Result<(), ExecutionError>;
}
