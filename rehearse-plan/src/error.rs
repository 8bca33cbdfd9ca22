//! Error types for rehearse-plan.

use rehearse_core::NotebookName;
use thiserror::Error;

/// All errors that can arise from dependency resolution.
///
/// Resolution errors are structural: the request itself is unsatisfiable, so
/// they abort the run before any planning or I/O.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A requested name does not exist in the manifest.
    #[error("unknown notebook '{name}' — not present in the manifest")]
    UnknownNotebook { name: NotebookName },
}
