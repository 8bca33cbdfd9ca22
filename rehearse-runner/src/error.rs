use std::path::PathBuf;

use thiserror::Error;

/// Dataset transfer failure. Recorded in the report and isolated to the
/// datasets' dependents; never fatal to the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer failed for '{dataset}': {detail}")]
    Transfer { dataset: String, detail: String },
}

/// Notebook run failure. Recorded in the report and isolated to that one
/// notebook; never fatal to the batch.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr_tail}")]
    Exit {
        command: String,
        status: std::process::ExitStatus,
        stderr_tail: String,
    },
}

/// Infrastructure failures of the runner itself. Fetch and execution failures
/// never surface here — they live in the report.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("task join failure: {0}")]
    Join(String),
}
