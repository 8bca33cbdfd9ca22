//! Error types for rehearse-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest loading and validation.
///
/// Validation is all-or-nothing: the first violation rejects the whole load,
/// so a partially valid manifest is never returned.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Two records share the same `name`.
    #[error("duplicate notebook name '{name}' in manifest")]
    DuplicateName { name: String },

    /// A record is missing a required field (or the field is empty).
    #[error("notebook '{entry}' is missing required field '{field}'")]
    MissingField { entry: String, field: &'static str },

    /// A record's set-valued field is not a proper set after normalization.
    #[error("notebook '{entry}' has malformed '{field}': {reason}")]
    MalformedSet {
        entry: String,
        field: &'static str,
        reason: String,
    },

    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
