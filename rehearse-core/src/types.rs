//! Domain types for the Rehearse notebook manifest.
//!
//! Set-valued fields use `BTreeSet` after validation so that every iteration
//! over datasets, requirements, or notebook names is lexicographic — plans and
//! reports come out byte-identical across runs regardless of manifest order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a notebook entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotebookName(pub String);

impl fmt::Display for NotebookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for NotebookName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NotebookName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed identifier for an external dataset.
///
/// Opaque to the core: it may name a single file or a bundle of files; the
/// fetch collaborator decides what it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DatasetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DatasetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a soft dependency (an optional capability of the
/// execution environment, e.g. an extra library).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requirement(pub String);

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Requirement {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Requirement {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One raw manifest record, exactly as parsed from YAML.
///
/// Set-valued fields arrive as plain lists so that validation can reject
/// duplicate members instead of silently collapsing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRecord {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub datasets: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Soft dependencies; absent means "no constraint".
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub tutorial: bool,
}

/// A validated notebook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notebook {
    pub name: NotebookName,
    /// Opaque locator of the notebook content.
    pub url: String,
    pub datasets: BTreeSet<DatasetId>,
    /// Used only by the documentation pipeline; inert to orchestration.
    pub images: BTreeSet<String>,
    pub requires: BTreeSet<Requirement>,
    pub tutorial: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
