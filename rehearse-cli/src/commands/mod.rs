//! Subcommand implementations plus the shared selection helpers.

pub mod list;
pub mod plan;
pub mod run;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use rehearse_core::{Manifest, NotebookName, Requirement};

/// Load and validate the manifest file.
pub(crate) fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::from_path(path)
        .with_context(|| format!("failed to load manifest from {}", path.display()))
}

/// Requested notebook set: positional names win, then `--all`, then the
/// default of every official tutorial.
pub(crate) fn selected_names(
    manifest: &Manifest,
    notebooks: &[String],
    all: bool,
) -> BTreeSet<NotebookName> {
    if !notebooks.is_empty() {
        return notebooks.iter().map(|n| NotebookName::from(n.as_str())).collect();
    }
    if all {
        return manifest.names();
    }
    manifest.tutorial_names()
}

/// Capabilities declared available via repeated `--with` flags.
pub(crate) fn available_requirements(with: &[String]) -> BTreeSet<Requirement> {
    with.iter().map(|r| Requirement::from(r.as_str())).collect()
}
