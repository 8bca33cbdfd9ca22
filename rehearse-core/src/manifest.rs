//! Validated notebook manifest.
//!
//! # On-disk shape
//!
//! The manifest is a bare YAML list of records:
//!
//! ```yaml
//! - name: overview
//!   url: tutorials/overview.ipynb
//!   tutorial: true
//! - name: analysis_3d
//!   url: tutorials/analysis_3d.ipynb
//!   datasets: [cta-1dc]
//!   requires: [iminuit]
//!   tutorial: true
//! ```
//!
//! # Load semantics
//!
//! [`Manifest::load`] validates the whole record list atomically: the first
//! violation (duplicate name, missing field, duplicate set member) rejects
//! the entire load. Uniqueness is enforced once here, never re-checked at
//! lookup time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{io_err, ManifestError};
use crate::types::{DatasetId, Notebook, NotebookName, NotebookRecord, Requirement};

/// Validated, immutable notebook table keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    notebooks: BTreeMap<NotebookName, Notebook>,
}

impl Manifest {
    /// Validate raw records into a manifest.
    ///
    /// All-or-nothing: returns the first [`ManifestError`] encountered and
    /// never a partially valid manifest.
    pub fn load(records: Vec<NotebookRecord>) -> Result<Manifest, ManifestError> {
        let mut notebooks = BTreeMap::new();

        for record in records {
            let name = record.name.trim();
            if name.is_empty() {
                return Err(ManifestError::MissingField {
                    entry: record.name.clone(),
                    field: "name",
                });
            }
            if record.url.trim().is_empty() {
                return Err(ManifestError::MissingField {
                    entry: name.to_string(),
                    field: "url",
                });
            }

            let datasets = normalize_set(name, "datasets", &record.datasets)?
                .into_iter()
                .map(DatasetId)
                .collect();
            let images = normalize_set(name, "images", &record.images)?;
            let requires = normalize_set(name, "requires", &record.requires)?
                .into_iter()
                .map(Requirement)
                .collect();

            let notebook = Notebook {
                name: NotebookName::from(name),
                url: record.url.trim().to_string(),
                datasets,
                images,
                requires,
                tutorial: record.tutorial,
            };

            if notebooks.insert(notebook.name.clone(), notebook).is_some() {
                return Err(ManifestError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        Ok(Manifest { notebooks })
    }

    /// Read a YAML manifest file and validate it.
    ///
    /// Returns `ManifestError::Io` if unreadable, `ManifestError::Parse`
    /// (with path + line context) if malformed YAML.
    pub fn from_path(path: &Path) -> Result<Manifest, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let records: Vec<NotebookRecord> =
            serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::load(records)
    }

    /// Look up a notebook by name.
    pub fn get(&self, name: &NotebookName) -> Option<&Notebook> {
        self.notebooks.get(name)
    }

    /// Iterate all notebooks, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Notebook> {
        self.notebooks.values()
    }

    /// All notebook names, sorted.
    pub fn names(&self) -> BTreeSet<NotebookName> {
        self.notebooks.keys().cloned().collect()
    }

    /// Names of all official tutorials — the default selection set.
    pub fn tutorial_names(&self) -> BTreeSet<NotebookName> {
        self.notebooks
            .values()
            .filter(|nb| nb.tutorial)
            .map(|nb| nb.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notebooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }
}

/// Trim members and enforce set semantics: no empty members, no duplicates.
fn normalize_set(
    entry: &str,
    field: &'static str,
    members: &[String],
) -> Result<BTreeSet<String>, ManifestError> {
    let mut set = BTreeSet::new();
    for member in members {
        let member = member.trim();
        if member.is_empty() {
            return Err(ManifestError::MalformedSet {
                entry: entry.to_string(),
                field,
                reason: "empty member".to_string(),
            });
        }
        if !set.insert(member.to_string()) {
            return Err(ManifestError::MalformedSet {
                entry: entry.to_string(),
                field,
                reason: format!("duplicate member '{member}'"),
            });
        }
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
