//! Dependency resolver — requirement satisfaction and dataset demand.
//!
//! For each requested notebook the resolver compares its soft-dependency set
//! against the capabilities declared available and decides runnability up
//! front; the execution collaborator never probes for features at run time.
//!
//! Dataset demand is the many-to-many notebook↔dataset relation collapsed to
//! a map from dataset id to its *runnable* requesters. Datasets needed only
//! by non-runnable notebooks never enter demand, so no fetch work is wasted
//! on entries that will be skipped anyway.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use rehearse_core::{DatasetId, Manifest, NotebookName, Requirement};

use crate::error::ResolveError;

/// Dataset id → names of runnable requested notebooks that need it.
pub type DatasetDemand = BTreeMap<DatasetId, BTreeSet<NotebookName>>;

/// Requirement-satisfaction status for one requested notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub runnable: bool,
    pub missing_requirements: BTreeSet<Requirement>,
    pub blocking_reason: Option<String>,
}

/// Output of one resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub results: BTreeMap<NotebookName, ResolutionResult>,
    pub demand: DatasetDemand,
}

impl Resolution {
    /// Names of requested notebooks that passed the requirement check, sorted.
    pub fn runnable_names(&self) -> BTreeSet<NotebookName> {
        self.results
            .iter()
            .filter(|(_, r)| r.runnable)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Resolve a requested notebook set against the manifest.
///
/// Fails with [`ResolveError::UnknownNotebook`] if any requested name is not
/// in the manifest (the lexicographically first unknown name is reported).
/// Otherwise returns one [`ResolutionResult`] per requested notebook plus the
/// aggregated [`DatasetDemand`]. Deterministic by construction: everything
/// iterates in `BTree` order, so identical inputs give identical output.
pub fn resolve(
    manifest: &Manifest,
    requested: &BTreeSet<NotebookName>,
    available: &BTreeSet<Requirement>,
) -> Result<Resolution, ResolveError> {
    let mut results = BTreeMap::new();
    let mut demand: DatasetDemand = BTreeMap::new();

    for name in requested {
        let notebook = manifest
            .get(name)
            .ok_or_else(|| ResolveError::UnknownNotebook { name: name.clone() })?;

        let missing: BTreeSet<Requirement> =
            notebook.requires.difference(available).cloned().collect();
        let runnable = missing.is_empty();
        let blocking_reason = if runnable {
            None
        } else {
            Some(format!(
                "missing requirement(s): {}",
                missing
                    .iter()
                    .map(|r| r.0.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        };

        if runnable {
            for dataset in &notebook.datasets {
                demand
                    .entry(dataset.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }

        results.insert(
            name.clone(),
            ResolutionResult {
                runnable,
                missing_requirements: missing,
                blocking_reason,
            },
        );
    }

    Ok(Resolution { results, demand })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_core::NotebookRecord;

    fn record(name: &str, datasets: &[&str], requires: &[&str]) -> NotebookRecord {
        NotebookRecord {
            name: name.to_string(),
            url: format!("nb/{name}.ipynb"),
            datasets: datasets.iter().map(|s| s.to_string()).collect(),
            images: vec![],
            requires: requires.iter().map(|s| s.to_string()).collect(),
            tutorial: true,
        }
    }

    fn manifest(records: Vec<NotebookRecord>) -> Manifest {
        Manifest::load(records).expect("valid manifest")
    }

    fn names(items: &[&str]) -> BTreeSet<NotebookName> {
        items.iter().map(|s| NotebookName::from(*s)).collect()
    }

    fn reqs(items: &[&str]) -> BTreeSet<Requirement> {
        items.iter().map(|s| Requirement::from(*s)).collect()
    }

    #[test]
    fn unknown_notebook_is_fatal() {
        let m = manifest(vec![record("x", &[], &[])]);
        let err = resolve(&m, &names(&["x", "ghost"]), &reqs(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownNotebook { name } if name.0 == "ghost"));
    }

    #[test]
    fn no_requirements_means_runnable() {
        let m = manifest(vec![record("x", &["d1"], &[])]);
        let resolution = resolve(&m, &names(&["x"]), &reqs(&[])).expect("resolve");
        let result = &resolution.results[&NotebookName::from("x")];
        assert!(result.runnable);
        assert!(result.missing_requirements.is_empty());
        assert!(result.blocking_reason.is_none());
    }

    #[test]
    fn missing_requirements_block_with_sorted_reason() {
        let m = manifest(vec![record("y", &[], &["zfit", "iminuit"])]);
        let resolution = resolve(&m, &names(&["y"]), &reqs(&[])).expect("resolve");
        let result = &resolution.results[&NotebookName::from("y")];
        assert!(!result.runnable);
        assert_eq!(result.missing_requirements, reqs(&["iminuit", "zfit"]));
        assert_eq!(
            result.blocking_reason.as_deref(),
            Some("missing requirement(s): iminuit, zfit")
        );
    }

    #[test]
    fn available_requirements_unblock() {
        let m = manifest(vec![record("y", &[], &["iminuit"])]);
        let resolution = resolve(&m, &names(&["y"]), &reqs(&["iminuit"])).expect("resolve");
        assert!(resolution.results[&NotebookName::from("y")].runnable);
    }

    #[test]
    fn demand_excludes_datasets_of_blocked_notebooks() {
        let m = manifest(vec![
            record("x", &["d1"], &[]),
            record("y", &["d1", "d2"], &["iminuit"]),
        ]);
        let resolution = resolve(&m, &names(&["x", "y"]), &reqs(&[])).expect("resolve");

        // d1 is demanded only by x; d2 (needed only by blocked y) is absent.
        assert_eq!(resolution.demand.len(), 1);
        let requesters = &resolution.demand[&DatasetId::from("d1")];
        assert_eq!(requesters, &names(&["x"]));
    }

    #[test]
    fn demand_aggregates_shared_datasets() {
        let m = manifest(vec![
            record("a", &["shared"], &[]),
            record("b", &["shared"], &[]),
            record("c", &["solo"], &[]),
        ]);
        let resolution = resolve(&m, &names(&["a", "b", "c"]), &reqs(&[])).expect("resolve");

        assert_eq!(
            resolution.demand[&DatasetId::from("shared")],
            names(&["a", "b"])
        );
        assert_eq!(resolution.demand[&DatasetId::from("solo")], names(&["c"]));
    }

    #[test]
    fn runnable_names_are_sorted_and_filtered() {
        let m = manifest(vec![
            record("z", &[], &[]),
            record("a", &[], &[]),
            record("m", &[], &["iminuit"]),
        ]);
        let resolution = resolve(&m, &names(&["z", "a", "m"]), &reqs(&[])).expect("resolve");
        let runnable: Vec<String> = resolution
            .runnable_names()
            .into_iter()
            .map(|n| n.0)
            .collect();
        assert_eq!(runnable, vec!["a", "z"]);
    }
}
