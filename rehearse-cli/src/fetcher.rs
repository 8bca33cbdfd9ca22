//! Dataset fetcher with a SHA-256 fetch ledger.
//!
//! # Storage layout
//!
//! ```text
//! <data-dir>/
//!   <dataset-id>          (fetched payload; ids may contain subdirectories)
//!   .rehearse-fetch.json  (ledger: dataset id → SHA-256 hex digest)
//! ```
//!
//! # Fetch protocol
//!
//! 1. If the target file exists and its digest matches the ledger entry,
//!    skip — re-fetch only what changed or is missing.
//! 2. Download (or copy, for a directory source) into `<target>.rehearse.tmp`.
//! 3. Rename to the final path (atomic on POSIX; `.tmp` sibling stays on the
//!    same filesystem).
//! 4. Update the ledger entry and save the ledger atomically.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rehearse_core::DatasetId;
use rehearse_runner::{DatasetFetcher, FetchError};

/// Ledger file name inside the data directory.
pub const LEDGER_FILE: &str = ".rehearse-fetch.json";

/// Where datasets come from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Remote base URL; datasets are fetched as `{base}/{id}`.
    Url(String),
    /// Local directory; datasets are copied as `{dir}/{id}`.
    Dir(PathBuf),
}

impl DatasetSource {
    /// A base naming an existing local directory copies instead of
    /// downloading; anything else is treated as a URL.
    pub fn parse(base: &str) -> DatasetSource {
        let path = Path::new(base);
        if path.is_dir() {
            DatasetSource::Dir(path.to_path_buf())
        } else {
            DatasetSource::Url(base.trim_end_matches('/').to_string())
        }
    }
}

/// On-disk ledger payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchLedger {
    pub fetched_at: DateTime<Utc>,
    pub datasets: BTreeMap<String, String>,
}

impl Default for FetchLedger {
    fn default() -> Self {
        Self {
            fetched_at: Utc::now(),
            datasets: BTreeMap::new(),
        }
    }
}

/// Concrete [`DatasetFetcher`] over HTTP or the local filesystem.
pub struct HttpFetcher {
    source: DatasetSource,
    data_dir: PathBuf,
    ledger: Mutex<FetchLedger>,
}

impl HttpFetcher {
    /// Open (or start) the fetch ledger under `data_dir`.
    ///
    /// A corrupt ledger is discarded with a warning rather than blocking the
    /// run; every dataset then re-fetches once and the ledger heals.
    pub fn new(source: DatasetSource, data_dir: PathBuf) -> Result<Self, FetchError> {
        std::fs::create_dir_all(&data_dir).map_err(|e| io_err(&data_dir, e))?;
        let ledger_path = data_dir.join(LEDGER_FILE);
        let ledger = if ledger_path.exists() {
            let contents =
                std::fs::read_to_string(&ledger_path).map_err(|e| io_err(&ledger_path, e))?;
            match serde_json::from_str(&contents) {
                Ok(ledger) => ledger,
                Err(err) => {
                    tracing::warn!(
                        path = %ledger_path.display(),
                        error = %err,
                        "discarding corrupt fetch ledger",
                    );
                    FetchLedger::default()
                }
            }
        } else {
            FetchLedger::default()
        };
        Ok(Self {
            source,
            data_dir,
            ledger: Mutex::new(ledger),
        })
    }

    fn ledger(&self) -> MutexGuard<'_, FetchLedger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save_ledger(&self, ledger: &FetchLedger) -> Result<(), FetchError> {
        let path = self.data_dir.join(LEDGER_FILE);
        let json = serde_json::to_string_pretty(ledger)
            .map_err(|e| io_err(&path, std::io::Error::other(e)))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    fn transfer(&self, dataset: &DatasetId, tmp: &Path) -> Result<String, FetchError> {
        let bytes = match &self.source {
            DatasetSource::Dir(dir) => {
                let from = dir.join(&dataset.0);
                std::fs::read(&from).map_err(|e| FetchError::Transfer {
                    dataset: dataset.0.clone(),
                    detail: format!("{}: {e}", from.display()),
                })?
            }
            DatasetSource::Url(base) => {
                let url = format!("{base}/{}", dataset.0);
                let response = ureq::get(&url).call().map_err(|e| FetchError::Transfer {
                    dataset: dataset.0.clone(),
                    detail: e.to_string(),
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|e| FetchError::Transfer {
                        dataset: dataset.0.clone(),
                        detail: format!("read body: {e}"),
                    })?;
                bytes
            }
        };
        std::fs::write(tmp, &bytes).map_err(|e| io_err(tmp, e))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl DatasetFetcher for HttpFetcher {
    fn fetch(&self, dataset: &DatasetId) -> Result<(), FetchError> {
        let target = self.data_dir.join(&dataset.0);

        if target.is_file() {
            let stored = self.ledger().datasets.get(&dataset.0).cloned();
            if let Some(stored) = stored {
                if stored == hash_file(&target)? {
                    tracing::debug!(dataset = %dataset, "dataset cached; skipping fetch");
                    return Ok(());
                }
            }
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}.rehearse.tmp", target.display()));
        let digest = self.transfer(dataset, &tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &target) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&target, e));
        }

        let mut ledger = self.ledger();
        ledger.datasets.insert(dataset.0.clone(), digest);
        ledger.fetched_at = Utc::now();
        self.save_ledger(&ledger)?;
        Ok(())
    }
}

fn hash_file(path: &Path) -> Result<String, FetchError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_with(datasets: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("source dir");
        for (name, content) in datasets {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("mkdir");
            }
            std::fs::write(path, content).expect("write dataset");
        }
        dir
    }

    #[test]
    fn directory_base_is_detected_as_copy_source() {
        let dir = TempDir::new().expect("dir");
        let source = DatasetSource::parse(&dir.path().display().to_string());
        assert!(matches!(source, DatasetSource::Dir(_)));

        let source = DatasetSource::parse("https://example.org/data/");
        match source {
            DatasetSource::Url(base) => assert_eq!(base, "https://example.org/data"),
            other => panic!("expected URL source, got {other:?}"),
        }
    }

    #[test]
    fn fetch_copies_dataset_and_records_digest() {
        let source = source_with(&[("crab.fits", "payload")]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        fetcher.fetch(&DatasetId::from("crab.fits")).expect("fetch");

        let fetched = std::fs::read_to_string(data.path().join("crab.fits")).expect("read");
        assert_eq!(fetched, "payload");

        let ledger: FetchLedger = serde_json::from_str(
            &std::fs::read_to_string(data.path().join(LEDGER_FILE)).expect("ledger"),
        )
        .expect("parse ledger");
        assert_eq!(
            ledger.datasets.get("crab.fits"),
            Some(&hex::encode(Sha256::digest(b"payload")))
        );
    }

    #[test]
    fn cached_dataset_is_not_refetched() {
        let source = source_with(&[("d1", "v1")]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        fetcher.fetch(&DatasetId::from("d1")).expect("first fetch");
        // Remove the source; a cache hit must not touch it.
        std::fs::remove_file(source.path().join("d1")).expect("remove source");
        fetcher.fetch(&DatasetId::from("d1")).expect("cached fetch");
    }

    #[test]
    fn locally_modified_dataset_is_refetched() {
        let source = source_with(&[("d1", "v1")]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        fetcher.fetch(&DatasetId::from("d1")).expect("first fetch");
        std::fs::write(data.path().join("d1"), "tampered").expect("tamper");
        fetcher.fetch(&DatasetId::from("d1")).expect("re-fetch");

        let restored = std::fs::read_to_string(data.path().join("d1")).expect("read");
        assert_eq!(restored, "v1");
    }

    #[test]
    fn missing_source_dataset_is_a_transfer_error() {
        let source = source_with(&[]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        let err = fetcher.fetch(&DatasetId::from("ghost")).unwrap_err();
        assert!(matches!(err, FetchError::Transfer { .. }), "got: {err}");
    }

    #[test]
    fn nested_dataset_ids_create_subdirectories() {
        let source = source_with(&[("hess/dl3.fits", "nested")]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        fetcher.fetch(&DatasetId::from("hess/dl3.fits")).expect("fetch");
        assert!(data.path().join("hess").join("dl3.fits").is_file());
    }

    #[test]
    fn corrupt_ledger_is_discarded_not_fatal() {
        let source = source_with(&[("d1", "v1")]);
        let data = TempDir::new().expect("data dir");
        std::fs::write(data.path().join(LEDGER_FILE), "not json at all").expect("write");

        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher survives corrupt ledger");
        fetcher.fetch(&DatasetId::from("d1")).expect("fetch");
    }

    #[test]
    fn tmp_file_cleaned_up_after_fetch() {
        let source = source_with(&[("d1", "v1")]);
        let data = TempDir::new().expect("data dir");
        let fetcher = HttpFetcher::new(
            DatasetSource::Dir(source.path().to_path_buf()),
            data.path().to_path_buf(),
        )
        .expect("fetcher");

        fetcher.fetch(&DatasetId::from("d1")).expect("fetch");
        assert!(!data.path().join("d1.rehearse.tmp").exists());
    }
}
