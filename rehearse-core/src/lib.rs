//! Rehearse core library — domain types, manifest loading, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`ManifestError`]
//! - [`manifest`] — [`Manifest`] load / validate / lookup

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use manifest::Manifest;
pub use types::{DatasetId, Notebook, NotebookName, NotebookRecord, Requirement};
