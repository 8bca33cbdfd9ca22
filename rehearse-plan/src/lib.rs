//! # rehearse-plan
//!
//! Pure resolution and planning: turn a manifest plus a requested notebook
//! set into a deterministic, deduplicated execution plan. No I/O happens in
//! this crate.

pub mod error;
pub mod planner;
pub mod resolver;

pub use error::ResolveError;
pub use planner::{plan, ExecutionPlan, PlanStep};
pub use resolver::{resolve, DatasetDemand, Resolution, ResolutionResult};
