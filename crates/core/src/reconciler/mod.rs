//! Job reconciler.
//!
//! Periodically merges each job's bulk operation status with its object
//! record counts, persists the derived status and progress, and notifies
//! downstream when either changes.

mod config;
mod pass;
mod runner;
mod types;

pub use config::ReconcilerConfig;
pub use pass::{coarse_progress, working_status};
pub use runner::JobReconciler;
pub use types::{PassSummary, ReconcileError, ReconcilerStatus};
