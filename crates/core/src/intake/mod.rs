//! Job intake.
//!
//! Accepts a manifest location, submits one bulk restore covering every
//! listed object and seeds the tracking rows the reconciler works from.

mod manifest;
mod service;
mod types;

pub use manifest::{distinct_buckets, parse_manifest, ManifestEntry, ManifestError};
pub use service::JobIntake;
pub use types::*;
