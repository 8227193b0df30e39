//! Object storage abstraction.
//!
//! Intake reads manifests and subscribes buckets to restore-completed events
//! through the `ObjectStorage` trait.

mod fs;
mod types;

pub use fs::FsObjectStorage;
pub use types::*;
