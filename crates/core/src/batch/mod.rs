//! Bulk operation service abstraction.
//!
//! The `BatchService` trait creates and polls the bulk restore operations a
//! job is built on.

mod http;
mod types;

pub use http::HttpBatchService;
pub use types::*;
