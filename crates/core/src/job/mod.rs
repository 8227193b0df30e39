//! Job and per-object tracking records.

mod sqlite_record_store;
mod sqlite_store;
mod store;
mod types;

pub use sqlite_record_store::SqliteObjectRecordStore;
pub use sqlite_store::SqliteJobStore;
pub use store::{JobStore, ObjectRecordStore, StoreError};
pub use types::{
    Job, JobPage, JobStatus, ObjectRecord, ParseJobStatusError, OBJECT_RECORD_TTL_DAYS,
};
