//! SQLite-backed object record store.
//!
//! Records are keyed by (bucket, object_key). The `(job_id, restored)` index
//! backs the per-job pending/done counts the reconciler runs every pass.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{ObjectRecord, ObjectRecordStore, StoreError};

/// SQLite-backed object record store.
pub struct SqliteObjectRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteObjectRecordStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS restore_objects (
                bucket TEXT NOT NULL,
                object_key TEXT NOT NULL,
                job_id TEXT NOT NULL,
                restored INTEGER NOT NULL DEFAULT 0,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (bucket, object_key)
            );

            CREATE INDEX IF NOT EXISTS idx_objects_job_restored ON restore_objects(job_id, restored);
            CREATE INDEX IF NOT EXISTS idx_objects_expires_at ON restore_objects(expires_at);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("object store connection poisoned".to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ObjectRecord> {
        let expires_at_secs: i64 = row.get(4)?;
        let expires_at = Utc
            .timestamp_opt(expires_at_secs, 0)
            .single()
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, expires_at_secs))?;

        Ok(ObjectRecord {
            bucket: row.get(0)?,
            key: row.get(1)?,
            job_id: row.get(2)?,
            restored: row.get(3)?,
            expires_at,
        })
    }
}

impl ObjectRecordStore for SqliteObjectRecordStore {
    fn put_batch(&self, records: &[ObjectRecord]) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO restore_objects (bucket, object_key, job_id, restored, expires_at) VALUES (?, ?, ?, ?, ?)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.bucket,
                    record.key,
                    record.job_id,
                    record.restored,
                    record.expires_at.timestamp(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT bucket, object_key, job_id, restored, expires_at FROM restore_objects WHERE bucket = ? AND object_key = ?",
                params![bucket, key],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn mark_restored(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE restore_objects SET restored = 1 WHERE bucket = ? AND object_key = ?",
            params![bucket, key],
        )?;
        Ok(updated > 0)
    }

    fn count_by_job(&self, job_id: &str, restored: bool) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM restore_objects WHERE job_id = ? AND restored = ?",
            params![job_id, restored],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|e| StoreError::Database(e.to_string()))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM restore_objects WHERE expires_at <= ?",
            params![now.timestamp()],
        )?;
        Ok(removed as u64)
    }
}
