//! SQLite-backed job store implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::{Job, JobPage, JobStatus, JobStore, StoreError};
use crate::batch::BatchJobStatus;

const JOB_COLUMNS: &str =
    "id, batch_job_id, total_files, created_at, status, batch_status, progress_percent, failed_files";

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Create a new SQLite job store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite job store (useful for testing).
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
            CREATE TABLE IF NOT EXISTS restore_jobs (
                id TEXT PRIMARY KEY,
                batch_job_id TEXT NOT NULL,
                total_files INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                status TEXT,
                batch_status TEXT,
                progress_percent INTEGER,
                failed_files INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("job store connection poisoned".to_string()))
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let created_at_str: String = row.get(3)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(Job {
            id: row.get(0)?,
            batch_job_id: row.get(1)?,
            total_files: row.get(2)?,
            created_at,
            status: parse_column::<JobStatus>(4, row.get(4)?)?,
            batch_status: parse_column::<BatchJobStatus>(5, row.get(5)?)?,
            progress_percent: row.get(6)?,
            failed_files: row.get(7)?,
        })
    }
}

fn parse_column<T>(idx: usize, value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}

impl JobStore for SqliteJobStore {
    fn create(&self, job: &Job) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO restore_jobs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                JOB_COLUMNS
            ),
            params![
                job.id,
                job.batch_job_id,
                job.total_files,
                job.created_at.to_rfc3339(),
                job.status.map(|s| s.as_str()),
                job.batch_status.as_ref().map(|s| s.as_str()),
                job.progress_percent,
                job.failed_files,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let conn = self.conn()?;
        let job = conn
            .query_row(
                &format!("SELECT {} FROM restore_jobs WHERE id = ?", JOB_COLUMNS),
                params![id],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM restore_jobs", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|e| StoreError::Database(e.to_string()))
    }

    fn scan(&self, start_after: Option<&str>, limit: usize) -> Result<JobPage, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM restore_jobs WHERE (?1 IS NULL OR id > ?1) ORDER BY id LIMIT ?2",
            JOB_COLUMNS
        ))?;

        let rows = stmt.query_map(params![start_after, limit as i64], Self::row_to_job)?;
        let jobs = rows.collect::<Result<Vec<_>, _>>()?;

        // A full page may have more rows behind it
        let last_evaluated_key = if limit > 0 && jobs.len() == limit {
            jobs.last().map(|job| job.id.clone())
        } else {
            None
        };

        Ok(JobPage {
            jobs,
            last_evaluated_key,
        })
    }

    fn record_batch_status(
        &self,
        id: &str,
        status: JobStatus,
        batch_status: BatchJobStatus,
        failed_files: u64,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE restore_jobs SET status = ?, batch_status = ?, failed_files = ?, progress_percent = 0 WHERE id = ?",
            params![status.as_str(), batch_status.as_str(), failed_files, id],
        )?;
        Ok(())
    }

    fn update_progress(&self, id: &str, progress_percent: u32) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE restore_jobs SET progress_percent = ?, status = ? WHERE id = ?",
            params![progress_percent, JobStatus::Restoring.as_str(), id],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM restore_jobs WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
