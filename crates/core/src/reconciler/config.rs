//! Reconciler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job reconciler and the expiry sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Run the background loops. When disabled, passes only run on demand
    /// through the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Time between reconcile passes (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Jobs older than this are timed out.
    #[serde(default = "default_deadline_days")]
    pub job_deadline_days: u32,

    /// Rows per job table page.
    #[serde(default = "default_page_size")]
    pub scan_page_size: usize,

    /// Time between expired object record sweeps (milliseconds).
    #[serde(default = "default_sweep_interval")]
    pub expiry_sweep_interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    300_000 // 5 minutes
}

fn default_deadline_days() -> u32 {
    5
}

fn default_page_size() -> usize {
    100
}

fn default_sweep_interval() -> u64 {
    3_600_000 // 1 hour
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval(),
            job_deadline_days: default_deadline_days(),
            scan_page_size: default_page_size(),
            expiry_sweep_interval_ms: default_sweep_interval(),
        }
    }
}

impl ReconcilerConfig {
    pub fn job_deadline(&self) -> chrono::Duration {
        chrono::Duration::days(self.job_deadline_days as i64)
    }
}
