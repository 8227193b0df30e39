use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::reconciler::ReconcilerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub account: AccountConfig,
    pub intake: IntakeConfig,
    pub batch: BatchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (job and object tables share one file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bulkrestore.db")
}

/// Filesystem object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory; each bucket is a subdirectory.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/objects")
}

/// Provider account the bulk operations run under
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub id: String,
}

/// Job intake configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntakeConfig {
    /// ARN of the bucket receiving completion reports (e.g. "arn:aws:s3:::reports").
    pub report_bucket_arn: String,
    /// Role the bulk operation assumes.
    pub role_arn: String,
    /// Queue that per-bucket restore-completed subscriptions deliver to.
    pub notification_queue: String,
    /// Queue subscribed to the notification topic, echoed back to callers.
    #[serde(default)]
    pub topic_queue: Option<String>,
    /// Priority of submitted bulk operations.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    10
}

/// Bulk operation service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Base URL of the bulk operation API (e.g. "http://localhost:9300")
    pub endpoint: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_batch_timeout")]
    pub timeout_secs: u32,
}

fn default_batch_timeout() -> u32 {
    30
}

/// Notification publishing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    /// Topic webhook URL. Notifications are only logged when unset.
    #[serde(default)]
    pub topic: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            topic: None,
            timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_notify_timeout() -> u32 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub account: AccountConfig,
    pub intake: IntakeConfig,
    pub batch: SanitizedBatchConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationsConfig,
    pub reconciler: ReconcilerConfig,
}

/// Batch config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBatchConfig {
    pub endpoint: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            account: config.account.clone(),
            intake: config.intake.clone(),
            batch: SanitizedBatchConfig {
                endpoint: config.batch.endpoint.clone(),
                api_key_configured: config
                    .batch
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                timeout_secs: config.batch.timeout_secs,
            },
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            notifications: config.notifications.clone(),
            reconciler: config.reconciler.clone(),
        }
    }
}
