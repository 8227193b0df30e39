use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Account, role, report bucket and notification queue are set
/// - Batch endpoint is an http(s) URL
/// - Reconciler intervals and page size are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.account.id.trim().is_empty() {
        return Err(invalid("account.id cannot be empty"));
    }

    if config.intake.role_arn.trim().is_empty() {
        return Err(invalid("intake.role_arn cannot be empty"));
    }

    if !config.intake.report_bucket_arn.starts_with("arn:") {
        return Err(invalid("intake.report_bucket_arn must be an ARN"));
    }

    if config.intake.notification_queue.trim().is_empty() {
        return Err(invalid("intake.notification_queue cannot be empty"));
    }

    let endpoint = &config.batch.endpoint;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(invalid("batch.endpoint must be an http(s) URL"));
    }

    let reconciler = &config.reconciler;
    if reconciler.poll_interval_ms == 0 || reconciler.expiry_sweep_interval_ms == 0 {
        return Err(invalid("reconciler intervals must be greater than 0"));
    }
    if reconciler.scan_page_size == 0 {
        return Err(invalid("reconciler.scan_page_size must be greater than 0"));
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccountConfig, BatchConfig, DatabaseConfig, IntakeConfig, NotificationsConfig,
        ServerConfig, StorageConfig,
    };
    use crate::reconciler::ReconcilerConfig;

    fn valid_config() -> Config {
        Config {
            account: AccountConfig {
                id: "111122223333".to_string(),
            },
            intake: IntakeConfig {
                report_bucket_arn: "arn:aws:s3:::restore-reports".to_string(),
                role_arn: "arn:aws:iam::111122223333:role/batch-restore".to_string(),
                notification_queue: "arn:aws:sqs:eu-west-1:111122223333:restore-events"
                    .to_string(),
                topic_queue: None,
                priority: 10,
            },
            batch: BatchConfig {
                endpoint: "http://localhost:9300".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            notifications: NotificationsConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_report_bucket_must_be_arn() {
        let mut config = valid_config();
        config.intake.report_bucket_arn = "restore-reports".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_batch_endpoint_scheme() {
        let mut config = valid_config();
        config.batch.endpoint = "localhost:9300".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = valid_config();
        config.reconciler.scan_page_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
