//! Directory configuration.
//!
//! Holds the downtime reason that excludes instances from synchronization,
//! the periodic sync interval, and the retry policy for contended writes.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::gateway::RetryPolicy;

/// Downtime reason recorded for a primary demoted during recovery.
pub const DEFAULT_LOST_IN_RECOVERY_REASON: &str = "lost-in-recovery";

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

/// Configuration for an [`AliasDirectory`](crate::AliasDirectory).
///
/// # Example
///
/// ```rust,ignore
/// // Defaults: "lost-in-recovery", 60s interval, 5 write attempts
/// let config = DirectoryConfig::default();
///
/// // From a JSON document; missing fields take defaults
/// let config = DirectoryConfig::from_json_str(r#"{"sync_interval_secs": 30}"#)?;
///
/// // Builder
/// let config = DirectoryConfig::builder()
///     .lost_in_recovery_reason("demoted")
///     .sync_interval(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    lost_in_recovery_reason: String,
    sync_interval_secs: u64,
    retry: RetryPolicy,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            lost_in_recovery_reason: DEFAULT_LOST_IN_RECOVERY_REASON.to_string(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl DirectoryConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DirectoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the directory cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lost_in_recovery_reason.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lost_in_recovery_reason",
                reason: "must not be empty".to_string(),
            });
        }
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync_interval_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Downtime reason that excludes an instance from synchronization.
    pub fn lost_in_recovery_reason(&self) -> &str {
        &self.lost_in_recovery_reason
    }

    /// Delay between periodic synchronization passes.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Retry policy for transactional writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

/// Builder for [`DirectoryConfig`].
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfigBuilder {
    config: DirectoryConfig,
}

impl DirectoryConfigBuilder {
    /// Set the downtime reason sentinel.
    pub fn lost_in_recovery_reason(mut self, reason: impl Into<String>) -> Self {
        self.config.lost_in_recovery_reason = reason.into();
        self
    }

    /// Set the periodic sync interval (rounded up to whole seconds).
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        let partial = u64::from(interval.subsec_nanos() > 0);
        self.config.sync_interval_secs = interval.as_secs().saturating_add(partial);
        self
    }

    /// Set the write retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the configuration (infallible; call `validate` to check it).
    pub fn build(self) -> DirectoryConfig {
        self.config
    }
}
