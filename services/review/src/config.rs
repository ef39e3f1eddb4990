//! Service configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// HTTP and session settings for the review service
///
/// Read from `REVIEW_`-prefixed environment variables, e.g.
/// `REVIEW_BIND_ADDRESS`. Store settings are read separately by
/// `common::database::StoreConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Idle time before a review session is evicted
    pub session_ttl_seconds: u64,
    /// How often expired sessions are swept
    pub sweep_interval_seconds: u64,
}

impl ServiceConfig {
    /// Load the configuration from the environment with defaults
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_seconds", 3600)?
            .set_default("sweep_interval_seconds", 60)?
            .add_source(Environment::with_prefix("REVIEW").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}
