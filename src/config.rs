//! Collector configuration.
//!
//! A small TOML file plus one environment override. The collector itself
//! only depends on the [`ConfigSource`] trait, so hosting platforms with
//! their own configuration stores (device registries, parameter services)
//! can plug in without touching the loop.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::ConfigError;

/// Environment variable overriding the configured device identifier.
///
/// Mirrors how hosting platforms inject the device name into the process
/// environment rather than the config file.
pub const DEVICE_ID_ENV: &str = "ECOGW_DEVICE_ID";

/// Collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Gateway network address, `host` or `host:port` (required)
    pub gateway_address: String,

    /// Device identifier used to build the publish topic
    #[serde(default)]
    pub device_id: String,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Connection timeout (milliseconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Response read timeout (milliseconds)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    3000
}

impl CollectorConfig {
    /// Parse configuration from a TOML string and apply environment
    /// overrides.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;

        if let Ok(device_id) = std::env::var(DEVICE_ID_ENV) {
            debug!(%device_id, "device id taken from environment");
            config.device_id = device_id;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway_address.is_empty() {
            return Err(ConfigError::Missing("gateway_address"));
        }
        if self.device_id.is_empty() {
            return Err(ConfigError::Missing("device_id"));
        }
        Ok(())
    }
}

/// Source of per-cycle configuration.
///
/// The gateway address is resolved fresh every cycle so a source backed
/// by a live platform store can move the collector to a new address
/// without a restart.
pub trait ConfigSource: Send + Sync {
    /// Current gateway network address.
    fn gateway_address(&self) -> Result<String, ConfigError>;

    /// Device identifier used to build the publish topic.
    fn device_id(&self) -> Result<String, ConfigError>;
}

/// Config source backed by one loaded [`CollectorConfig`].
#[derive(Debug, Clone)]
pub struct StaticSource {
    config: CollectorConfig,
}

impl StaticSource {
    /// Wrap a loaded configuration.
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }
}

impl ConfigSource for StaticSource {
    fn gateway_address(&self) -> Result<String, ConfigError> {
        Ok(self.config.gateway_address.clone())
    }

    fn device_id(&self) -> Result<String, ConfigError> {
        Ok(self.config.device_id.clone())
    }
}

/// Example configuration printed by `ecogw example`.
pub const EXAMPLE_CONFIG: &str = r#"# ecogw configuration

# Gateway address; the fixed protocol port 45000 is appended
# when no port is given.
gateway_address = "192.168.1.50"

# Used to build the publish topic ecowitt/<device_id>/livedata.
# Overridable with the ECOGW_DEVICE_ID environment variable.
device_id = "backyard-station"

# Fixed delay between acquisition cycles.
poll_interval_secs = 60

connect_timeout_ms = 5000
read_timeout_ms = 3000
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = CollectorConfig::from_toml(
            r#"
            gateway_address = "192.168.1.50"
            device_id = "station-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.read_timeout_ms, 3000);
    }

    #[test]
    fn test_missing_gateway_address_rejected() {
        let err = CollectorConfig::from_toml(r#"device_id = "x""#).unwrap_err();
        // Absent required field fails at the TOML layer
        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");

        let err = CollectorConfig::from_toml(
            r#"
            gateway_address = ""
            device_id = "x"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("gateway_address")));
    }

    #[test]
    fn test_example_config_parses() {
        std::env::remove_var(DEVICE_ID_ENV);
        let config = CollectorConfig::from_toml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.gateway_address, "192.168.1.50");
        assert_eq!(config.device_id, "backyard-station");
    }

    #[test]
    fn test_static_source() {
        let config = CollectorConfig {
            gateway_address: "10.0.0.2:45000".into(),
            device_id: "roof".into(),
            poll_interval_secs: 60,
            connect_timeout_ms: 5000,
            read_timeout_ms: 3000,
        };
        let source = StaticSource::new(config);
        assert_eq!(source.gateway_address().unwrap(), "10.0.0.2:45000");
        assert_eq!(source.device_id().unwrap(), "roof");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecogw.toml");
        std::fs::write(&path, "gateway_address = \"h\"\ndevice_id = \"d\"\n").unwrap();

        let config = CollectorConfig::from_file(&path).unwrap();
        assert_eq!(config.gateway_address, "h");

        let err = CollectorConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
