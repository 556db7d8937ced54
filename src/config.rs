// SPDX-License-Identifier: Apache-2.0

//! Gateway configuration
//!
//! Read-mostly settings handed to every audit call. Loaded from a JSON file
//! and optionally overridden from the process environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::error::{GatewayError, GatewayResult};
use crate::engine::types::Endpoint;

pub const ENV_CRITICAL_DDL: &str = "CRITICAL_DDL_ON_OFF";
pub const ENV_INCEPTION_HOST: &str = "INCEPTION_HOST";
pub const ENV_INCEPTION_PORT: &str = "INCEPTION_PORT";
pub const ENV_ROUND_TRIP_TIMEOUT: &str = "INCEPTION_ROUND_TRIP_TIMEOUT_SECS";

/// Configuration for the audit gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `"ON"` enables critical DDL rejection, anything else disables it
    #[serde(rename = "CRITICAL_DDL_ON_OFF", default = "default_critical_ddl")]
    pub critical_ddl_on_off: String,
    /// Review engine host
    #[serde(rename = "INCEPTION_HOST", default = "default_inception_host")]
    pub inception_host: String,
    /// Review engine port
    #[serde(rename = "INCEPTION_PORT", default = "default_inception_port")]
    pub inception_port: u16,
    /// Deadline per round trip to the engine, 0 disables it
    #[serde(default = "default_round_trip_timeout")]
    pub round_trip_timeout_secs: u64,
}

fn default_critical_ddl() -> String {
    "ON".to_string()
}

fn default_inception_host() -> String {
    "127.0.0.1".to_string()
}

fn default_inception_port() -> u16 {
    6669
}

fn default_round_trip_timeout() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            critical_ddl_on_off: default_critical_ddl(),
            inception_host: default_inception_host(),
            inception_port: default_inception_port(),
            round_trip_timeout_secs: default_round_trip_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> GatewayResult<Self> {
        if !path.exists() {
            debug!("No gateway config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::config(format!("Failed to read config: {}", e)))?;

        let config: GatewayConfig = serde_json::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))?;

        info!("Loaded gateway configuration from {:?}", path);
        Ok(config)
    }

    /// Overlay values found in the process environment
    pub fn apply_env(self) -> GatewayResult<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source
    pub fn apply_vars<F>(mut self, lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CRITICAL_DDL) {
            self.critical_ddl_on_off = value;
        }
        if let Some(value) = lookup(ENV_INCEPTION_HOST) {
            self.inception_host = value;
        }
        if let Some(value) = lookup(ENV_INCEPTION_PORT) {
            self.inception_port = value.trim().parse().map_err(|_| {
                GatewayError::config(format!("{} is not a valid port: {}", ENV_INCEPTION_PORT, value))
            })?;
        }
        if let Some(value) = lookup(ENV_ROUND_TRIP_TIMEOUT) {
            self.round_trip_timeout_secs = value.trim().parse().map_err(|_| {
                GatewayError::config(format!(
                    "{} is not a number of seconds: {}",
                    ENV_ROUND_TRIP_TIMEOUT, value
                ))
            })?;
        }
        Ok(self)
    }

    /// Whether the critical DDL gate runs
    pub fn critical_ddl_enabled(&self) -> bool {
        self.critical_ddl_on_off == "ON"
    }

    /// The review engine endpoint (no credentials, no default schema)
    pub fn inception_endpoint(&self) -> Endpoint {
        Endpoint::anonymous(self.inception_host.clone(), self.inception_port)
    }

    pub fn round_trip_timeout(&self) -> Option<Duration> {
        match self.round_trip_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_switch_is_exact_on() {
        let mut config = GatewayConfig::default();
        assert!(config.critical_ddl_enabled());

        config.critical_ddl_on_off = "OFF".to_string();
        assert!(!config.critical_ddl_enabled());

        config.critical_ddl_on_off = "on".to_string();
        assert!(!config.critical_ddl_enabled());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load(&dir.path().join("gateway.json")).unwrap();
        assert_eq!(config.inception_port, 6669);
        assert_eq!(config.round_trip_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_load_uses_upper_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(
            &path,
            r#"{"CRITICAL_DDL_ON_OFF":"OFF","INCEPTION_HOST":"10.1.1.1","INCEPTION_PORT":6000,"round_trip_timeout_secs":0}"#,
        )
        .unwrap();

        let config = GatewayConfig::load(&path).unwrap();
        assert!(!config.critical_ddl_enabled());
        assert_eq!(config.inception_endpoint().address(), "10.1.1.1:6000");
        assert_eq!(config.round_trip_timeout(), None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            GatewayConfig::load(&path),
            Err(GatewayError::Config { .. })
        ));
    }

    #[test]
    fn test_apply_vars_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_CRITICAL_DDL, "OFF"),
            (ENV_INCEPTION_PORT, "7000"),
        ]
        .into_iter()
        .collect();

        let config = GatewayConfig::default()
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.critical_ddl_enabled());
        assert_eq!(config.inception_port, 7000);
        assert_eq!(config.inception_host, "127.0.0.1");
    }

    #[test]
    fn test_apply_vars_bad_port() {
        let result = GatewayConfig::default().apply_vars(|key| {
            (key == ENV_INCEPTION_PORT).then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(GatewayError::Config { .. })));
    }
}
