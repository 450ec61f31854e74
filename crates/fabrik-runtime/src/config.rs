//! Runtime configuration.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::RuntimeError;

/// Default OPC UA server port.
pub const DEFAULT_OPC_UA_PORT: u16 = 4840;

/// Default engine period in milliseconds.
pub const DEFAULT_CYCLE_TIME_MS: u16 = 100;

/// Engine and bridge configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Engine period in milliseconds.
    pub cycle_time_ms: u16,
    /// Cycle deadline in milliseconds; 0 disables the deadline check.
    pub deadline_ms: u64,
    /// OPC UA bridge settings.
    pub opcua: OpcUaConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_time_ms: DEFAULT_CYCLE_TIME_MS,
            deadline_ms: 0,
            opcua: OpcUaConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Layer a TOML document over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(text)
            .map_err(|err| RuntimeError::InvalidConfig(err.to_string().into()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RuntimeError> {
        if self.cycle_time_ms == 0 {
            return Err(RuntimeError::InvalidConfig(
                "cycle-time-ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Engine period as a duration.
    #[must_use]
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.cycle_time_ms))
    }

    /// Cycle deadline, if enabled.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_ms > 0).then(|| Duration::from_millis(self.deadline_ms))
    }
}

/// OPC UA bridge settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OpcUaConfig {
    /// TCP port the server listens on.
    pub port: u16,
    /// Endpoint clients use to reach the server.
    pub endpoint: SmolStr,
    /// Application URI registered as the server namespace.
    pub application_uri: SmolStr,
    /// Namespace index for application-defined node identifiers.
    pub namespace: u16,
}

impl Default for OpcUaConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_OPC_UA_PORT,
            endpoint: SmolStr::new("opc.tcp://localhost:4840"),
            application_uri: SmolStr::new("urn:fabrik:runtime"),
            namespace: 1,
        }
    }
}
