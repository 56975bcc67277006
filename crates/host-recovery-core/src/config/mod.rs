//! Configuration parsing and management.
//!
//! Every addressing constant the recovery check needs (marker path, host
//! state service, logging service) lives here. The defaults are the values
//! used on a standard single-host BMC; a TOML file may override any of them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the chassis instance in the marker template.
pub const INSTANCE_PLACEHOLDER: &str = "{instance}";

/// Top-level recovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Chassis power-on readiness gate.
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Where the host boot progress is published.
    #[serde(default)]
    pub host_state: HostStateConfig,

    /// Where incident records are created.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RecoveryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails [`Self::validate`].
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every addressing field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readiness.marker_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "readiness.marker_template cannot be empty".to_string(),
            ));
        }
        if self.readiness.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "readiness.poll_interval must be greater than zero".to_string(),
            ));
        }

        require_name("host_state.service", &self.host_state.service)?;
        require_object_path("host_state.object_path", &self.host_state.object_path)?;
        require_name("host_state.interface", &self.host_state.interface)?;
        require_name("host_state.property", &self.host_state.property)?;

        require_name("logging.service", &self.logging.service)?;
        require_object_path("logging.object_path", &self.logging.object_path)?;
        require_name("logging.interface", &self.logging.interface)?;
        Ok(())
    }
}

fn require_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_object_path(field: &str, value: &str) -> Result<(), ConfigError> {
    require_name(field, value)?;
    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must be an absolute object path, got '{value}'"
        )));
    }
    Ok(())
}

/// Chassis power-on readiness configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Marker path template. `{instance}` is replaced with [`Self::instance`].
    ///
    /// The chassis power-on target creates this file when it starts and
    /// removes it once the chassis state manager has processed completion.
    #[serde(default = "default_marker_template")]
    pub marker_template: String,

    /// Chassis instance index.
    #[serde(default)]
    pub instance: u32,

    /// Delay between marker checks.
    #[serde(default = "default_poll_interval")]
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl ReadinessConfig {
    /// Resolve the marker template for the configured instance.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        PathBuf::from(
            self.marker_template
                .replace(INSTANCE_PLACEHOLDER, &self.instance.to_string()),
        )
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            marker_template: default_marker_template(),
            instance: 0,
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_marker_template() -> String {
    "/run/openbmc/chassis@{instance}-on".to_string()
}

const fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

/// Host state service addressing for the boot-progress read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostStateConfig {
    /// Well-known bus name of the host state service.
    #[serde(default = "default_host_state_service")]
    pub service: String,

    /// Object path of the host instance.
    #[serde(default = "default_host_state_path")]
    pub object_path: String,

    /// Interface that owns the boot-progress property.
    #[serde(default = "default_boot_progress_interface")]
    pub interface: String,

    /// Property name.
    #[serde(default = "default_boot_progress_property")]
    pub property: String,
}

impl Default for HostStateConfig {
    fn default() -> Self {
        Self {
            service: default_host_state_service(),
            object_path: default_host_state_path(),
            interface: default_boot_progress_interface(),
            property: default_boot_progress_property(),
        }
    }
}

fn default_host_state_service() -> String {
    "xyz.openbmc_project.State.Host".to_string()
}

fn default_host_state_path() -> String {
    "/xyz/openbmc_project/state/host0".to_string()
}

fn default_boot_progress_interface() -> String {
    "xyz.openbmc_project.State.Boot.Progress".to_string()
}

fn default_boot_progress_property() -> String {
    "BootProgress".to_string()
}

/// Logging service addressing for incident creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Well-known bus name of the logging service.
    #[serde(default = "default_logging_service")]
    pub service: String,

    /// Logging root object.
    #[serde(default = "default_logging_path")]
    pub object_path: String,

    /// Interface that provides `Create`.
    #[serde(default = "default_logging_create_interface")]
    pub interface: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service: default_logging_service(),
            object_path: default_logging_path(),
            interface: default_logging_create_interface(),
        }
    }
}

fn default_logging_service() -> String {
    "xyz.openbmc_project.Logging".to_string()
}

fn default_logging_path() -> String {
    "/xyz/openbmc_project/logging".to_string()
}

fn default_logging_create_interface() -> String {
    "xyz.openbmc_project.Logging.Create".to_string()
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
