//! Boot-progress read and classification.
//!
//! The host state service publishes how far the host got through its boot
//! sequence as a fully-qualified enumeration string. Only one value matters
//! here: `ProgressStages.Unspecified`, meaning no boot activity was ever
//! recorded. Every other value, including stages this crate has never
//! heard of and stages that may mean boot already finished, is treated as
//! "the host was booting".

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::bus::BusError;
use crate::config::HostStateConfig;

/// Stage value meaning no boot progress was recorded.
pub const UNSPECIFIED_STAGE: &str =
    "xyz.openbmc_project.State.Boot.Progress.ProgressStages.Unspecified";

/// A boot-progress stage as published by the host state service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BootProgressStage(String);

impl BootProgressStage {
    /// Wraps a raw stage value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The sentinel stage.
    #[must_use]
    pub fn unspecified() -> Self {
        Self::new(UNSPECIFIED_STAGE)
    }

    /// Full stage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing enumerator name, e.g. `OSRunning`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Returns `true` only for the exact sentinel value.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.0 == UNSPECIFIED_STAGE
    }

    /// Whether a host that last reported this stage was booting.
    #[must_use]
    pub fn indicates_booting(&self) -> bool {
        !self.is_unspecified()
    }
}

impl fmt::Display for BootProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BootProgressStage {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Remote source of the host's last recorded boot-progress stage.
#[async_trait]
pub trait BootProgressSource: Send + Sync {
    /// Reads the `BootProgress` property.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the service, object or property cannot be
    /// reached or the reply is not a string.
    async fn boot_progress(&self, target: &HostStateConfig) -> Result<BootProgressStage, BusError>;
}

/// Failure to determine whether the host was booting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("error reading {property} from {service} at {path}: {source}")]
pub struct ClassifyError {
    /// Service that was queried.
    pub service: String,
    /// Object path that was queried.
    pub path: String,
    /// Property that was queried.
    pub property: String,
    /// Underlying remote-call failure.
    #[source]
    pub source: BusError,
}

/// Decides whether the host was booting when the BMC restarted.
#[derive(Debug)]
pub struct BootStateClassifier<S> {
    source: S,
    target: HostStateConfig,
}

impl<S: BootProgressSource> BootStateClassifier<S> {
    /// Creates a classifier reading from `source` at `target`.
    #[must_use]
    pub const fn new(source: S, target: HostStateConfig) -> Self {
        Self { source, target }
    }

    /// Reads the last boot-progress stage and classifies it.
    ///
    /// Returns `Ok(false)` only for the `Unspecified` sentinel.
    ///
    /// # Errors
    ///
    /// A failed read is returned as [`ClassifyError`]; it never defaults to
    /// either answer.
    pub async fn was_host_booting(&self) -> Result<bool, ClassifyError> {
        let stage = match self.source.boot_progress(&self.target).await {
            Ok(stage) => stage,
            Err(source) => {
                error!(
                    error = %source,
                    service = %self.target.service,
                    path = %self.target.object_path,
                    "Error reading BootProgress"
                );
                return Err(ClassifyError {
                    service: self.target.service.clone(),
                    path: self.target.object_path.clone(),
                    property: self.target.property.clone(),
                    source,
                });
            },
        };

        if stage.is_unspecified() {
            info!("Host was not booting before BMC reboot");
            return Ok(false);
        }

        info!(
            boot_progress = %stage,
            "Host was booting before BMC reboot"
        );
        Ok(true)
    }
}
