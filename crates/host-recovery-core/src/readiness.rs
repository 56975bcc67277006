//! Chassis power-on readiness gate.
//!
//! The chassis power-on target creates a marker file when it starts and
//! removes it once the chassis state manager has processed its completion.
//! Reading the host's boot progress before that point can race with the
//! host state service still initialising the property, so the pipeline
//! blocks here first.
//!
//! There is no timeout. If the target never completes, the service is
//! stopped externally (e.g. on chassis power off).

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::ReadinessConfig;

/// Observes whether the readiness marker is still present.
pub trait MarkerProbe: Send + Sync {
    /// Returns `true` while chassis power-on orchestration is still running.
    fn is_present(&self) -> bool;

    /// Marker location, for log context.
    fn describe(&self) -> String;
}

/// Marker backed by a filesystem path. Contents are never read.
#[derive(Debug, Clone)]
pub struct FsMarker {
    path: PathBuf,
}

impl FsMarker {
    /// Creates a probe for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a probe for the path resolved from `config`.
    #[must_use]
    pub fn from_config(config: &ReadinessConfig) -> Self {
        Self::new(config.marker_path())
    }

    /// Marker path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerProbe for FsMarker {
    // An unreadable path counts as absent, the same as a missing one.
    fn is_present(&self) -> bool {
        self.path.exists()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Blocks until chassis power-on orchestration has completed.
#[derive(Debug)]
pub struct ReadinessGate<M> {
    marker: M,
    poll_interval: Duration,
}

impl<M: MarkerProbe> ReadinessGate<M> {
    /// Creates a gate polling `marker` every `poll_interval`.
    #[must_use]
    pub const fn new(marker: M, poll_interval: Duration) -> Self {
        Self {
            marker,
            poll_interval,
        }
    }

    /// Waits until the marker is absent.
    ///
    /// Returns immediately if the marker is already gone. Otherwise sleeps
    /// for the poll interval between checks, with no upper bound on the
    /// number of checks. Returns the number of checks that found the marker
    /// present.
    pub async fn wait_for_chassis_ready(&self) -> u64 {
        let mut waits: u64 = 0;
        while self.marker.is_present() {
            debug!(
                marker = %self.marker.describe(),
                "Waiting for chassis on target to complete"
            );
            waits = waits.saturating_add(1);
            tokio::time::sleep(self.poll_interval).await;
        }
        waits
    }
}
