//! The single-shot recovery pipeline.
//!
//! Runs the readiness gate, then the boot-state read, then (only on a
//! positive classification) the incident report. Each stage runs at most
//! once and strictly after the previous one completed.

use thiserror::Error;
use tracing::info;

use crate::boot_progress::{BootProgressSource, BootStateClassifier, ClassifyError};
use crate::config::RecoveryConfig;
use crate::incident::{IncidentReporter, IncidentSink, ReportError};
use crate::readiness::{MarkerProbe, ReadinessGate};

/// How a successful run ended. Both outcomes are a clean exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The host was not booting; nothing recorded.
    HostIdle,
    /// The host was booting; a `HostNotRunning` incident was created.
    IncidentReported,
}

/// A fatal pipeline failure. No incident was recorded for this run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecoveryError {
    /// The boot-progress read failed.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The incident could not be recorded.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Gate, classifier and reporter composed into one run.
#[derive(Debug)]
pub struct RecoveryCheck<M, S, K> {
    gate: ReadinessGate<M>,
    classifier: BootStateClassifier<S>,
    reporter: IncidentReporter<K>,
}

impl<M, S, K> RecoveryCheck<M, S, K>
where
    M: MarkerProbe,
    S: BootProgressSource,
    K: IncidentSink,
{
    /// Composes already-built stages.
    #[must_use]
    pub const fn new(
        gate: ReadinessGate<M>,
        classifier: BootStateClassifier<S>,
        reporter: IncidentReporter<K>,
    ) -> Self {
        Self {
            gate,
            classifier,
            reporter,
        }
    }

    /// Builds every stage from `config` and the given collaborators.
    #[must_use]
    pub fn from_config(config: &RecoveryConfig, marker: M, source: S, sink: K) -> Self {
        Self::new(
            ReadinessGate::new(marker, config.readiness.poll_interval),
            BootStateClassifier::new(source, config.host_state.clone()),
            IncidentReporter::new(sink, config.logging.clone()),
        )
    }

    /// Runs the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError`] if the boot-progress read or the incident
    /// submission failed. Failures are already logged by the stage that hit
    /// them.
    pub async fn run(&self) -> Result<RecoveryOutcome, RecoveryError> {
        self.gate.wait_for_chassis_ready().await;

        info!("Chassis power on has completed, checking if host is still running after the BMC reboot");

        if !self.classifier.was_host_booting().await? {
            return Ok(RecoveryOutcome::HostIdle);
        }

        // TODO: start the host quiesce target once an incident is recorded.
        self.reporter.report_host_not_running().await?;
        Ok(RecoveryOutcome::IncidentReported)
    }
}
