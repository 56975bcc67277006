//! Incident record construction and submission.
//!
//! When the host was booting across a BMC restart, a `HostNotRunning` error
//! is created in the logging service. The record is fire-and-forget: the
//! reply of the create call is not inspected, only whether it failed.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::bus::BusError;
use crate::config::LoggingConfig;

/// Error kind identifying a host that is no longer running after a BMC
/// restart.
pub const HOST_NOT_RUNNING: &str = "xyz.openbmc_project.State.Error.HostNotRunning";

/// Metadata key carrying the reporting process id.
pub const PID_KEY: &str = "_PID";

/// Namespace of the severity wire form.
const SEVERITY_PREFIX: &str = "xyz.openbmc_project.Logging.Entry.Level";

/// Logging entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// System is unusable.
    Emergency,
    /// Action must be taken immediately.
    Alert,
    /// Critical condition.
    Critical,
    /// Error condition.
    Error,
    /// Warning condition.
    Warning,
    /// Normal but significant condition.
    Notice,
    /// Informational.
    Informational,
    /// Debug-level message.
    Debug,
}

impl Severity {
    /// Enumerator name without namespace.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Informational => "Informational",
            Self::Debug => "Debug",
        }
    }

    /// Fully-qualified form sent over the bus.
    #[must_use]
    pub fn to_wire(self) -> String {
        format!("{SEVERITY_PREFIX}.{}", self.name())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record construction failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    /// The error kind was empty.
    #[error("incident error kind cannot be empty")]
    EmptyKind,

    /// A metadata key was empty.
    #[error("incident metadata key cannot be empty (value: {value})")]
    EmptyMetadataKey {
        /// Value that was attached to the empty key.
        value: String,
    },
}

/// A structured error record, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRecord {
    message: String,
    severity: Severity,
    additional_data: BTreeMap<String, String>,
}

impl IncidentRecord {
    /// Starts building a record of the given error kind.
    #[must_use]
    pub fn builder(message: impl Into<String>) -> IncidentRecordBuilder {
        IncidentRecordBuilder {
            message: message.into(),
            severity: Severity::Error,
            additional_data: BTreeMap::new(),
        }
    }

    /// The `HostNotRunning` record for process `pid`.
    ///
    /// # Errors
    ///
    /// Never fails for the fixed inputs; the result type is the builder's.
    pub fn host_not_running(pid: i32) -> Result<Self, RecordError> {
        Self::builder(HOST_NOT_RUNNING)
            .severity(Severity::Error)
            .metadata(PID_KEY, pid.to_string())
            .build()
    }

    /// Error kind.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Auxiliary key/value metadata.
    #[must_use]
    pub const fn additional_data(&self) -> &BTreeMap<String, String> {
        &self.additional_data
    }
}

/// Builder for [`IncidentRecord`].
#[derive(Debug, Clone)]
pub struct IncidentRecordBuilder {
    message: String,
    severity: Severity,
    additional_data: BTreeMap<String, String>,
}

impl IncidentRecordBuilder {
    /// Sets the severity (default: [`Severity::Error`]).
    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a metadata entry, replacing any previous value for `key`.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }

    /// Validates and builds the record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] for an empty error kind or metadata key.
    pub fn build(self) -> Result<IncidentRecord, RecordError> {
        if self.message.is_empty() {
            return Err(RecordError::EmptyKind);
        }
        if let Some(value) = self.additional_data.get("") {
            return Err(RecordError::EmptyMetadataKey {
                value: value.clone(),
            });
        }
        Ok(IncidentRecord {
            message: self.message,
            severity: self.severity,
            additional_data: self.additional_data,
        })
    }
}

/// Remote sink that durably creates error records.
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Submits `record` via the create call at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the call could not be encoded or failed.
    async fn create(&self, target: &LoggingConfig, record: &IncidentRecord) -> Result<(), BusError>;
}

/// Failure to record an incident.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    /// The create call failed on the bus.
    #[error("error in invoking D-Bus logging create interface")]
    CreateCall {
        /// Logging object path.
        path: String,
        /// Create interface.
        interface: String,
        /// Underlying remote-call failure.
        #[source]
        source: BusError,
    },

    /// The record could not be built.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A local failure while preparing the call, returned unchanged.
    #[error(transparent)]
    Bus(BusError),
}

/// Builds and submits the `HostNotRunning` incident.
#[derive(Debug)]
pub struct IncidentReporter<K> {
    sink: K,
    target: LoggingConfig,
}

impl<K: IncidentSink> IncidentReporter<K> {
    /// Creates a reporter submitting to `sink` at `target`.
    #[must_use]
    pub const fn new(sink: K, target: LoggingConfig) -> Self {
        Self { sink, target }
    }

    /// Records that the host is not running after the BMC restart.
    ///
    /// The record carries this process's id under `_PID`.
    ///
    /// # Errors
    ///
    /// [`ReportError::CreateCall`] for a failed remote call; any other
    /// failure is returned as-is.
    pub async fn report_host_not_running(&self) -> Result<(), ReportError> {
        let pid = nix::unistd::getpid().as_raw();
        let record = IncidentRecord::host_not_running(pid).map_err(|e| {
            error!(error = %e, "D-Bus call exception");
            ReportError::Record(e)
        })?;
        self.submit(&record).await
    }

    /// Submits an already-built record.
    ///
    /// # Errors
    ///
    /// See [`Self::report_host_not_running`].
    pub async fn submit(&self, record: &IncidentRecord) -> Result<(), ReportError> {
        match self.sink.create(&self.target, record).await {
            Ok(()) => {
                info!(
                    message = record.message(),
                    severity = %record.severity(),
                    "Created host not running error log"
                );
                Ok(())
            },
            Err(source) if source.is_remote_call() => {
                error!(
                    path = %self.target.object_path,
                    interface = %self.target.interface,
                    error = %source,
                    "D-Bus logging create call failed"
                );
                Err(ReportError::CreateCall {
                    path: self.target.object_path.clone(),
                    interface: self.target.interface.clone(),
                    source,
                })
            },
            Err(other) => {
                error!(error = %other, "D-Bus call exception");
                Err(ReportError::Bus(other))
            },
        }
    }
}
