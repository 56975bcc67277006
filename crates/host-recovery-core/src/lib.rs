//! host-recovery-core - Host reset recovery decision protocol
//!
//! After the BMC restarts, the managed host may have been in the middle of
//! booting. This crate decides whether that happened and, if so, records a
//! `HostNotRunning` incident so that higher-level recovery can quiesce the
//! host.
//!
//! The protocol is a linear pipeline executed once per process lifetime:
//!
//! ```text
//! ReadinessGate ──► BootStateClassifier ──► IncidentReporter
//!  (marker gone)     (BootProgress read)     (only when booting)
//! ```
//!
//! Nothing here talks to a bus directly. The remote collaborators are the
//! [`boot_progress::BootProgressSource`] and [`incident::IncidentSink`]
//! traits, and the marker check is [`readiness::MarkerProbe`]. The daemon
//! crate provides D-Bus implementations; tests provide in-memory fakes.
//!
//! # Modules
//!
//! - [`bus`]: Remote-call error taxonomy shared by both collaborators
//! - [`config`]: Addressing constants and polling configuration
//! - [`readiness`]: Chassis power-on completion gate
//! - [`boot_progress`]: Boot-progress read and classification
//! - [`incident`]: Incident record construction and submission
//! - [`recovery`]: The single-shot pipeline tying the stages together

pub mod boot_progress;
pub mod bus;
pub mod config;
pub mod incident;
pub mod readiness;
pub mod recovery;

pub use boot_progress::{BootProgressSource, BootProgressStage, BootStateClassifier, ClassifyError};
pub use bus::BusError;
pub use config::{ConfigError, RecoveryConfig};
pub use incident::{
    IncidentRecord, IncidentRecordBuilder, IncidentReporter, IncidentSink, RecordError, ReportError,
    Severity,
};
pub use readiness::{FsMarker, MarkerProbe, ReadinessGate};
pub use recovery::{RecoveryCheck, RecoveryError, RecoveryOutcome};
