//! End-to-end pipeline tests with in-memory collaborators.
//!
//! Every remote interaction and marker removal is appended to a shared
//! journal so ordering between the stages can be asserted directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use host_recovery_core::config::{HostStateConfig, LoggingConfig, ReadinessConfig};
use host_recovery_core::incident::{HOST_NOT_RUNNING, PID_KEY};
use host_recovery_core::{
    BootProgressSource, BootProgressStage, BusError, FsMarker, IncidentRecord, IncidentSink,
    MarkerProbe, RecoveryCheck, RecoveryConfig, RecoveryError, RecoveryOutcome, ReportError,
    Severity,
};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    MarkerRemoved,
    PropertyRead,
    Created(IncidentRecord),
}

type Journal = Arc<Mutex<Vec<Event>>>;

struct FakeHostState {
    journal: Journal,
    reply: Result<BootProgressStage, BusError>,
}

#[async_trait]
impl BootProgressSource for FakeHostState {
    async fn boot_progress(&self, _target: &HostStateConfig) -> Result<BootProgressStage, BusError> {
        self.journal.lock().unwrap().push(Event::PropertyRead);
        self.reply.clone()
    }
}

struct FakeLogging {
    journal: Journal,
    fail_with: Option<BusError>,
}

#[async_trait]
impl IncidentSink for FakeLogging {
    async fn create(&self, _target: &LoggingConfig, record: &IncidentRecord) -> Result<(), BusError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.journal
            .lock()
            .unwrap()
            .push(Event::Created(record.clone()));
        Ok(())
    }
}

struct AbsentMarker;

impl MarkerProbe for AbsentMarker {
    fn is_present(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "absent".to_string()
    }
}

fn stage(short: &str) -> BootProgressStage {
    BootProgressStage::new(format!(
        "xyz.openbmc_project.State.Boot.Progress.ProgressStages.{short}"
    ))
}

fn check(
    journal: &Journal,
    reply: Result<BootProgressStage, BusError>,
    fail_create: Option<BusError>,
) -> RecoveryCheck<AbsentMarker, FakeHostState, FakeLogging> {
    RecoveryCheck::from_config(
        &RecoveryConfig::default(),
        AbsentMarker,
        FakeHostState {
            journal: Arc::clone(journal),
            reply,
        },
        FakeLogging {
            journal: Arc::clone(journal),
            fail_with: fail_create,
        },
    )
}

fn created(journal: &Journal) -> Vec<IncidentRecord> {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Created(record) => Some(record.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Classification outcomes
// =============================================================================

#[tokio::test]
async fn unspecified_stage_records_nothing() {
    let journal = Journal::default();
    let outcome = check(&journal, Ok(BootProgressStage::unspecified()), None)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RecoveryOutcome::HostIdle);
    assert_eq!(*journal.lock().unwrap(), vec![Event::PropertyRead]);
}

#[tokio::test]
async fn any_other_stage_records_exactly_one_incident() {
    for short in ["PrimaryProcInit", "OSStart", "OSRunning", "NotYetInvented"] {
        let journal = Journal::default();
        let outcome = check(&journal, Ok(stage(short)), None)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RecoveryOutcome::IncidentReported, "{short}");
        let records = created(&journal);
        assert_eq!(records.len(), 1, "{short}");
        assert_eq!(records[0].message(), HOST_NOT_RUNNING);
        assert_eq!(records[0].severity(), Severity::Error);
    }
}

#[tokio::test]
async fn incident_carries_reporting_pid() {
    let journal = Journal::default();
    check(&journal, Ok(stage("OSRunning")), None)
        .run()
        .await
        .unwrap();

    let records = created(&journal);
    let pid = records[0].additional_data().get(PID_KEY).cloned();
    assert_eq!(pid, Some(std::process::id().to_string()));
}

// =============================================================================
// Failure propagation
// =============================================================================

#[tokio::test]
async fn read_failure_skips_incident_submission() {
    let journal = Journal::default();
    let failure = BusError::ServiceUnreachable {
        service: "xyz.openbmc_project.State.Host".to_string(),
        detail: "The name is not activatable".to_string(),
    };

    let err = check(&journal, Err(failure.clone()), None)
        .run()
        .await
        .unwrap_err();

    match err {
        RecoveryError::Classify(classify) => assert_eq!(classify.source, failure),
        other => panic!("expected classify error, got {other:?}"),
    }
    assert_eq!(*journal.lock().unwrap(), vec![Event::PropertyRead]);
}

#[tokio::test]
async fn create_failure_follows_positive_classification() {
    let journal = Journal::default();
    let failure = BusError::Timeout {
        detail: "no reply within 25s".to_string(),
    };

    let err = check(&journal, Ok(stage("OSRunning")), Some(failure.clone()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecoveryError::Report(ReportError::CreateCall { ref source, .. }) if *source == failure
    ));
    assert_eq!(*journal.lock().unwrap(), vec![Event::PropertyRead]);
}

// =============================================================================
// Repeat runs
// =============================================================================

#[tokio::test]
async fn repeated_runs_are_not_deduplicated() {
    let journal = Journal::default();
    for _ in 0..2 {
        check(&journal, Ok(stage("SystemSetup")), None)
            .run()
            .await
            .unwrap();
    }

    let records = created(&journal);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], records[1]);
}

// =============================================================================
// Readiness ordering
// =============================================================================

#[tokio::test]
async fn property_read_waits_for_marker_removal() {
    let dir = tempfile::tempdir().unwrap();
    let readiness = ReadinessConfig {
        marker_template: dir
            .path()
            .join("chassis@{instance}-on")
            .to_string_lossy()
            .into_owned(),
        instance: 0,
        poll_interval: Duration::from_millis(10),
    };
    let marker_path = readiness.marker_path();
    std::fs::write(&marker_path, b"").unwrap();

    let config = RecoveryConfig {
        readiness,
        ..RecoveryConfig::default()
    };
    let journal = Journal::default();
    let recovery = RecoveryCheck::from_config(
        &config,
        FsMarker::from_config(&config.readiness),
        FakeHostState {
            journal: Arc::clone(&journal),
            reply: Ok(stage("OSRunning")),
        },
        FakeLogging {
            journal: Arc::clone(&journal),
            fail_with: None,
        },
    );

    let remover = {
        let journal = Arc::clone(&journal);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            journal.lock().unwrap().push(Event::MarkerRemoved);
            std::fs::remove_file(&marker_path).unwrap();
        })
    };

    let outcome = recovery.run().await.unwrap();
    remover.await.unwrap();

    assert_eq!(outcome, RecoveryOutcome::IncidentReported);
    let events = journal.lock().unwrap();
    assert_eq!(events[0], Event::MarkerRemoved);
    assert_eq!(events[1], Event::PropertyRead);
    assert!(matches!(events[2], Event::Created(_)));
    assert_eq!(events.len(), 3);
}
