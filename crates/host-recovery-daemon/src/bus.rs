//! D-Bus adapters for the recovery check.
//!
//! [`HostStateClient`] reads `BootProgress` through
//! `org.freedesktop.DBus.Properties.Get`; [`LoggingClient`] calls
//! `xyz.openbmc_project.Logging.Create.Create`. Both share the single
//! system-bus connection opened at startup and translate zbus failures into
//! [`BusError`] via [`map_zbus_error`].

use std::collections::HashMap;

use async_trait::async_trait;
use host_recovery_core::config::{HostStateConfig, LoggingConfig};
use host_recovery_core::{BootProgressSource, BootProgressStage, BusError, IncidentRecord, IncidentSink};
use tracing::debug;
use zbus::Connection;
use zbus::zvariant::Value;

/// Standard properties interface.
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Method creating a logging entry.
pub const CREATE_METHOD: &str = "Create";

/// Reads the host boot progress from the host state service.
#[derive(Debug, Clone)]
pub struct HostStateClient {
    connection: Connection,
}

impl HostStateClient {
    /// Wraps an open bus connection.
    #[must_use]
    pub const fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl BootProgressSource for HostStateClient {
    async fn boot_progress(&self, target: &HostStateConfig) -> Result<BootProgressStage, BusError> {
        debug!(
            service = %target.service,
            path = %target.object_path,
            interface = %target.interface,
            property = %target.property,
            "reading boot progress"
        );

        let reply = self
            .connection
            .call_method(
                Some(target.service.as_str()),
                target.object_path.as_str(),
                Some(PROPERTIES_INTERFACE),
                "Get",
                &(target.interface.as_str(), target.property.as_str()),
            )
            .await
            .map_err(|e| map_zbus_error(&target.service, e))?;

        let body = reply.body();
        let value: Value<'_> = body.deserialize().map_err(|e| BusError::InvalidReply {
            detail: format!("failed to decode {} reply: {e}", target.property),
        })?;

        stage_from_value(value)
    }
}

/// Unwraps the variant returned by `Properties.Get` into a stage string.
fn stage_from_value(value: Value<'_>) -> Result<BootProgressStage, BusError> {
    match value {
        Value::Str(stage) => Ok(BootProgressStage::new(stage.as_str())),
        Value::Value(inner) => stage_from_value(*inner),
        other => Err(BusError::InvalidReply {
            detail: format!("expected string BootProgress, got signature {}", other.value_signature()),
        }),
    }
}

/// Creates incident records in the logging service.
#[derive(Debug, Clone)]
pub struct LoggingClient {
    connection: Connection,
}

impl LoggingClient {
    /// Wraps an open bus connection.
    #[must_use]
    pub const fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl IncidentSink for LoggingClient {
    async fn create(&self, target: &LoggingConfig, record: &IncidentRecord) -> Result<(), BusError> {
        let additional_data: HashMap<&str, &str> = record
            .additional_data()
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let severity = record.severity().to_wire();

        debug!(
            service = %target.service,
            path = %target.object_path,
            message = record.message(),
            severity = %severity,
            "creating error log"
        );

        // The reply carries no data this check needs; only success matters.
        self.connection
            .call_method(
                Some(target.service.as_str()),
                target.object_path.as_str(),
                Some(target.interface.as_str()),
                CREATE_METHOD,
                &(record.message(), severity.as_str(), additional_data),
            )
            .await
            .map_err(|e| map_zbus_error(&target.service, e))?;

        Ok(())
    }
}

/// Translates a zbus failure for a call to `service` into a [`BusError`].
#[must_use]
pub fn map_zbus_error(service: &str, err: zbus::Error) -> BusError {
    match err {
        zbus::Error::MethodError(name, detail, _) => {
            from_error_name(service, name.as_str(), detail.unwrap_or_default())
        },
        zbus::Error::FDO(fdo) => {
            use zbus::DBusError;

            let name = fdo.name().to_string();
            let detail = fdo.description().unwrap_or_default().to_string();
            from_error_name(service, &name, detail)
        },
        zbus::Error::InputOutput(io) => BusError::ServiceUnreachable {
            service: service.to_string(),
            detail: io.to_string(),
        },
        zbus::Error::Variant(e) => BusError::Encoding {
            detail: e.to_string(),
        },
        zbus::Error::Names(e) => BusError::Encoding {
            detail: e.to_string(),
        },
        other => BusError::CallFailed {
            name: "zbus".to_string(),
            detail: other.to_string(),
        },
    }
}

/// Classifies a D-Bus error reply by its error name.
#[must_use]
pub fn from_error_name(service: &str, name: &str, detail: String) -> BusError {
    let short = name
        .strip_prefix("org.freedesktop.DBus.Error.")
        .unwrap_or_default();
    match short {
        "ServiceUnknown" | "NameHasNoOwner" | "Disconnected" => BusError::ServiceUnreachable {
            service: service.to_string(),
            detail,
        },
        "UnknownObject" | "UnknownInterface" | "UnknownProperty" | "UnknownMethod"
        | "InvalidArgs" => BusError::NotFound {
            detail: format!("{name}: {detail}"),
        },
        "NoReply" | "Timeout" | "TimedOut" => BusError::Timeout {
            detail: format!("{name}: {detail}"),
        },
        _ => BusError::CallFailed {
            name: name.to_string(),
            detail,
        },
    }
}
