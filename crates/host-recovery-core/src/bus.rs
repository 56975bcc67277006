//! Remote-call error taxonomy.
//!
//! Both remote collaborators (the host state service and the logging
//! service) report failures through [`BusError`]. Adapters translate their
//! transport-specific errors into these variants so the pipeline can decide
//! how to log and propagate them without knowing which bus implementation
//! is in use.

use thiserror::Error;

/// Errors returned by a remote collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BusError {
    /// The addressed service is not on the bus, or the bus itself is gone.
    #[error("service unreachable: {service}: {detail}")]
    ServiceUnreachable {
        /// Service name that could not be reached.
        service: String,
        /// Human-readable detail from the transport.
        detail: String,
    },

    /// The object, interface, property or method does not exist.
    #[error("not found: {detail}")]
    NotFound {
        /// Human-readable detail from the remote side.
        detail: String,
    },

    /// The remote side did not answer in time.
    #[error("call timed out: {detail}")]
    Timeout {
        /// Human-readable detail from the transport.
        detail: String,
    },

    /// The remote method returned an error reply.
    #[error("call failed: {name}: {detail}")]
    CallFailed {
        /// Error name carried by the reply.
        name: String,
        /// Error message carried by the reply.
        detail: String,
    },

    /// The reply arrived but did not have the expected shape.
    #[error("invalid reply: {detail}")]
    InvalidReply {
        /// What was wrong with the reply.
        detail: String,
    },

    /// The request arguments could not be encoded locally.
    #[error("failed to encode call arguments: {detail}")]
    Encoding {
        /// Encoder message.
        detail: String,
    },
}

impl BusError {
    /// Returns `true` when the failure happened on the remote call itself,
    /// as opposed to local preparation of the request.
    #[must_use]
    pub const fn is_remote_call(&self) -> bool {
        !matches!(self, Self::Encoding { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_the_only_local_failure() {
        let remote = [
            BusError::ServiceUnreachable {
                service: "svc".into(),
                detail: "gone".into(),
            },
            BusError::NotFound {
                detail: "no object".into(),
            },
            BusError::Timeout {
                detail: "25s".into(),
            },
            BusError::CallFailed {
                name: "org.example.Error.Busy".into(),
                detail: "busy".into(),
            },
            BusError::InvalidReply {
                detail: "expected string".into(),
            },
        ];
        assert!(remote.iter().all(BusError::is_remote_call));

        let local = BusError::Encoding {
            detail: "bad signature".into(),
        };
        assert!(!local.is_remote_call());
    }

    #[test]
    fn display_carries_service_name() {
        let err = BusError::ServiceUnreachable {
            service: "xyz.openbmc_project.State.Host".into(),
            detail: "name has no owner".into(),
        };
        assert_eq!(
            err.to_string(),
            "service unreachable: xyz.openbmc_project.State.Host: name has no owner"
        );
    }
}
