//! host-recovery-daemon - D-Bus side of the host reset recovery check
//!
//! Provides the zbus implementations of the remote collaborators consumed by
//! [`host_recovery_core::RecoveryCheck`]. The `host-reset-recovery` binary
//! wires them to a single system-bus connection and runs the check once.
//!
//! # Modules
//!
//! - [`bus`]: Host state and logging clients plus zbus error mapping

pub mod bus;
