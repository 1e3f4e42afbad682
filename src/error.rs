//! Domain error types
//!
//! None of these are fatal: the poll loop demotes backend errors to "no state
//! this tick" and the host reports remote errors as a status line.

use thiserror::Error;

/// Errors raised by a controller backend during a single poll
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No controller reachable through this backend
    #[error("device absent")]
    DeviceAbsent,

    /// One bad read (USB drop, Bluetooth sleep, acquisition lost)
    #[error("transient poll failure: {0}")]
    TransientPollFailure(String),

    /// The native library behind the backend could not be loaded
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised when editing the rule set
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("unknown mapping entry: {0}")]
    UnknownEntry(String),

    #[error("entry '{entry}' is not a {expected} rule")]
    WrongRuleKind {
        entry: String,
        expected: &'static str,
    },

    #[error("invalid binding for '{entry}': {reason}")]
    InvalidBinding { entry: String, reason: String },
}

/// Errors raised by the remote-control listener
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Requested port unavailable; the remote feature stays disabled
    #[error("failed to bind remote listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
