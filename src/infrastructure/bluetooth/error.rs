//! Error types for the brick link
//!
//! Each operation gets its own enum so callers can tell apart the outcomes
//! the user has to see differently (no radio vs. nobody in range, etc.).

use crate::domain::models::ConnectionState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelegramError {
    #[error("telegram body of {requested} bytes exceeds the {max} byte limit")]
    TooLong { requested: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Bluetooth adapter is disabled or missing")]
    AdapterDisabled,
    #[error("no devices found nearby")]
    NoDevicesFound,
    /// The radio is up but the inquiry itself failed
    #[error("inquiry failed: {0}")]
    Inquiry(String),
    #[error("cannot scan while {0}")]
    Busy(ConnectionState),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,
    #[error("device unreachable: {0}")]
    Unreachable(String),
    #[error("cannot connect while {0}")]
    Busy(ConnectionState),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("not connected")]
    NotConnected,
    #[error("write failed: {0}")]
    Write(#[from] WriteError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnbindError {
    #[error("cannot disconnect while {0}")]
    Busy(ConnectionState),
}

/// Raised by the radio backend itself, before it is mapped onto an
/// operation-level error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("adapter unavailable")]
    Unavailable,
    #[error("adapter error: {0}")]
    Other(String),
}

impl From<AdapterError> for ScanError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::Unavailable => ScanError::AdapterDisabled,
            AdapterError::Other(cause) => ScanError::Inquiry(cause),
        }
    }
}
