//! Bluetooth Module
//!
//! Link to the NXT brick over Bluetooth RFCOMM.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     RemoteService                        │
//! │  (background scan/bind, synchronous command sending)     │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Connection                          │
//! │        (state machine, owns at most one Transport)       │
//! └─────────┬───────────────────────────────┬───────────────┘
//!           │                               │
//!           ▼                               ▼
//! ┌──────────────────┐              ┌────────────────┐
//! │ DeviceDiscovery  │              │   Transport    │
//! │ - inquiry        │              │ - write_all    │
//! │ - name lookup    │              │ - close        │
//! └────────┬─────────┘              └───────┬────────┘
//!          └──────────┬─────────────────────┘
//!                     ▼
//!            ┌──────────────────┐
//!            │ BluetoothBackend │  (BlueZ, or a test double)
//!            └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`telegram`] - Length-prefixed command frames
//! - [`protocol`] - Direct command encoders
//! - [`scanner`] - Device discovery
//! - [`connection`] - Connection state machine
//! - [`service`] - Background worker and event delivery
//! - [`error`] - Error taxonomy

pub mod connection;
pub mod error;
pub mod protocol;
pub mod scanner;
pub mod service;
pub mod telegram;

#[cfg(all(feature = "bluez", target_os = "linux"))]
pub mod bluez;

#[cfg(test)]
pub(crate) mod mock;

use crate::domain::models::DeviceAddress;
use error::{AdapterError, ConnectError, WriteError};
use std::time::Duration;

// Re-export main service for convenience
pub use connection::Connection;
pub use service::RemoteService;
pub use telegram::Telegram;

/// An open byte stream to one device
pub trait Transport: Send {
    /// Write the whole buffer, retrying short writes
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), WriteError>;

    /// Release the underlying connection; calling it again does nothing
    fn close(&mut self);
}

/// Local radio capability the link is built on
pub trait BluetoothBackend: Send + Sync {
    /// Addresses of devices answering an inquiry bounded by `timeout`
    fn inquiry(&self, timeout: Duration) -> Result<Vec<DeviceAddress>, AdapterError>;

    /// Human readable name of a device, if it answers in time
    fn resolve_name(&self, address: DeviceAddress, timeout: Duration) -> Option<String>;

    /// Open a stream to `address` on the given RFCOMM channel
    fn connect(
        &self,
        address: DeviceAddress,
        channel: u8,
    ) -> Result<Box<dyn Transport>, ConnectError>;
}
