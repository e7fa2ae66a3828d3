//! Remote Service Module
//!
//! Front-end facing API. Scan and bind run on their own worker thread and
//! report back through the event channel; motor commands are sent inline so
//! their order is never disturbed.

use crate::domain::models::{AppEvent, DeviceAddress, MessageSeverity, StatusMessage};
use crate::infrastructure::bluetooth::connection::{Connection, ConnectionConfig};
use crate::infrastructure::bluetooth::error::{SendError, UnbindError};
use crate::infrastructure::bluetooth::protocol::DirectCommand;
use crate::infrastructure::bluetooth::BluetoothBackend;
use anyhow::Result;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info};

pub struct RemoteService {
    connection: Arc<Connection>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl RemoteService {
    pub fn new(
        backend: Arc<dyn BluetoothBackend>,
        config: ConnectionConfig,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            connection: Arc::new(Connection::new(backend, config)),
            event_sender,
        }
    }

    /// Start a scan in the background; the result arrives as
    /// [`AppEvent::ScanFinished`]
    pub fn start_scan(&self) -> Result<()> {
        let connection = self.connection.clone();
        let sender = self.event_sender.clone();

        self.send_log("Searching for devices...", MessageSeverity::Info);
        thread::Builder::new()
            .name("nxt-scan".into())
            .spawn(move || {
                let result = connection.scan();
                let _ = sender.send(AppEvent::ScanFinished(result));
            })?;
        Ok(())
    }

    /// Connect in the background; the result arrives as
    /// [`AppEvent::BindFinished`]
    pub fn start_bind(&self, address: DeviceAddress) -> Result<()> {
        let connection = self.connection.clone();
        let sender = self.event_sender.clone();

        self.send_log(&format!("Connecting to {}...", address), MessageSeverity::Info);
        thread::Builder::new()
            .name("nxt-bind".into())
            .spawn(move || {
                let result = connection.bind(address);
                let _ = sender.send(AppEvent::BindFinished { address, result });
            })?;
        Ok(())
    }

    /// Send commands in order, stopping at the first failure
    ///
    /// A failure has already dropped the link; it is also reported as
    /// [`AppEvent::ConnectionLost`] unless the link was simply not up.
    pub fn send(&self, commands: &[DirectCommand]) -> Result<(), SendError> {
        for command in commands {
            if let Err(e) = self.connection.send(&command.to_telegram()) {
                if let SendError::Write(_) = e {
                    error!("Lost connection: {}", e);
                    let _ = self.event_sender.send(AppEvent::ConnectionLost(e.clone()));
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Disconnect from the brick
    pub fn disconnect(&self) -> Result<(), UnbindError> {
        let was_connected = self.connection.is_connected();
        self.connection.unbind()?;
        if was_connected {
            info!("Disconnected from device");
            self.send_log("Disconnected from device", MessageSeverity::Info);
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Send a log message
    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
