//! Connection Module
//!
//! State machine around discovery and the single live transport.

use crate::domain::models::{ConnectionState, DeviceAddress, DeviceRecord};
use crate::infrastructure::bluetooth::error::{ConnectError, ScanError, SendError, UnbindError};
use crate::infrastructure::bluetooth::protocol::RFCOMM_CHANNEL;
use crate::infrastructure::bluetooth::scanner::{
    DeviceDiscovery, DEFAULT_INQUIRY_TIMEOUT, DEFAULT_NAME_TIMEOUT,
};
use crate::infrastructure::bluetooth::telegram::Telegram;
use crate::infrastructure::bluetooth::{BluetoothBackend, Transport};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Upper bound of the radio inquiry
    pub inquiry_timeout: Duration,
    /// Per-device name resolution timeout
    pub name_timeout: Duration,
    /// RFCOMM channel of the brick
    pub channel: u8,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            inquiry_timeout: DEFAULT_INQUIRY_TIMEOUT,
            name_timeout: DEFAULT_NAME_TIMEOUT,
            channel: RFCOMM_CHANNEL,
        }
    }
}

enum Link {
    Disconnected,
    Scanning,
    Connecting,
    Connected {
        address: DeviceAddress,
        transport: Box<dyn Transport>,
    },
}

impl Link {
    fn state(&self) -> ConnectionState {
        match self {
            Link::Disconnected => ConnectionState::Disconnected,
            Link::Scanning => ConnectionState::Scanning,
            Link::Connecting => ConnectionState::Connecting,
            Link::Connected { address, .. } => ConnectionState::Connected { address: *address },
        }
    }
}

/// Link to a single brick
///
/// All transitions go through one mutex. Long operations (inquiry, connect)
/// publish their intermediate state and release the lock while they run, so
/// other callers see `Scanning`/`Connecting` and get a `Busy` error instead of
/// blocking.
pub struct Connection {
    backend: Arc<dyn BluetoothBackend>,
    discovery: DeviceDiscovery,
    config: ConnectionConfig,
    link: Mutex<Link>,
}

impl Connection {
    pub fn new(backend: Arc<dyn BluetoothBackend>, config: ConnectionConfig) -> Self {
        Self {
            discovery: DeviceDiscovery::new(backend.clone(), config.name_timeout),
            backend,
            config,
            link: Mutex::new(Link::Disconnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Look for nearby devices; only valid while disconnected
    pub fn scan(&self) -> Result<Vec<DeviceRecord>, ScanError> {
        {
            let mut link = self.lock();
            if !matches!(*link, Link::Disconnected) {
                return Err(ScanError::Busy(link.state()));
            }
            *link = Link::Scanning;
        }

        let result = self.discovery.scan(self.config.inquiry_timeout);

        *self.lock() = Link::Disconnected;
        result
    }

    /// Open the link to `address`; only valid while disconnected
    pub fn bind(&self, address: DeviceAddress) -> Result<(), ConnectError> {
        {
            let mut link = self.lock();
            if !matches!(*link, Link::Disconnected) {
                return Err(ConnectError::Busy(link.state()));
            }
            *link = Link::Connecting;
        }

        info!("Connecting to {} (channel {})", address, self.config.channel);
        let result = self.backend.connect(address, self.config.channel);

        let mut link = self.lock();
        match result {
            Ok(transport) => {
                info!("Connected to {}", address);
                *link = Link::Connected { address, transport };
                Ok(())
            }
            Err(e) => {
                error!("Connection to {} failed: {}", address, e);
                *link = Link::Disconnected;
                Err(e)
            }
        }
    }

    /// Write one frame to the brick
    ///
    /// A failed write drops the link; the frame is not retried.
    pub fn send(&self, telegram: &Telegram) -> Result<(), SendError> {
        let mut link = self.lock();
        let Link::Connected { address, transport } = &mut *link else {
            return Err(SendError::NotConnected);
        };

        debug!("-> {}: {:02X?}", address, telegram.as_bytes());
        if let Err(e) = transport.write_all(telegram.as_bytes()) {
            warn!("Write to {} failed, dropping connection: {}", address, e);
            transport.close();
            *link = Link::Disconnected;
            return Err(SendError::Write(e));
        }
        Ok(())
    }

    /// Close the link; does nothing when already disconnected
    pub fn unbind(&self) -> Result<(), UnbindError> {
        let mut link = self.lock();
        let state = link.state();
        match &mut *link {
            Link::Disconnected => return Ok(()),
            Link::Scanning | Link::Connecting => return Err(UnbindError::Busy(state)),
            Link::Connected { transport, .. } => transport.close(),
        }
        info!("Closed link ({})", state);
        *link = Link::Disconnected;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Link> {
        // Link is always left in a valid state, so a poisoned lock is usable
        self.link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.unbind();
    }
}
