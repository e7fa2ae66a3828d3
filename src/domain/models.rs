use crate::infrastructure::bluetooth::error::{ConnectError, ScanError, SendError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name shown when a device does not answer name resolution
pub const UNKNOWN_DEVICE_NAME: &str = "unknown";

/// Length of an address rendered as `XX:XX:XX:XX:XX:XX`
pub const ADDRESS_TEXT_LEN: usize = 17;

/// 6-byte Bluetooth hardware address, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub [u8; 6]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Bluetooth address: {0:?}")]
pub struct AddressParseError(pub String);

impl DeviceAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| AddressParseError(s.to_string()))?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| AddressParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError(s.to_string()));
        }
        Ok(Self(octets))
    }
}

/// One device answering an inquiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub address: DeviceAddress,
    pub name: String,
}

impl DeviceRecord {
    pub fn new(address: DeviceAddress, name: Option<String>) -> Self {
        Self {
            address,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string()),
        }
    }

    /// Recover the address from a line rendered by `Display`
    pub fn address_from_line(line: &str) -> Option<DeviceAddress> {
        line.get(..ADDRESS_TEXT_LEN)?.parse().ok()
    }
}

/// Rendered as `00:16:53:0A:1B:2C  [NXT]`
impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  [{}]", self.address, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Scanning,
    Connecting,
    Connected { address: DeviceAddress },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Scanning => write!(f, "scanning"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected { address } => write!(f, "connected to {}", address),
        }
    }
}

/// Messages delivered from background work to the front end
#[derive(Debug, Clone)]
pub enum AppEvent {
    ScanFinished(Result<Vec<DeviceRecord>, ScanError>),
    BindFinished {
        address: DeviceAddress,
        result: Result<(), ConnectError>,
    },
    /// A send failed and the link was dropped
    ConnectionLost(SendError),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
