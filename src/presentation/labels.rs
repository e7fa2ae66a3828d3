//! UI strings
//!
//! The front end asks a [`Labels`] implementation for every visible string;
//! the core never formats user-facing text itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    WindowTitle,
    Scan,
    Connect,
    Disconnect,
    Connected,
    RecentConnections,
    ClearConnections,
    Searching,
    BluetoothDisabled,
    NoDevicesNearby,
    SearchFailed,
    DeviceUnavailable,
    ConnectionLost,
    NormalPower,
    PrecisionPower,
    KeyHelp,
}

pub trait Labels {
    fn resolve(&self, label: Label) -> &str;
}

pub struct EnglishLabels;

impl Labels for EnglishLabels {
    fn resolve(&self, label: Label) -> &str {
        match label {
            Label::WindowTitle => "NXT PC Remote Control",
            Label::Scan => "Scan",
            Label::Connect => "Connect",
            Label::Disconnect => "Disconnect",
            Label::Connected => "Connected to",
            Label::RecentConnections => "Recent connections",
            Label::ClearConnections => "Clean connections",
            Label::Searching => "Searching for devices...",
            Label::BluetoothDisabled => "Bluetooth disabled",
            Label::NoDevicesNearby => "There are no devices nearby",
            Label::SearchFailed => "Search for devices failed",
            Label::DeviceUnavailable => "Device isn't available",
            Label::ConnectionLost => "Connection lost",
            Label::NormalPower => "Power",
            Label::PrecisionPower => "Precision power",
            Label::KeyHelp => "Arrows drive, N/M port A, B beep, Alt precision, +/- power",
        }
    }
}
