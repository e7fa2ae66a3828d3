//! Device Discovery Module
//!
//! Runs an inquiry and resolves names for whoever answered.

use crate::domain::models::{DeviceAddress, DeviceRecord};
use crate::infrastructure::bluetooth::error::ScanError;
use crate::infrastructure::bluetooth::BluetoothBackend;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 8 inquiry units of 1.28 s
pub const DEFAULT_INQUIRY_TIMEOUT: Duration = Duration::from_millis(10_240);

pub const DEFAULT_NAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery of nearby devices
pub struct DeviceDiscovery {
    backend: Arc<dyn BluetoothBackend>,
    name_timeout: Duration,
}

impl DeviceDiscovery {
    pub fn new(backend: Arc<dyn BluetoothBackend>, name_timeout: Duration) -> Self {
        Self {
            backend,
            name_timeout,
        }
    }

    /// Scan for devices
    ///
    /// Name resolution is best effort: a device that does not answer keeps
    /// its address and is listed as "unknown".
    pub fn scan(&self, timeout: Duration) -> Result<Vec<DeviceRecord>, ScanError> {
        info!("Starting inquiry ({:?})", timeout);

        let addresses = self.backend.inquiry(timeout).map_err(|e| {
            error!("Inquiry failed: {}", e);
            ScanError::from(e)
        })?;

        if addresses.is_empty() {
            info!("Inquiry finished without responders");
            return Err(ScanError::NoDevicesFound);
        }

        let records: Vec<DeviceRecord> = addresses
            .into_iter()
            .map(|address| {
                let name = self.backend.resolve_name(address, self.name_timeout);
                if name.is_none() {
                    warn!("Could not resolve name of {}", address);
                }
                DeviceRecord::new(address, name)
            })
            .collect();

        info!("Found {} device(s)", records.len());
        Ok(records)
    }
}

/// Addresses that actually answered during one discovery session
///
/// A discovery session replays every device the adapter already knew
/// (`known`, taken before the session started) alongside real responders.
/// Known devices only count when they showed fresh presence in this session
/// (`present`). Order of first report is kept, duplicates are dropped.
pub fn fresh_responders(
    reported: &[DeviceAddress],
    known: &[DeviceAddress],
    present: &[DeviceAddress],
) -> Vec<DeviceAddress> {
    let mut responders = Vec::new();
    for address in reported {
        if responders.contains(address) {
            continue;
        }
        if known.contains(address) && !present.contains(address) {
            debug!("Ignoring cached device {}", address);
            continue;
        }
        responders.push(*address);
    }
    responders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UNKNOWN_DEVICE_NAME;
    use crate::infrastructure::bluetooth::error::AdapterError;
    use crate::infrastructure::bluetooth::mock::MockBackend;

    fn discovery(backend: &Arc<MockBackend>) -> DeviceDiscovery {
        DeviceDiscovery::new(backend.clone(), DEFAULT_NAME_TIMEOUT)
    }

    #[test]
    fn test_zero_responders() {
        let backend = Arc::new(MockBackend::new());
        let result = discovery(&backend).scan(DEFAULT_INQUIRY_TIMEOUT);
        assert_eq!(result, Err(ScanError::NoDevicesFound));
    }

    #[test]
    fn test_adapter_disabled_returns_no_records() {
        let backend = Arc::new(MockBackend::new());
        backend.add_device(DeviceAddress([1, 2, 3, 4, 5, 6]), Some("NXT"));
        backend.set_adapter_present(false);

        let result = discovery(&backend).scan(DEFAULT_INQUIRY_TIMEOUT);
        assert_eq!(result, Err(ScanError::AdapterDisabled));
    }

    #[test]
    fn test_failed_name_lookup_degrades_single_record() {
        let backend = Arc::new(MockBackend::new());
        let named = DeviceAddress([0, 0x16, 0x53, 0, 0, 1]);
        let silent = DeviceAddress([0, 0x16, 0x53, 0, 0, 2]);
        backend.add_device(named, Some("NXT"));
        backend.add_device(silent, None);

        let records = discovery(&backend).scan(DEFAULT_INQUIRY_TIMEOUT).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, named);
        assert_eq!(records[0].name, "NXT");
        assert_eq!(records[1].address, silent);
        assert_eq!(records[1].name, UNKNOWN_DEVICE_NAME);
    }

    #[test]
    fn test_every_scan_queries_the_radio() {
        let backend = Arc::new(MockBackend::new());
        let scanner = discovery(&backend);
        assert!(scanner.scan(DEFAULT_INQUIRY_TIMEOUT).is_err());

        backend.add_device(DeviceAddress([9, 9, 9, 9, 9, 9]), Some("NXT"));
        assert_eq!(scanner.scan(DEFAULT_INQUIRY_TIMEOUT).unwrap().len(), 1);
        assert_eq!(backend.inquiry_count(), 2);
    }

    #[test]
    fn test_inquiry_failure_is_not_reported_as_disabled_adapter() {
        let backend = Arc::new(MockBackend::new());
        backend.add_device(DeviceAddress([1, 2, 3, 4, 5, 6]), Some("NXT"));
        backend.set_inquiry_error(Some(AdapterError::Other(
            "org.bluez.Error.InProgress".to_string(),
        )));

        let result = discovery(&backend).scan(DEFAULT_INQUIRY_TIMEOUT);
        assert_eq!(
            result,
            Err(ScanError::Inquiry("org.bluez.Error.InProgress".to_string()))
        );

        backend.set_inquiry_error(None);
        assert_eq!(discovery(&backend).scan(DEFAULT_INQUIRY_TIMEOUT).unwrap().len(), 1);
    }

    #[test]
    fn test_cached_devices_without_presence_are_dropped() {
        let paired_off = DeviceAddress([0, 0x16, 0x53, 0, 0, 1]);
        let paired_on = DeviceAddress([0, 0x16, 0x53, 0, 0, 2]);
        let stranger = DeviceAddress([0, 0x16, 0x53, 0, 0, 3]);

        let reported = [paired_off, paired_on, stranger, paired_on];
        let known = [paired_off, paired_on];
        let present = [paired_on];

        assert_eq!(
            fresh_responders(&reported, &known, &present),
            vec![paired_on, stranger]
        );
    }

    #[test]
    fn test_only_cached_devices_means_nobody_answered() {
        let paired = DeviceAddress([0, 0x16, 0x53, 0, 0, 1]);
        assert!(fresh_responders(&[paired], &[paired], &[]).is_empty());
        assert!(fresh_responders(&[], &[paired], &[paired]).is_empty());
    }
}
