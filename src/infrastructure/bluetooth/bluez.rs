//! BlueZ Backend
//!
//! Classic Bluetooth inquiry and RFCOMM streams through `bluer`. The async
//! API runs on a private runtime so the rest of the crate stays blocking.

use crate::domain::models::DeviceAddress;
use crate::infrastructure::bluetooth::error::{AdapterError, ConnectError, WriteError};
use crate::infrastructure::bluetooth::scanner::fresh_responders;
use crate::infrastructure::bluetooth::{BluetoothBackend, Transport};
use anyhow::Result;
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::{AdapterEvent, ErrorKind};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Connect attempts give up after this long
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct BluezBackend {
    runtime: Arc<Runtime>,
}

impl BluezBackend {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("bluez")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    async fn adapter() -> Result<bluer::Adapter, AdapterError> {
        let session = bluer::Session::new().await.map_err(|e| {
            warn!("BlueZ session unavailable: {}", e);
            AdapterError::Unavailable
        })?;
        let adapter = session.default_adapter().await.map_err(|e| {
            warn!("No default adapter: {}", e);
            AdapterError::Unavailable
        })?;
        if !adapter.is_powered().await.map_err(map_error)? {
            info!("Adapter {} is powered off", adapter.name());
            return Err(AdapterError::Unavailable);
        }
        Ok(adapter)
    }

    async fn discover(timeout: Duration) -> Result<Vec<DeviceAddress>, AdapterError> {
        let adapter = Self::adapter().await?;
        adapter
            .set_discovery_filter(bluer::DiscoveryFilter {
                transport: bluer::DiscoveryTransport::BrEdr,
                ..Default::default()
            })
            .await
            .map_err(map_error)?;

        // The session replays these before any real inquiry response
        let known: Vec<DeviceAddress> = adapter
            .device_addresses()
            .await
            .map_err(map_error)?
            .into_iter()
            .map(|addr| DeviceAddress(addr.0))
            .collect();

        let mut events = Box::pin(adapter.discover_devices().await.map_err(map_error)?);
        let mut reported = Vec::new();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => match event {
                    Some(AdapterEvent::DeviceAdded(addr)) => {
                        let address = DeviceAddress(addr.0);
                        debug!("Device reported: {}", address);
                        reported.push(address);
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }

        // RSSI is only set for devices heard during the running session
        let mut present = Vec::new();
        for address in reported.iter().filter(|a| known.contains(*a)) {
            let Ok(device) = adapter.device(bluer::Address(address.octets())) else {
                continue;
            };
            if let Ok(Some(rssi)) = device.rssi().await {
                debug!("Cached device {} answered (RSSI {})", address, rssi);
                present.push(*address);
            }
        }

        // Dropping the stream ends discovery
        drop(events);
        Ok(fresh_responders(&reported, &known, &present))
    }

    async fn name_of(address: DeviceAddress) -> Option<String> {
        let adapter = Self::adapter().await.ok()?;
        let device = adapter.device(bluer::Address(address.octets())).ok()?;
        device.name().await.ok().flatten()
    }
}

impl BluetoothBackend for BluezBackend {
    fn inquiry(&self, timeout: Duration) -> Result<Vec<DeviceAddress>, AdapterError> {
        self.runtime.block_on(Self::discover(timeout))
    }

    fn resolve_name(&self, address: DeviceAddress, timeout: Duration) -> Option<String> {
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, Self::name_of(address)).await })
            .ok()
            .flatten()
    }

    fn connect(
        &self,
        address: DeviceAddress,
        channel: u8,
    ) -> Result<Box<dyn Transport>, ConnectError> {
        let target = SocketAddr::new(bluer::Address(address.octets()), channel);
        let stream = self.runtime.block_on(async {
            Self::adapter()
                .await
                .map_err(|_| ConnectError::AdapterUnavailable)?;
            match tokio::time::timeout(CONNECT_TIMEOUT, Stream::connect(target)).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(ConnectError::Unreachable(e.to_string())),
                Err(_) => Err(ConnectError::Unreachable("connect timed out".to_string())),
            }
        })?;

        Ok(Box::new(RfcommTransport {
            runtime: self.runtime.clone(),
            stream: Some(stream),
        }))
    }
}

/// RFCOMM stream to the brick
pub struct RfcommTransport {
    runtime: Arc<Runtime>,
    stream: Option<Stream>,
}

impl Transport for RfcommTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        let stream = self.stream.as_mut().ok_or(WriteError::Closed)?;
        self.runtime
            .block_on(async {
                stream.write_all(bytes).await?;
                stream.flush().await
            })
            .map_err(|e| {
                warn!("RFCOMM write failed: {}", e);
                WriteError::Closed
            })
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = self.runtime.block_on(stream.shutdown());
        }
    }
}

impl Drop for RfcommTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn map_error(e: bluer::Error) -> AdapterError {
    match e.kind {
        ErrorKind::NotReady | ErrorKind::NotAvailable | ErrorKind::NotFound => {
            AdapterError::Unavailable
        }
        _ => AdapterError::Other(e.to_string()),
    }
}
