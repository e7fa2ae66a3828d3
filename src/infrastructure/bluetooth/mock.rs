//! In-memory radio used by the unit tests

use crate::domain::models::DeviceAddress;
use crate::infrastructure::bluetooth::error::{AdapterError, ConnectError, WriteError};
use crate::infrastructure::bluetooth::{BluetoothBackend, Transport};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frames written by every transport of one backend, plus write failure switch
#[derive(Default)]
pub struct Wire {
    frames: Mutex<Vec<Vec<u8>>>,
    fail_writes: AtomicBool,
    closes: AtomicUsize,
}

impl Wire {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct MockTransport {
    wire: Arc<Wire>,
    open: bool,
}

impl Transport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        if !self.open || self.wire.fail_writes.load(Ordering::SeqCst) {
            return Err(WriteError::Closed);
        }
        self.wire.frames.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.wire.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct MockBackend {
    devices: Mutex<Vec<(DeviceAddress, Option<String>)>>,
    adapter_present: AtomicBool,
    refuse_connect: AtomicBool,
    inquiries: AtomicUsize,
    connects: AtomicUsize,
    inquiry_gate: Mutex<Option<Receiver<()>>>,
    connect_gate: Mutex<Option<Receiver<()>>>,
    inquiry_error: Mutex<Option<AdapterError>>,
    wire: Arc<Wire>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
            adapter_present: AtomicBool::new(true),
            refuse_connect: AtomicBool::new(false),
            inquiries: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            inquiry_gate: Mutex::new(None),
            connect_gate: Mutex::new(None),
            inquiry_error: Mutex::new(None),
            wire: Arc::new(Wire::default()),
        }
    }

    pub fn add_device(&self, address: DeviceAddress, name: Option<&str>) {
        self.devices
            .lock()
            .unwrap()
            .push((address, name.map(str::to_string)));
    }

    pub fn set_adapter_present(&self, present: bool) {
        self.adapter_present.store(present, Ordering::SeqCst);
    }

    pub fn set_refuse_connect(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.wire.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next inquiry block until the returned sender fires
    pub fn hold_next_inquiry(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.inquiry_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Make the next connect block until the returned sender fires
    pub fn hold_next_connect(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.connect_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Fail inquiries with `error` while the adapter stays present
    pub fn set_inquiry_error(&self, error: Option<AdapterError>) {
        *self.inquiry_error.lock().unwrap() = error;
    }

    pub fn inquiry_count(&self) -> usize {
        self.inquiries.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn wire(&self) -> Arc<Wire> {
        self.wire.clone()
    }
}

impl BluetoothBackend for MockBackend {
    fn inquiry(&self, _timeout: Duration) -> Result<Vec<DeviceAddress>, AdapterError> {
        self.inquiries.fetch_add(1, Ordering::SeqCst);
        let gate = self.inquiry_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        if !self.adapter_present.load(Ordering::SeqCst) {
            return Err(AdapterError::Unavailable);
        }
        if let Some(error) = self.inquiry_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.devices.lock().unwrap().iter().map(|(a, _)| *a).collect())
    }

    fn resolve_name(&self, address: DeviceAddress, _timeout: Duration) -> Option<String> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|(a, _)| *a == address)
            .and_then(|(_, name)| name.clone())
    }

    fn connect(
        &self,
        address: DeviceAddress,
        _channel: u8,
    ) -> Result<Box<dyn Transport>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let gate = self.connect_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        if !self.adapter_present.load(Ordering::SeqCst) {
            return Err(ConnectError::AdapterUnavailable);
        }
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(ConnectError::Unreachable(format!("{} refused", address)));
        }
        Ok(Box::new(MockTransport {
            wire: self.wire.clone(),
            open: true,
        }))
    }
}
