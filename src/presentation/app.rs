use crate::domain::input::{InputTranslator, KeyAction, KeyEvent, RemoteKey};
use crate::domain::models::{AppEvent, DeviceAddress, DeviceRecord, MessageSeverity, StatusMessage};
use crate::domain::recents::RecentConnections;
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::error::ScanError;
use crate::infrastructure::bluetooth::{BluetoothBackend, RemoteService};
use crate::infrastructure::logging::LoggingGuard;
use crate::presentation::components::Components;
use crate::presentation::keyboard::KeyboardState;
use crate::presentation::labels::{Label, Labels};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct NxtRemoteApp {
    // Services
    pub(crate) settings: SettingsService,
    pub(crate) service: RemoteService,
    pub(crate) events_rx: mpsc::UnboundedReceiver<AppEvent>,
    pub(crate) labels: Box<dyn Labels>,

    // Input
    pub(crate) translator: InputTranslator,
    pub(crate) keyboard: KeyboardState,

    // State
    pub(crate) busy: bool,
    pub(crate) devices: Vec<DeviceRecord>,
    pub(crate) selected: Option<usize>,
    pub(crate) pending_entry: Option<String>,
    pub(crate) status_message: Option<StatusMessage>,

    // Recent connections
    pub(crate) recents: RecentConnections,
    pub(crate) recents_path: PathBuf,

    // Logging guard
    pub(crate) _logging_guard: Option<LoggingGuard>,
}

impl NxtRemoteApp {
    pub fn new(
        settings: SettingsService,
        backend: Arc<dyn BluetoothBackend>,
        labels: Box<dyn Labels>,
        recents_path: PathBuf,
        logging_guard: Option<LoggingGuard>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let service = RemoteService::new(backend, settings.get().connection_config(), events_tx);
        let translator = InputTranslator::new(settings.get().power_levels());

        let recents = RecentConnections::load(&recents_path).unwrap_or_else(|e| {
            warn!("Could not load recent connections: {:#}", e);
            RecentConnections::default()
        });

        Self {
            settings,
            service,
            events_rx,
            labels,
            translator,
            keyboard: KeyboardState::default(),
            busy: false,
            devices: Vec::new(),
            selected: None,
            pending_entry: None,
            status_message: None,
            recents,
            recents_path,
            _logging_guard: logging_guard,
        }
    }

    fn label(&self, label: Label) -> String {
        self.labels.resolve(label).to_string()
    }

    fn set_status(&mut self, label: Label, severity: MessageSeverity) {
        self.status_message = Some(StatusMessage {
            message: self.label(label),
            severity,
        });
    }

    fn start_scan(&mut self) {
        self.devices.clear();
        self.selected = None;
        match self.service.start_scan() {
            Ok(()) => {
                self.busy = true;
                self.set_status(Label::Searching, MessageSeverity::Info);
            }
            Err(e) => error!("Failed to start scan: {:#}", e),
        }
    }

    fn start_bind(&mut self, address: DeviceAddress, entry: String) {
        match self.service.start_bind(address) {
            Ok(()) => {
                self.busy = true;
                self.pending_entry = Some(entry);
            }
            Err(e) => error!("Failed to start connection: {:#}", e),
        }
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.service.disconnect() {
            warn!("Disconnect refused: {}", e);
        }
    }

    fn save_recents(&self) {
        if let Err(e) = self.recents.save(&self.recents_path) {
            error!("Failed to save recent connections: {:#}", e);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScanFinished(result) => {
                self.busy = false;
                match result {
                    Ok(records) => {
                        self.selected = (!records.is_empty()).then_some(0);
                        self.devices = records;
                        self.status_message = None;
                    }
                    Err(ScanError::AdapterDisabled) => {
                        self.set_status(Label::BluetoothDisabled, MessageSeverity::Error)
                    }
                    Err(ScanError::NoDevicesFound) => {
                        self.set_status(Label::NoDevicesNearby, MessageSeverity::Warning)
                    }
                    Err(ScanError::Inquiry(cause)) => {
                        warn!("Inquiry failed: {}", cause);
                        self.set_status(Label::SearchFailed, MessageSeverity::Error)
                    }
                    Err(e @ ScanError::Busy(_)) => warn!("Scan rejected: {}", e),
                }
            }
            AppEvent::BindFinished { address, result } => {
                self.busy = false;
                let entry = self.pending_entry.take();
                match result {
                    Ok(()) => {
                        info!("Connected to {}", address);
                        self.status_message = Some(StatusMessage {
                            message: format!("{} {}", self.label(Label::Connected), address),
                            severity: MessageSeverity::Success,
                        });
                        if self.recents.add(entry.unwrap_or_else(|| address.to_string())) {
                            self.save_recents();
                        }
                    }
                    Err(e) => {
                        warn!("Connection to {} failed: {}", address, e);
                        self.set_status(Label::DeviceUnavailable, MessageSeverity::Error);
                    }
                }
            }
            AppEvent::ConnectionLost(_) => {
                self.set_status(Label::ConnectionLost, MessageSeverity::Error);
            }
            AppEvent::LogMessage(msg) => {
                if self.status_message.is_none() || msg.severity != MessageSeverity::Info {
                    self.status_message = Some(msg);
                }
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (events, modifiers) = ctx.input(|i| (i.events.clone(), i.modifiers));
        let mut keys = self.keyboard.collect(&events);
        keys.extend(self.keyboard.sync_modifiers(modifiers));

        // Keys only drive the brick while a link is up
        if !self.service.is_connected() {
            for key in keys {
                self.translator.handle_offline(key);
            }
            return;
        }

        for key in keys {
            let commands = self.translator.handle(key);
            if let Err(e) = self.service.send(&commands) {
                warn!("Dropped {:?}: {}", key, e);
                break;
            }
            if is_power_release(&key) {
                if let Err(e) = self.settings.update_power_levels(self.translator.levels()) {
                    error!("Failed to save power levels: {:#}", e);
                }
            }
        }
    }

    fn ui_connection_panel(&mut self, ui: &mut egui::Ui) {
        let connected = self.service.is_connected();
        let title = self.label(Label::WindowTitle);
        Components::card(ui, &title, |ui| {
            let (text, bg) = if connected {
                ("CONNECTED", egui::Color32::from_rgb(0, 200, 0))
            } else if self.busy {
                ("WORKING...", egui::Color32::from_rgb(255, 200, 0))
            } else {
                ("DISCONNECTED", egui::Color32::from_gray(100))
            };
            Components::status_banner(ui, text, bg, egui::Color32::BLACK);
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                let enabled = !self.busy && !connected;
                if ui
                    .add_enabled(enabled, egui::Button::new(self.label(Label::Scan)))
                    .clicked()
                {
                    self.start_scan();
                }
                if self.busy {
                    ui.spinner();
                }

                let selected_text = self
                    .selected
                    .and_then(|i| self.devices.get(i))
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                ui.add_enabled_ui(enabled, |ui| {
                    egui::ComboBox::from_id_salt("devices")
                        .width(240.0)
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            for (i, device) in self.devices.iter().enumerate() {
                                ui.selectable_value(&mut self.selected, Some(i), device.to_string());
                            }
                        });
                });

                if connected {
                    if ui.button(self.label(Label::Disconnect)).clicked() {
                        self.disconnect();
                    }
                } else {
                    let target = self.selected.and_then(|i| self.devices.get(i)).cloned();
                    let can_bind = enabled && target.is_some();
                    if ui
                        .add_enabled(can_bind, egui::Button::new(self.label(Label::Connect)))
                        .clicked()
                    {
                        if let Some(device) = target {
                            self.start_bind(device.address, device.to_string());
                        }
                    }
                }
            });
        });
    }

    fn ui_recents_panel(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.busy && !self.service.is_connected();
        let title = self.label(Label::RecentConnections);
        let clear_text = self.label(Label::ClearConnections);
        let mut chosen = None;
        let mut clear = false;
        Components::card(ui, &title, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                for entry in self.recents.entries() {
                    if ui.button(entry).clicked() {
                        chosen = Some(entry.clone());
                    }
                }
                clear = ui.small_button(clear_text).clicked();
            });
        });

        if clear {
            self.recents.clear();
            self.save_recents();
        }
        if let Some(entry) = chosen {
            if let Some(address) = DeviceRecord::address_from_line(&entry) {
                self.start_bind(address, entry);
            }
        }
    }

    fn ui_power_panel(&mut self, ui: &mut egui::Ui) {
        let levels = self.translator.levels();
        let precision = self.translator.precision();
        Components::card(ui, &self.label(Label::NormalPower), |ui| {
            Components::power_gauge(ui, &self.label(Label::NormalPower), levels.normal(), !precision);
            Components::power_gauge(
                ui,
                &self.label(Label::PrecisionPower),
                levels.precision(),
                precision,
            );
            ui.small(self.label(Label::KeyHelp));
        });
    }

    fn ui_status(&self, ui: &mut egui::Ui) {
        if let Some(msg) = &self.status_message {
            let color = match msg.severity {
                MessageSeverity::Info => egui::Color32::BLUE,
                MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                MessageSeverity::Error => egui::Color32::RED,
            };
            ui.label(egui::RichText::new(&msg.message).color(color).strong());
        }
    }
}

fn is_power_release(key: &KeyEvent) -> bool {
    key.action == KeyAction::Release && matches!(key.key, RemoteKey::PowerUp | RemoteKey::PowerDown)
}

impl eframe::App for NxtRemoteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        self.handle_keys(ctx);

        if self.busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui_connection_panel(ui);
            ui.add_space(8.0);
            self.ui_power_panel(ui);
            ui.add_space(8.0);
            self.ui_recents_panel(ui);
            ui.add_space(8.0);
            self.ui_status(ui);
        });
    }
}
