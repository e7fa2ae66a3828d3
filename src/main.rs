use eframe::egui;
use nxt_remote_control::domain::recents::RecentConnections;
use nxt_remote_control::domain::settings::SettingsService;
use nxt_remote_control::infrastructure::bluetooth::bluez::BluezBackend;
use nxt_remote_control::infrastructure::logging::init_logger;
use nxt_remote_control::presentation::app::NxtRemoteApp;
use nxt_remote_control::presentation::labels::{EnglishLabels, Label, Labels};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let config_dir = SettingsService::get_config_dir()?;
    let settings = SettingsService::open(&config_dir)?;

    let logging_guard = init_logger(&settings.get().log_settings, &config_dir)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    tracing::info!("Starting NXT PC Remote Control");

    let backend = Arc::new(BluezBackend::new()?);
    let recents_path = RecentConnections::default_path(&config_dir);
    let labels = EnglishLabels;
    let title = labels.resolve(Label::WindowTitle).to_string();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 420.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(NxtRemoteApp::new(
                settings,
                backend,
                Box::new(labels),
                recents_path,
                logging_guard,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
