use crate::domain::input::{PowerLevels, DEFAULT_NORMAL_POWER, DEFAULT_PRECISION_POWER};
use crate::infrastructure::bluetooth::connection::ConnectionConfig;
use crate::infrastructure::bluetooth::protocol::RFCOMM_CHANNEL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const APP_DIR: &str = "NxtRemoteControl";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_true")]
    pub show_thread_names: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_names: default_true(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "nxt_remote".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,

    // Power levels restored at start-up
    #[serde(default = "default_normal_power")]
    pub normal_power: u8,
    #[serde(default = "default_precision_power")]
    pub precision_power: u8,

    // Radio
    #[serde(default = "default_inquiry_timeout_ms")]
    pub inquiry_timeout_ms: u64,
    #[serde(default = "default_name_timeout_ms")]
    pub name_timeout_ms: u64,
    #[serde(default = "default_rfcomm_channel")]
    pub rfcomm_channel: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            normal_power: default_normal_power(),
            precision_power: default_precision_power(),
            inquiry_timeout_ms: default_inquiry_timeout_ms(),
            name_timeout_ms: default_name_timeout_ms(),
            rfcomm_channel: default_rfcomm_channel(),
        }
    }
}

impl Settings {
    pub fn power_levels(&self) -> PowerLevels {
        PowerLevels::new(self.normal_power, self.precision_power)
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            inquiry_timeout: Duration::from_millis(self.inquiry_timeout_ms),
            name_timeout: Duration::from_millis(self.name_timeout_ms),
            channel: self.rfcomm_channel,
        }
    }
}

fn default_normal_power() -> u8 {
    DEFAULT_NORMAL_POWER
}
fn default_precision_power() -> u8 {
    DEFAULT_PRECISION_POWER
}
fn default_inquiry_timeout_ms() -> u64 {
    10_240
}
fn default_name_timeout_ms() -> u64 {
    5_000
}
fn default_rfcomm_channel() -> u8 {
    RFCOMM_CHANNEL
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    /// Settings stored in `dir`, created if missing
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        let settings_path = dir.as_ref().join(SETTINGS_FILE);
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                if settings_path.exists() {
                    warn!("Ignoring unreadable settings {:?}: {}", settings_path, e);
                }
                Settings::default()
            }
        };

        Ok(Self {
            settings,
            settings_path,
        })
    }

    /// Platform config directory for this application
    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push(APP_DIR);
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Remember the power levels for the next start
    pub fn update_power_levels(&mut self, levels: PowerLevels) -> anyhow::Result<()> {
        self.settings.normal_power = levels.normal();
        self.settings.precision_power = levels.precision();
        self.save()
    }
}
