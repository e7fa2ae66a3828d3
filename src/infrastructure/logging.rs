use crate::domain::settings::LogSettings;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// D-Bus and windowing crates log every signal and frame at info
const QUIET_TARGETS: &[&str] = &[
    "bluer=warn",
    "zbus=warn",
    "dbus=warn",
    "eframe=warn",
    "egui_glow=warn",
    "winit=warn",
];

pub struct LoggingGuard {
    // Keep alive for logs to be flushed
    _guards: Vec<WorkerGuard>,
}

/// Set up console and file logging
///
/// A relative `log_dir` is placed under `base_dir` (the app's config
/// directory) rather than wherever the binary was started from.
pub fn init_logger(settings: &LogSettings, base_dir: &Path) -> anyhow::Result<LoggingGuard> {
    let mut guards = Vec::new();

    // RUST_LOG wins over the configured level
    let level_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(&settings.level)))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")));

    let console_layer = settings.console_logging_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_file(settings.show_file_line)
            .with_line_number(settings.show_file_line)
            .with_thread_names(settings.show_thread_names)
            .with_target(settings.show_target)
            .with_ansi(settings.ansi_colors)
    });

    let log_dir = resolve_log_dir(settings, base_dir);
    let file_layer = if settings.file_logging_enabled {
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = tracing_appender::rolling::RollingFileAppender::new(
            parse_rotation(&settings.rotation),
            &log_dir,
            &settings.file_name_prefix,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(settings.show_file_line)
                .with_line_number(settings.show_file_line)
                .with_thread_names(settings.show_thread_names)
                .with_target(settings.show_target),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(level_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if settings.file_logging_enabled {
        tracing::info!("Logging to {}", log_dir.display());
    }

    Ok(LoggingGuard { _guards: guards })
}

/// Configured level plus the overrides for chatty dependencies
fn filter_directives(level: &str) -> String {
    std::iter::once(level.trim())
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

fn resolve_log_dir(settings: &LogSettings, base_dir: &Path) -> PathBuf {
    let dir = Path::new(&settings.log_dir);
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base_dir.join(dir)
    }
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("Hourly"), Rotation::HOURLY);
        assert_eq!(parse_rotation("never"), Rotation::NEVER);
        assert_eq!(parse_rotation("weekly"), Rotation::DAILY);
    }

    #[test]
    fn test_filter_keeps_level_and_quiets_dependencies() {
        let directives = filter_directives(" debug ");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("bluer=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_relative_log_dir_lives_under_config_dir() {
        let base = Path::new("/home/user/.config/NxtRemoteControl");
        let settings = LogSettings::default();
        assert_eq!(resolve_log_dir(&settings, base), base.join("logs"));

        let absolute = LogSettings {
            log_dir: "/var/log/nxt".to_string(),
            ..LogSettings::default()
        };
        assert_eq!(resolve_log_dir(&absolute, base), PathBuf::from("/var/log/nxt"));
    }
}
