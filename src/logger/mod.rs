//! Logging setup for automail-rs
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output with multiple formats (Full, Compact, JSON)

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::settings::{ConsoleSettings, FileSettings, LoggerSettings};

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!(
                "Invalid log format '{}'. Valid formats are: full, compact, json",
                s
            ),
        }
    }
}

impl LogFormat {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

/// Initialize the logger with the given configuration
pub fn init_logger(settings: &LoggerSettings) -> Result<()> {
    settings.validate()?;

    // Create filter from level string
    let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (settings.console.enabled, settings.file.enabled) {
        (true, true) => init_both(settings, filter)?,
        (true, false) => init_console_only(&settings.console, filter),
        (false, true) => init_file_only(&settings.file, filter)?,
        (false, false) => anyhow::bail!("At least one output (console or file) must be enabled"),
    }

    Ok(())
}

fn init_console_only(settings: &ConsoleSettings, filter: EnvFilter) {
    let is_tty = std::io::stdout().is_terminal();
    let use_ansi = settings.colored && is_tty;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

fn init_file_only(settings: &FileSettings, filter: EnvFilter) -> Result<()> {
    let format: LogFormat = settings.format.parse()?;
    let writer = open_log_file(settings)?;

    match format {
        LogFormat::Full => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .compact()
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).json().with_writer(writer))
                .init();
        }
    }

    Ok(())
}

fn init_both(settings: &LoggerSettings, filter: EnvFilter) -> Result<()> {
    let is_tty = std::io::stdout().is_terminal();
    let use_ansi = settings.console.colored && is_tty;
    let format: LogFormat = settings.file.format.parse()?;
    let writer = open_log_file(&settings.file)?;

    // IMPORTANT: File layer must be added BEFORE console layer to avoid ANSI codes
    // leaking into file output. This is a known tracing-subscriber behavior where
    // span field formatting is affected by the first layer's ANSI setting.
    // See: https://github.com/tokio-rs/tracing/issues/1817
    match format {
        LogFormat::Full => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(console_layer)
                .init();
        }
        LogFormat::Compact => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(console_layer)
                .init();
        }
        LogFormat::Json => {
            let file_layer = fmt::layer().with_ansi(false).json().with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(console_layer)
                .init();
        }
    }

    Ok(())
}

/// Open the log file, creating parent directories as needed.
fn open_log_file(settings: &FileSettings) -> Result<Mutex<File>> {
    let path = Path::new(&settings.path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory {}", parent.display())
            })?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if settings.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let file = options
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Ok(Mutex::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("invalid".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_as_str() {
        assert_eq!(LogFormat::Full.as_str(), "full");
        assert_eq!(LogFormat::Compact.as_str(), "compact");
        assert_eq!(LogFormat::Json.as_str(), "json");
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("app.log");
        let settings = FileSettings {
            enabled: true,
            path: path.to_str().unwrap().to_string(),
            append: true,
            format: "json".to_string(),
        };

        let writer = open_log_file(&settings).expect("Should open log file");
        writer.lock().unwrap().write_all(b"hello\n").unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_open_log_file_append_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, "first\n").unwrap();

        let settings = FileSettings {
            enabled: true,
            path: path.to_str().unwrap().to_string(),
            append: true,
            format: "json".to_string(),
        };

        let writer = open_log_file(&settings).expect("Should open log file");
        writer.lock().unwrap().write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_truncate_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, "old contents\n").unwrap();

        let settings = FileSettings {
            enabled: true,
            path: path.to_str().unwrap().to_string(),
            append: false,
            format: "json".to_string(),
        };

        let writer = open_log_file(&settings).expect("Should open log file");
        writer.lock().unwrap().write_all(b"fresh\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
