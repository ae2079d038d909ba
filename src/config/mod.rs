// src/config/mod.rs - Workbench configuration
use piforge_shared::BoardModel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Shortest window that can hold a complete tag (`[GPIO_OUT: 0 0]`).
pub const MIN_TAG_WINDOW: usize = 16;
pub const MAX_TAG_WINDOW: usize = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub board: BoardConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub guest: GuestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub model: BoardModel,
}

/// Terminal and guest boot timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_autoboot")]
    pub autoboot: bool,

    #[serde(default = "default_boot_delay_ms")]
    pub boot_delay_ms: u64,

    #[serde(default = "default_injection_delay_ms")]
    pub injection_delay_ms: u64,

    #[serde(default = "default_tag_window")]
    pub tag_window: usize,

    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            autoboot: default_autoboot(),
            boot_delay_ms: default_boot_delay_ms(),
            injection_delay_ms: default_injection_delay_ms(),
            tag_window: default_tag_window(),
            prompt: default_prompt(),
        }
    }
}

impl ConsoleConfig {
    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }

    pub fn injection_delay(&self) -> Duration {
        Duration::from_millis(self.injection_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestBackend {
    #[default]
    None,
    Process,
    Serial,
}

/// How to reach the guest VM's serial console
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuestConfig {
    #[serde(default)]
    pub backend: GuestBackend,

    #[serde(default = "default_guest_command")]
    pub command: String,

    #[serde(default = "default_guest_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub serial_port: String,

    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            backend: GuestBackend::default(),
            command: default_guest_command(),
            args: default_guest_args(),
            serial_port: String::new(),
            baud: default_baud(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "logging.level must be one of trace, debug, info, warn, error, got '{}'",
                self.level
            ))
        })
    }
}

// Default value functions
fn default_autoboot() -> bool { true }
fn default_boot_delay_ms() -> u64 { 1000 }
fn default_injection_delay_ms() -> u64 { 5000 }
fn default_tag_window() -> usize { 100 }
fn default_prompt() -> String { "> ".to_string() }
fn default_guest_command() -> String { "qemu-system-i386".to_string() }
fn default_guest_args() -> Vec<String> {
    ["-nographic", "-serial", "stdio", "-cdrom", "linux4.iso"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_baud() -> u32 { 115_200 }
fn default_log_level() -> String { "info".to_string() }

impl Config {
    /// Load and validate a TOML config. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.console.tag_window;
        if !(MIN_TAG_WINDOW..=MAX_TAG_WINDOW).contains(&window) {
            return Err(ConfigError::Invalid(format!(
                "console.tag_window must be between {} and {}, got {}",
                MIN_TAG_WINDOW, MAX_TAG_WINDOW, window
            )));
        }
        match self.guest.backend {
            GuestBackend::Process if self.guest.command.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "guest.command must be set for the process backend".to_string(),
                ));
            }
            GuestBackend::Serial if self.guest.serial_port.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "guest.serial_port must be set for the serial backend".to_string(),
                ));
            }
            _ => {}
        }
        if self.guest.baud == 0 {
            return Err(ConfigError::Invalid("guest.baud must be positive".to_string()));
        }
        self.logging.max_level()?;
        Ok(())
    }

    /// Local pseudo-shell only: no guest, no automatic boot.
    pub fn force_mock(&mut self) {
        self.guest.backend = GuestBackend::None;
        self.console.autoboot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.board.model, BoardModel::RPi4B);
        assert!(config.console.autoboot);
        assert_eq!(config.console.boot_delay(), Duration::from_millis(1000));
        assert_eq!(config.console.injection_delay(), Duration::from_secs(5));
        assert_eq!(config.console.tag_window, 100);
        assert_eq!(config.guest.backend, GuestBackend::None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [board]
            model = "RPi3B+"

            [guest]
            backend = "serial"
            serial_port = "/dev/pts/3"
            "#,
        )
        .unwrap();
        assert_eq!(config.board.model, BoardModel::RPi3BPlus);
        assert_eq!(config.guest.backend, GuestBackend::Serial);
        assert_eq!(config.guest.baud, 115_200);
        assert_eq!(config.console.prompt, "> ");
    }

    #[test]
    fn test_validation_errors() {
        for toml_text in [
            "[console]\ntag_window = 8",
            "[console]\ntag_window = 5000",
            "[guest]\nbackend = \"serial\"",
            "[guest]\nbackend = \"process\"\ncommand = \" \"",
            "[guest]\nbaud = 0",
            "[logging]\nlevel = \"loud\"",
        ] {
            assert!(
                matches!(Config::parse(toml_text), Err(ConfigError::Invalid(_))),
                "{}",
                toml_text
            );
        }
        assert!(matches!(Config::parse("[board]\nmodel = \"RPi9\""), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_log_levels() {
        let config = Config::parse("[logging]\nlevel = \"DEBUG\"").unwrap();
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::DEBUG);
        assert_eq!(Config::default().logging.max_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_force_mock() {
        let mut config = Config::parse("[guest]\nbackend = \"process\"").unwrap();
        config.force_mock();
        assert_eq!(config.guest.backend, GuestBackend::None);
        assert!(!config.console.autoboot);
    }
}
