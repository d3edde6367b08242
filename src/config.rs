//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `airiq.toml`.
//!     loads configuration from file or falls back to defaults.
//!     read once at startup; nothing re-reads it afterwards.
//!
//! structure:
//!     - SensorsConfig: per-sensor enable flag plus port / address / channel / pin.
//!     - DisplayConfig: console or oled output.
//!     - LoggingConfig: cycle interval, csv enable flag and path, log level.
//!     - AlertConfig: numeric thresholds.
//!     - DashboardConfig: where the web dashboard listens and what it reads.
//!
//! every section and every key is optional; missing ones take the documented
//! defaults from the Default impls below.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frame::{OzoneCalibration, SGP30_I2C_ADDRESS};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub sensors: SensorsConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub alerts: AlertConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SensorsConfig {
    pub pms5003: Pms5003Config,
    pub mhz19: Mhz19Config,
    pub sgp30: Sgp30Config,
    pub mq131: Mq131Config,
    pub dht22: Dht22Config,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Pms5003Config {
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
}

impl Default for Pms5003Config {
    fn default() -> Self {
        Self { enabled: true, port: "/dev/ttyUSB0".to_string(), baud_rate: 9600 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Mhz19Config {
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
}

impl Default for Mhz19Config {
    fn default() -> Self {
        Self { enabled: true, port: "/dev/ttyUSB1".to_string(), baud_rate: 9600 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Sgp30Config {
    pub enabled: bool,
    pub i2c_address: u8,
    pub baseline_eco2: u16,
    pub baseline_tvoc: u16,
}

impl Default for Sgp30Config {
    fn default() -> Self {
        Self {
            enabled: true,
            i2c_address: SGP30_I2C_ADDRESS,
            baseline_eco2: 0x8973,
            baseline_tvoc: 0x8AAE,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Mq131Config {
    pub enabled: bool,
    /// MCP3008 input the sensor is wired to (0-7).
    pub channel: u8,
    pub reference_voltage: f64,
    pub voltage_offset: f64,
    pub ppb_per_volt: f64,
}

impl Mq131Config {
    pub fn calibration(&self) -> OzoneCalibration {
        OzoneCalibration {
            reference_voltage: self.reference_voltage,
            voltage_offset: self.voltage_offset,
            ppb_per_volt: self.ppb_per_volt,
        }
    }
}

impl Default for Mq131Config {
    fn default() -> Self {
        let cal = OzoneCalibration::default();
        Self {
            enabled: true,
            channel: 0,
            reference_voltage: cal.reference_voltage,
            voltage_offset: cal.voltage_offset,
            ppb_per_volt: cal.ppb_per_volt,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Dht22Config {
    pub enabled: bool,
    pub pin: u8,
}

impl Default for Dht22Config {
    fn default() -> Self {
        Self { enabled: true, pin: 4 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Console,
    Oled,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: DisplayKind,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { enabled: true, kind: DisplayKind::Console }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Seconds between cycles.
    pub interval: u64,
    pub data_file: PathBuf,
    pub level: String,
}

impl LoggingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 60,
            data_file: PathBuf::from("air_quality_data.csv"),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub pm2_5_threshold: f64,
    pub co2_threshold: f64,
    pub ozone_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { pm2_5_threshold: 35.0, co2_threshold: 1000.0, ozone_threshold: 100.0 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind: String,
    pub port: u16,
    pub data_file: PathBuf,
    /// Upper bound on points returned by /api/recent.
    pub max_points: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            data_file: PathBuf::from("air_quality_data.csv"),
            max_points: 50,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    /// Parse a config document.
    ///
    /// Without its own `data_file` the dashboard reads the file the monitor
    /// writes (`[logging] data_file`).
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let document: toml::Value = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        let dashboard_file_set = document
            .get("dashboard")
            .and_then(|d| d.get("data_file"))
            .is_some();

        let mut config: MonitorConfig = document
            .try_into()
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        if !dashboard_file_set {
            config.dashboard.data_file = config.logging.data_file.clone();
        }
        Ok(config)
    }

    /// Warn when the dashboard is pointed at a different file than the one
    /// the monitor appends to. Returns true if the two agree.
    pub fn check_data_files(&self) -> bool {
        let agree = self.logging.data_file == self.dashboard.data_file;
        if !agree {
            tracing::warn!(
                "[CONFIG] Dashboard reads {} but the monitor writes {}",
                self.dashboard.data_file.display(),
                self.logging.data_file.display()
            );
        }
        agree
    }

    /// Load with default fallback.
    ///
    /// An explicit path that is missing or broken is reported; a missing file
    /// on the search path is not an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let paths = match explicit {
            Some(p) => vec![p.to_path_buf()],
            None => vec![
                PathBuf::from("airiq.toml"),
                PathBuf::from("config").join("airiq.toml"),
            ],
        };

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("[CONFIG] Failed to load {}: {:#}", path.display(), e);
                    }
                }
            } else if explicit.is_some() {
                tracing::warn!("[CONFIG] {} not found", path.display());
            }
        }

        tracing::info!("[CONFIG] No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let on = |enabled: bool| if enabled { "on" } else { "off" };
        let s = &self.sensors;
        println!("┌─────────────────────────────────────────┐");
        println!("│          AIRIQ CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ PMS5003: {:<4} {:<26}│", on(s.pms5003.enabled), s.pms5003.port);
        println!("│ MH-Z19:  {:<4} {:<26}│", on(s.mhz19.enabled), s.mhz19.port);
        println!("│ SGP30:   {:<4} addr 0x{:02X}{:<17}│", on(s.sgp30.enabled), s.sgp30.i2c_address, "");
        println!("│ MQ131:   {:<4} adc ch {:<19}│", on(s.mq131.enabled), s.mq131.channel);
        println!("│ DHT22:   {:<4} gpio {:<21}│", on(s.dht22.enabled), s.dht22.pin);
        println!("├─────────────────────────────────────────┤");
        println!("│ Interval: {:<30}│", format!("{}s", self.logging.interval));
        println!("│ Data file: {:<29}│", self.logging.data_file.display());
        println!("└─────────────────────────────────────────┘");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = MonitorConfig::parse("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.sensors.pms5003.port, "/dev/ttyUSB0");
        assert_eq!(config.sensors.mhz19.port, "/dev/ttyUSB1");
        assert_eq!(config.logging.interval, 60);
        assert_eq!(config.alerts.pm2_5_threshold, 35.0);
        assert_eq!(config.dashboard.port, 5000);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = MonitorConfig::parse(
            r#"
            [sensors.mhz19]
            enabled = false

            [sensors.mq131]
            voltage_offset = 0.55

            [alerts]
            co2_threshold = 1200

            [display]
            type = "oled"
            "#,
        )
        .unwrap();

        assert!(!config.sensors.mhz19.enabled);
        assert_eq!(config.sensors.mhz19.port, "/dev/ttyUSB1");
        assert_eq!(config.sensors.mq131.calibration().voltage_offset, 0.55);
        assert_eq!(config.sensors.mq131.calibration().ppb_per_volt, 500.0);
        assert_eq!(config.alerts.co2_threshold, 1200.0);
        assert_eq!(config.alerts.ozone_threshold, 100.0);
        assert_eq!(config.display.kind, DisplayKind::Oled);
        assert!(config.display.enabled);
    }

    #[test]
    fn sgp30_address_accepts_hex_literal() {
        let config = MonitorConfig::parse("[sensors.sgp30]\ni2c_address = 0x59\n").unwrap();
        assert_eq!(config.sensors.sgp30.i2c_address, 0x59);
        assert_eq!(config.sensors.sgp30.baseline_tvoc, 0x8AAE);
    }

    #[test]
    fn shipped_example_matches_defaults() {
        let config = MonitorConfig::parse(include_str!("../config/airiq.toml")).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn dashboard_follows_the_logging_data_file() {
        let config = MonitorConfig::parse("[logging]\ndata_file = \"/var/lib/airiq/log.csv\"\n").unwrap();
        assert_eq!(config.dashboard.data_file, PathBuf::from("/var/lib/airiq/log.csv"));
        assert!(config.check_data_files());

        let split = MonitorConfig::parse(
            "[logging]\ndata_file = \"a.csv\"\n[dashboard]\ndata_file = \"b.csv\"\n",
        )
        .unwrap();
        assert_eq!(split.dashboard.data_file, PathBuf::from("b.csv"));
        assert!(!split.check_data_files());
    }

    #[test]
    fn unknown_display_type_is_rejected() {
        assert!(MonitorConfig::parse("[display]\ntype = \"lcd\"\n").is_err());
    }

    #[test]
    fn missing_explicit_file_falls_back_to_defaults() {
        let config = MonitorConfig::load_or_default(Some(Path::new("/nonexistent/airiq.toml")));
        assert_eq!(config, MonitorConfig::default());
    }
}
