//! ==============================================================================
//! display.rs - presentation of the latest record
//! ==============================================================================
//!
//! purpose:
//!     renders each cycle's record and alerts to whichever screen the config
//!     picked. rendering never feeds back into the cycle: a failing screen is
//!     logged by the monitor and the loop carries on.
//!
//! screens:
//!     - console: framed text block on stdout with the AQI line
//!     - oled:    128x64 SSD1306, 12 px rows, driven through hal::PanelLink
//!     - none:    display disabled in config
//!
//! relationships:
//!     - used by: monitor.rs (show every cycle, clear on shutdown)
//!     - uses: aqi.rs, alerts.rs, hal/ (OLED panel)
//!
//! ==============================================================================

use anyhow::Result;
use std::io::Write;

use crate::alerts::Alert;
use crate::aqi;
use crate::config::{DisplayConfig, DisplayKind};
use crate::hal::{HardwareProvider, PanelLink};
use crate::record::Record;

/// Panel height / font height.
pub const OLED_ROWS: usize = 64 / 12;

const RULE: &str = "==================================================";

pub trait Screen: Send {
    fn show(&mut self, record: &Record, alerts: &[Alert]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Pick the screen for this config. An OLED that fails to open falls back to the console.
pub fn build_screen(config: &DisplayConfig, hal: &dyn HardwareProvider) -> Box<dyn Screen> {
    if !config.enabled {
        return Box::new(NullScreen);
    }
    match config.kind {
        DisplayKind::Console => Box::new(ConsoleScreen::stdout()),
        DisplayKind::Oled => match hal.open_panel() {
            Ok(panel) => {
                tracing::info!("OLED display initialized");
                Box::new(OledScreen::new(panel))
            }
            Err(e) => {
                tracing::warn!("Failed to initialize OLED display: {:#}, using console", e);
                Box::new(ConsoleScreen::stdout())
            }
        },
    }
}

// ==============================================================================
// console
// ==============================================================================

pub struct ConsoleScreen {
    out: Box<dyn Write + Send>,
}

impl ConsoleScreen {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl Screen for ConsoleScreen {
    fn show(&mut self, record: &Record, alerts: &[Alert]) -> Result<()> {
        for line in console_lines(record, alerts) {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

pub fn console_lines(record: &Record, alerts: &[Alert]) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!("Air Quality Monitor - {}", record.timestamp()),
        RULE.to_string(),
    ];

    let pm2_5 = record.get("pms5003_pm2_5");
    if let Some(pm) = pm2_5 {
        let index = aqi::classify(Some(pm));
        lines.push(format!("AQI: {} ({})", index.index, index.category));
        lines.push(format!("PM2.5: {} μg/m³", pm));
    }
    if let Some(co2) = record.get("mhz19_co2") {
        lines.push(format!("CO2: {} ppm", co2));
    }
    if let Some(tvoc) = record.get("sgp30_tvoc") {
        lines.push(format!("TVOC: {} ppb", tvoc));
    }
    if let Some(ozone) = record.get("mq131_ozone") {
        lines.push(format!("Ozone: {} ppb", ozone));
    }
    if let (Some(t), Some(h)) = (record.get("dht22_temperature"), record.get("dht22_humidity")) {
        lines.push(format!("Temp: {}°C, Humidity: {}%", t, h));
    }

    lines.push(String::new());
    if alerts.is_empty() {
        lines.push("All readings within normal ranges".to_string());
    } else {
        lines.push("ALERTS:".to_string());
        lines.extend(alerts.iter().map(|a| format!("  - {}", a)));
    }
    lines.push(RULE.to_string());
    lines
}

// ==============================================================================
// oled
// ==============================================================================

pub struct OledScreen {
    panel: Box<dyn PanelLink>,
}

impl OledScreen {
    pub fn new(panel: Box<dyn PanelLink>) -> Self {
        Self { panel }
    }
}

impl Screen for OledScreen {
    fn show(&mut self, record: &Record, alerts: &[Alert]) -> Result<()> {
        self.panel.show_lines(&oled_lines(record, alerts))
    }

    fn clear(&mut self) -> Result<()> {
        self.panel.clear()
    }
}

/// At most [`OLED_ROWS`] short rows; `ALERT!` only if a row is left.
pub fn oled_lines(record: &Record, alerts: &[Alert]) -> Vec<String> {
    let mut lines = Vec::with_capacity(OLED_ROWS);
    if let Some(pm) = record.get("pms5003_pm2_5") {
        lines.push(format!("PM2.5: {}", pm));
    }
    if let Some(co2) = record.get("mhz19_co2") {
        lines.push(format!("CO2: {}", co2));
    }
    if let (Some(t), Some(h)) = (record.get("dht22_temperature"), record.get("dht22_humidity")) {
        lines.push(format!("T:{}C H:{}%", t, h));
    }
    if !alerts.is_empty() && lines.len() < OLED_ROWS {
        lines.push("ALERT!".to_string());
    }
    lines.truncate(OLED_ROWS);
    lines
}

/// Display disabled.
pub struct NullScreen;

impl Screen for NullScreen {
    fn show(&mut self, _record: &Record, _alerts: &[Alert]) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::hal::sim::SimulatedHal;
    use chrono::Local;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Panel(Arc<Mutex<Vec<String>>>);

    impl PanelLink for Panel {
        fn show_lines(&mut self, lines: &[String]) -> Result<()> {
            *self.0.lock().unwrap() = lines.to_vec();
            Ok(())
        }
        fn clear(&mut self) -> Result<()> {
            self.0.lock().unwrap().clear();
            Ok(())
        }
    }

    fn sample() -> Record {
        Record::new(
            Local::now(),
            [
                ("pms5003_pm2_5", 40.0),
                ("mhz19_co2", 612.0),
                ("dht22_temperature", 21.9),
                ("dht22_humidity", 44.0),
            ],
        )
    }

    fn pm_alert() -> Alert {
        Alert { kind: AlertKind::Pm25, value: 40.0, threshold: 35.0 }
    }

    #[test]
    fn console_shows_aqi_and_alerts() {
        let buf = SharedBuf::default();
        let mut screen = ConsoleScreen::new(Box::new(buf.clone()));
        screen.show(&sample(), &[pm_alert()]).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("AQI: 111 (Unhealthy for Sensitive)"));
        assert!(text.contains("PM2.5: 40 μg/m³"));
        assert!(text.contains("Temp: 21.9°C, Humidity: 44%"));
        assert!(text.contains("  - HIGH PM2.5: 40 μg/m³"));
        assert!(!text.contains("TVOC"));
    }

    #[test]
    fn console_reports_quiet_cycle() {
        let lines = console_lines(&Record::new(Local::now(), [("mhz19_co2", 500.0)]), &[]);
        assert!(lines.iter().any(|l| l == "All readings within normal ranges"));
        assert!(!lines.iter().any(|l| l.starts_with("AQI")));
    }

    #[test]
    fn oled_layout() {
        let lines = oled_lines(&sample(), &[pm_alert()]);
        assert_eq!(lines, vec!["PM2.5: 40", "CO2: 612", "T:21.9C H:44%", "ALERT!"]);
        assert!(lines.len() <= OLED_ROWS);
    }

    #[test]
    fn oled_screen_draws_and_clears_panel() {
        let panel = Panel::default();
        let mut screen = OledScreen::new(Box::new(panel.clone()));
        screen.show(&sample(), &[]).unwrap();
        assert_eq!(panel.0.lock().unwrap().len(), 3);
        screen.clear().unwrap();
        assert!(panel.0.lock().unwrap().is_empty());
    }

    #[test]
    fn disabled_display_is_silent() {
        let config = DisplayConfig { enabled: false, kind: DisplayKind::Oled };
        let mut screen = build_screen(&config, &SimulatedHal::new());
        screen.show(&sample(), &[]).unwrap();
        screen.clear().unwrap();
    }
}
