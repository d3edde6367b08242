//! Threshold alerts on PM2.5, CO2 and ozone.
//!
//! Alerts live for one cycle: they are shown and logged, never persisted,
//! and a value that stays high simply alerts again next cycle.

use std::fmt;

use crate::config::AlertConfig;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Pm25,
    Co2,
    Ozone,
}

impl AlertKind {
    /// Evaluation order.
    pub const ALL: [AlertKind; 3] = [AlertKind::Pm25, AlertKind::Co2, AlertKind::Ozone];

    pub fn field(self) -> &'static str {
        match self {
            AlertKind::Pm25 => "pms5003_pm2_5",
            AlertKind::Co2 => "mhz19_co2",
            AlertKind::Ozone => "mq131_ozone",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Pm25 => "PM2.5",
            AlertKind::Co2 => "CO2",
            AlertKind::Ozone => "OZONE",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            AlertKind::Pm25 => "μg/m³",
            AlertKind::Co2 => "ppm",
            AlertKind::Ozone => "ppb",
        }
    }

    fn threshold(self, config: &AlertConfig) -> f64 {
        match self {
            AlertKind::Pm25 => config.pm2_5_threshold,
            AlertKind::Co2 => config.co2_threshold,
            AlertKind::Ozone => config.ozone_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub value: f64,
    pub threshold: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HIGH {}: {} {}", self.kind.label(), self.value, self.kind.unit())
    }
}

/// Strictly-greater-than check of each watched field. Missing fields never alert.
pub fn evaluate(record: &Record, config: &AlertConfig) -> Vec<Alert> {
    AlertKind::ALL
        .iter()
        .filter_map(|&kind| {
            let value = record.get(kind.field())?;
            let threshold = kind.threshold(config);
            (value > threshold).then_some(Alert { kind, value, threshold })
        })
        .collect()
}
