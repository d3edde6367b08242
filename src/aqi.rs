//! ==============================================================================
//! aqi.rs - PM2.5 air quality index
//! ==============================================================================
//!
//! purpose:
//!     maps a PM2.5 concentration (μg/m³) onto the six EPA-style bands,
//!     interpolating linearly inside each band. derived on demand, never stored.
//!
//! relationships:
//!     - used by: display.rs (console AQI line)
//!     - used by: dashboard.rs (`aqi` field of /api/current)
//!
//! ==============================================================================

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AqiCategory {
    Unknown,
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive")]
    UnhealthyForSensitive,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Unknown => "Unknown",
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiResult {
    #[serde(rename = "aqi")]
    pub index: u32,
    pub category: AqiCategory,
    pub color: &'static str,
}

struct Band {
    low_break: f64,
    /// Inclusive; the next band starts just above it.
    high_break: f64,
    low_index: f64,
    high_index: f64,
    category: AqiCategory,
    color: &'static str,
}

const fn band(
    low_break: f64,
    high_break: f64,
    low_index: f64,
    high_index: f64,
    category: AqiCategory,
    color: &'static str,
) -> Band {
    Band { low_break, high_break, low_index, high_index, category, color }
}

static BANDS: [Band; 6] = [
    band(0.0, 12.0, 0.0, 50.0, AqiCategory::Good, "#00e400"),
    band(12.0, 35.4, 50.0, 100.0, AqiCategory::Moderate, "#ffff00"),
    band(35.4, 55.4, 100.0, 150.0, AqiCategory::UnhealthyForSensitive, "#ff7e00"),
    band(55.4, 150.4, 150.0, 200.0, AqiCategory::Unhealthy, "#ff0000"),
    band(150.4, 250.4, 200.0, 300.0, AqiCategory::VeryUnhealthy, "#8f3f97"),
    // open-ended: the slope of 250.4..350 continues past 350
    band(250.4, 350.0, 300.0, 400.0, AqiCategory::Hazardous, "#7e0023"),
];

pub const UNKNOWN: AqiResult = AqiResult { index: 0, category: AqiCategory::Unknown, color: "gray" };

/// Classify a PM2.5 reading. Missing, zero, negative and NaN give [`UNKNOWN`].
pub fn classify(pm2_5: Option<f64>) -> AqiResult {
    let Some(v) = pm2_5 else {
        return UNKNOWN;
    };
    // `!(v > 0.0)` also catches NaN
    if !(v > 0.0) {
        return UNKNOWN;
    }

    let band = BANDS
        .iter()
        .find(|b| v <= b.high_break)
        .unwrap_or(&BANDS[BANDS.len() - 1]);

    // multiply before dividing; truncation is sensitive to the order
    let index = band.low_index
        + (v - band.low_break) * (band.high_index - band.low_index) / (band.high_break - band.low_break);

    AqiResult { index: index as u32, category: band.category, color: band.color }
}
