//! ==============================================================================
//! sensors/ - one driver per attached device
//! ==============================================================================
//!
//! every driver implements [`Sensor`] on its own: it owns its hal link (if the
//! device opened), caches its last good reading, and turns any failure into
//! "absent for this cycle". nothing is shared between drivers.
//!
//! ```text
//!     pms5003  uart   32-byte frame     pm1_0, pm2_5, pm10       μg/m³
//!     mhz19    uart   9-byte frame      co2, temperature         ppm, °C
//!     sgp30    i2c    register reads    eco2, tvoc               ppm, ppb
//!     mq131    spi    mcp3008 sample    ozone, voltage           ppb, V
//!     dht22    gpio   subprocess        temperature, humidity    °C, %
//! ```
//!
//! ==============================================================================

use chrono::{DateTime, Local};

pub mod dht22;
pub mod mhz19;
pub mod mq131;
pub mod pms5003;
pub mod registry;
pub mod sgp30;

pub use registry::{Aggregation, SensorRegistry};

/// One poll of one sensor.
///
/// `values` are the measured fields in the order the driver reports them.
/// `units` only documents what those numbers mean and never leaves the
/// sensor layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub values: Vec<(&'static str, f64)>,
    pub units: Vec<(&'static str, &'static str)>,
}

impl Reading {
    pub fn new() -> Self {
        Self { values: Vec::new(), units: Vec::new() }
    }

    pub fn value(mut self, field: &'static str, value: f64) -> Self {
        self.values.push((field, value));
        self
    }

    pub fn unit(mut self, field: &'static str, unit: &'static str) -> Self {
        self.units.push((field, unit));
        self
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.iter().find(|(name, _)| *name == field).map(|(_, v)| *v)
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform contract of every device driver.
pub trait Sensor: Send {
    /// Registry key; also the prefix of the flattened record fields.
    fn id(&self) -> &'static str;

    /// Poll the device once. `None` when it failed or was never initialised.
    fn read(&mut self) -> Option<Reading>;

    /// True once the sensor has produced at least one reading.
    fn is_healthy(&self) -> bool;

    /// Release the device handle. Later reads return `None`.
    fn close(&mut self) {}
}

/// Last successful reading and when it was taken.
#[derive(Debug, Clone, Default)]
pub struct LastReading {
    pub reading: Option<Reading>,
    pub at: Option<DateTime<Local>>,
}

impl LastReading {
    pub fn store(&mut self, reading: &Reading) {
        self.reading = Some(reading.clone());
        self.at = Some(Local::now());
    }

    pub fn is_some(&self) -> bool {
        self.reading.is_some()
    }
}
