//! ==============================================================================
//! sensors/registry.rs - configured sensors and the per-cycle aggregator
//! ==============================================================================
//!
//! purpose:
//!     builds one driver per enabled sensor from config, then reads all of
//!     them once per cycle and flattens the results into a [`Record`].
//!
//! failure policy:
//!     - disabled in config: not registered at all
//!     - device fails to open: one warning, sensor registered without a link
//!       and absent for the rest of the process
//!     - read fails this cycle: sensor listed in `missing`, others unaffected
//!
//! ==============================================================================

use chrono::{DateTime, Local};

use super::dht22::Dht22;
use super::mhz19::Mhz19;
use super::mq131::Mq131;
use super::pms5003::Pms5003;
use super::sgp30::Sgp30;
use super::Sensor;
use crate::config::SensorsConfig;
use crate::hal::HardwareProvider;
use crate::record::Record;

/// Result of one pass over the registry.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub record: Record,
    /// Sensors that returned nothing this cycle, in registry order.
    pub missing: Vec<&'static str>,
}

pub struct SensorRegistry {
    sensors: Vec<Box<dyn Sensor>>,
}

/// Keep the handle if the device opened, otherwise log once and carry on.
fn opened<T>(name: &str, result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(link) => {
            tracing::info!("{} initialized", name);
            Some(link)
        }
        Err(e) => {
            tracing::warn!("Failed to initialize {}: {:#}", name, e);
            None
        }
    }
}

impl SensorRegistry {
    pub fn from_sensors(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self { sensors }
    }

    /// Open every enabled sensor. Never fails: a broken device just stays absent.
    pub fn from_config(config: &SensorsConfig, hal: &dyn HardwareProvider) -> Self {
        let mut sensors: Vec<Box<dyn Sensor>> = Vec::new();

        if config.pms5003.enabled {
            let c = &config.pms5003;
            let link = opened("PMS5003", hal.open_uart(&c.port, c.baud_rate));
            sensors.push(Box::new(Pms5003::new(link)));
        }

        if config.mhz19.enabled {
            let c = &config.mhz19;
            let link = opened("MH-Z19", hal.open_uart(&c.port, c.baud_rate));
            sensors.push(Box::new(Mhz19::new(link)));
        }

        if config.sgp30.enabled {
            let c = &config.sgp30;
            let mut sgp30 = Sgp30::new(opened("SGP30", hal.open_i2c(c.i2c_address)));
            if let Err(e) = sgp30.init_baseline(c.baseline_eco2, c.baseline_tvoc) {
                // the chip answers but won't take commands; treat as unavailable
                tracing::warn!("Failed to initialize SGP30 baseline: {:#}", e);
                sgp30 = Sgp30::new(None);
            }
            sensors.push(Box::new(sgp30));
        }

        if config.mq131.enabled {
            let c = &config.mq131;
            let link = opened("MQ131", hal.open_adc(c.calibration()));
            sensors.push(Box::new(Mq131::new(link, c.channel, c.calibration())));
        }

        if config.dht22.enabled {
            let link = opened("DHT22", hal.open_dht22(config.dht22.pin));
            sensors.push(Box::new(Dht22::new(link)));
        }

        tracing::info!("Initialized {} sensors", sensors.len());
        Self { sensors }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.sensors.iter().map(|s| s.id()).collect()
    }

    /// `(id, has ever produced a reading)` for every registered sensor.
    pub fn health(&self) -> Vec<(&'static str, bool)> {
        self.sensors.iter().map(|s| (s.id(), s.is_healthy())).collect()
    }

    /// Read every sensor once, in registration order.
    pub fn aggregate(&mut self, taken_at: DateTime<Local>) -> Aggregation {
        let mut values = Vec::new();
        let mut missing = Vec::new();

        for sensor in &mut self.sensors {
            let id = sensor.id();
            match sensor.read() {
                Some(reading) => {
                    values.extend(
                        reading
                            .values
                            .into_iter()
                            .map(|(field, value)| (format!("{}_{}", id, field), value)),
                    );
                }
                None => missing.push(id),
            }
        }

        Aggregation { record: Record::new(taken_at, values), missing }
    }

    pub fn close_all(&mut self) {
        for sensor in &mut self.sensors {
            sensor.close();
        }
    }
}
