//! SGP30 VOC / eCO2 sensor on I2C.
//!
//! The chip needs `iaq_init` once after power-up and keeps its own running
//! baseline; we seed that baseline from config so readings settle faster.

use std::time::Duration;

use super::{LastReading, Reading, Sensor};
use crate::error::SensorError;
use crate::frame::{
    decode_sgp30_iaq, sgp30_baseline_command, SGP30_IAQ_INIT, SGP30_IAQ_RESPONSE_LEN,
    SGP30_MEASURE_IAQ,
};
use crate::hal::I2cLink;

const COMMAND_WAIT: Duration = Duration::from_millis(10);
const MEASURE_WAIT: Duration = Duration::from_millis(50);

pub struct Sgp30 {
    link: Option<Box<dyn I2cLink>>,
    last: LastReading,
}

impl Sgp30 {
    pub const ID: &'static str = "sgp30";

    pub fn new(link: Option<Box<dyn I2cLink>>) -> Self {
        Self { link, last: LastReading::default() }
    }

    /// Send `iaq_init` and the stored baseline. Called once by the registry.
    pub fn init_baseline(&mut self, eco2: u16, tvoc: u16) -> anyhow::Result<()> {
        let Some(link) = self.link.as_mut() else {
            return Ok(());
        };
        link.transact(&SGP30_IAQ_INIT, 0, COMMAND_WAIT)?;
        link.transact(&sgp30_baseline_command(eco2, tvoc), 0, COMMAND_WAIT)?;
        tracing::debug!("[SGP30] baseline set eco2=0x{:04X} tvoc=0x{:04X}", eco2, tvoc);
        Ok(())
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        let link = self.link.as_mut().ok_or(SensorError::Unavailable)?;
        let raw = link.transact(&SGP30_MEASURE_IAQ, SGP30_IAQ_RESPONSE_LEN, MEASURE_WAIT)?;
        let frame = decode_sgp30_iaq(&raw)?;
        Ok(Reading::new()
            .value("eco2", f64::from(frame.eco2))
            .value("tvoc", f64::from(frame.tvoc))
            .unit("eco2", "ppm")
            .unit("tvoc", "ppb"))
    }
}

impl Sensor for Sgp30 {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn read(&mut self) -> Option<Reading> {
        match self.sample() {
            Ok(reading) => {
                self.last.store(&reading);
                Some(reading)
            }
            Err(SensorError::Unavailable) => None,
            Err(e) => {
                tracing::error!("SGP30 read error: {}", e);
                None
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.last.is_some()
    }

    fn close(&mut self) {
        self.link = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_sgp30_words;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Bus {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        corrupt: bool,
    }

    impl I2cLink for Bus {
        fn transact(&mut self, command: &[u8], read_len: usize, _wait: Duration) -> anyhow::Result<Vec<u8>> {
            self.writes.lock().unwrap().push(command.to_vec());
            if read_len == 0 {
                return Ok(Vec::new());
            }
            let mut raw = encode_sgp30_words(&[415, 12]);
            if self.corrupt {
                raw[2] ^= 0x01;
            }
            Ok(raw)
        }
    }

    #[test]
    fn init_sends_iaq_init_then_baseline() {
        let bus = Bus::default();
        let mut sensor = Sgp30::new(Some(Box::new(bus.clone())));
        sensor.init_baseline(0x8973, 0x8AAE).unwrap();

        let writes = bus.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], SGP30_IAQ_INIT.to_vec());
        assert_eq!(writes[1], sgp30_baseline_command(0x8973, 0x8AAE));
    }

    #[test]
    fn measure_returns_two_values() {
        let mut sensor = Sgp30::new(Some(Box::new(Bus::default())));
        let reading = sensor.read().unwrap();
        assert_eq!(reading.get("eco2"), Some(415.0));
        assert_eq!(reading.get("tvoc"), Some(12.0));
    }

    #[test]
    fn crc_failure_is_absent() {
        let bus = Bus { corrupt: true, ..Bus::default() };
        let mut sensor = Sgp30::new(Some(Box::new(bus)));
        assert!(sensor.read().is_none());
    }
}
