//! MH-Z19 NDIR CO2 sensor on a UART.

use super::{LastReading, Reading, Sensor};
use crate::error::SensorError;
use crate::frame::{decode_mhz19, MHZ19_FRAME_LEN, MHZ19_READ_CMD};
use crate::hal::SerialLink;

pub struct Mhz19 {
    link: Option<Box<dyn SerialLink>>,
    last: LastReading,
}

impl Mhz19 {
    pub const ID: &'static str = "mhz19";

    pub fn new(link: Option<Box<dyn SerialLink>>) -> Self {
        Self { link, last: LastReading::default() }
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        let link = self.link.as_mut().ok_or(SensorError::Unavailable)?;
        let raw = link.transact(&MHZ19_READ_CMD, MHZ19_FRAME_LEN)?;
        tracing::trace!("[MH-Z19] rx {}", hex::encode(&raw));
        let frame = decode_mhz19(&raw)?;
        Ok(Reading::new()
            .value("co2", f64::from(frame.co2))
            .value("temperature", f64::from(frame.temperature))
            .unit("co2", "ppm")
            .unit("temperature", "°C"))
    }
}

impl Sensor for Mhz19 {
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
                tracing::error!("MH-Z19 read error: {}", e);
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
    use anyhow::{anyhow, Result};

    struct Reply(Result<Vec<u8>, &'static str>);

    impl SerialLink for Reply {
        fn transact(&mut self, _command: &[u8], _response_len: usize) -> Result<Vec<u8>> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    #[test]
    fn decodes_co2_and_temperature() {
        let raw = vec![0xFF, 0x86, 0x03, 0x20, 0x40, 0x00, 0x00, 0x00, 0x00];
        let mut sensor = Mhz19::new(Some(Box::new(Reply(Ok(raw)))));
        let reading = sensor.read().unwrap();
        assert_eq!(reading.get("co2"), Some(800.0));
        assert_eq!(reading.get("temperature"), Some(24.0));
    }

    #[test]
    fn timeout_is_absent_not_fatal() {
        let mut sensor = Mhz19::new(Some(Box::new(Reply(Err("read timed out")))));
        assert!(sensor.read().is_none());
        assert!(!sensor.is_healthy());
    }
}
