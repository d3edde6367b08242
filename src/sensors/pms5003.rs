//! PMS5003 particulate sensor on a UART, polled in passive mode.

use super::{LastReading, Reading, Sensor};
use crate::error::SensorError;
use crate::frame::{decode_pms5003, PMS5003_FRAME_LEN, PMS5003_READ_CMD};
use crate::hal::SerialLink;

pub struct Pms5003 {
    link: Option<Box<dyn SerialLink>>,
    last: LastReading,
}

impl Pms5003 {
    pub const ID: &'static str = "pms5003";

    pub fn new(link: Option<Box<dyn SerialLink>>) -> Self {
        Self { link, last: LastReading::default() }
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        let link = self.link.as_mut().ok_or(SensorError::Unavailable)?;
        let raw = link.transact(&PMS5003_READ_CMD, PMS5003_FRAME_LEN)?;
        tracing::trace!("[PMS5003] rx {}", hex::encode(&raw));
        let frame = decode_pms5003(&raw)?;
        Ok(Reading::new()
            .value("pm1_0", f64::from(frame.pm1_0))
            .value("pm2_5", f64::from(frame.pm2_5))
            .value("pm10", f64::from(frame.pm10))
            .unit("pm", "μg/m³"))
    }
}

impl Sensor for Pms5003 {
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
                tracing::error!("PMS5003 read error: {}", e);
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
