//! MQ131 ozone sensor read through channel N of an MCP3008.

use super::{LastReading, Reading, Sensor};
use crate::error::SensorError;
use crate::frame::{decode_mcp3008, mcp3008_command, round_to, OzoneCalibration};
use crate::hal::SpiLink;

pub struct Mq131 {
    link: Option<Box<dyn SpiLink>>,
    channel: u8,
    calibration: OzoneCalibration,
    last: LastReading,
}

impl Mq131 {
    pub const ID: &'static str = "mq131";

    pub fn new(link: Option<Box<dyn SpiLink>>, channel: u8, calibration: OzoneCalibration) -> Self {
        Self { link, channel, calibration, last: LastReading::default() }
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        let link = self.link.as_mut().ok_or(SensorError::Unavailable)?;
        let raw = link.transfer(&mcp3008_command(self.channel))?;
        let sample = decode_mcp3008(&raw)?;
        let voltage = self.calibration.voltage(sample);
        let ozone = self.calibration.ozone_ppb(voltage);
        Ok(Reading::new()
            .value("ozone", round_to(ozone, 2))
            .value("voltage", round_to(voltage, 3))
            .unit("ozone", "ppb"))
    }
}

impl Sensor for Mq131 {
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
                tracing::error!("MQ131 read error: {}", e);
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
    use crate::frame::encode_mcp3008;

    struct Adc {
        sample: u16,
        expected_cmd: [u8; 3],
    }

    impl SpiLink for Adc {
        fn transfer(&mut self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
            assert_eq!(data, &self.expected_cmd[..]);
            Ok(encode_mcp3008(self.sample).to_vec())
        }
    }

    #[test]
    fn converts_sample_with_default_calibration() {
        let adc = Adc { sample: 256, expected_cmd: mcp3008_command(2) };
        let mut sensor = Mq131::new(Some(Box::new(adc)), 2, OzoneCalibration::default());
        let reading = sensor.read().unwrap();
        assert_eq!(reading.get("voltage"), Some(0.825));
        assert_eq!(reading.get("ozone"), Some(212.5));
    }

    #[test]
    fn low_voltage_clamps_to_zero() {
        let adc = Adc { sample: 10, expected_cmd: mcp3008_command(0) };
        let mut sensor = Mq131::new(Some(Box::new(adc)), 0, OzoneCalibration::default());
        assert_eq!(sensor.read().unwrap().get("ozone"), Some(0.0));
    }

    #[test]
    fn calibration_override_is_applied() {
        let cal = OzoneCalibration { voltage_offset: 0.0, ppb_per_volt: 100.0, ..OzoneCalibration::default() };
        let adc = Adc { sample: 512, expected_cmd: mcp3008_command(0) };
        let mut sensor = Mq131::new(Some(Box::new(adc)), 0, cal);
        // 512/1024 * 3.3 = 1.65 V -> 165 ppb
        assert_eq!(sensor.read().unwrap().get("ozone"), Some(165.0));
    }
}
