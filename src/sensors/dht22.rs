//! DHT22 temperature / humidity.

use super::{LastReading, Reading, Sensor};
use crate::error::SensorError;
use crate::frame::round_to;
use crate::hal::DhtLink;

pub struct Dht22 {
    link: Option<Box<dyn DhtLink>>,
    last: LastReading,
}

impl Dht22 {
    pub const ID: &'static str = "dht22";

    pub fn new(link: Option<Box<dyn DhtLink>>) -> Self {
        Self { link, last: LastReading::default() }
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        let link = self.link.as_mut().ok_or(SensorError::Unavailable)?;
        let (temperature, humidity) = link.read()?;
        if !temperature.is_finite() || !humidity.is_finite() {
            return Err(SensorError::NoData);
        }
        Ok(Reading::new()
            .value("temperature", round_to(f64::from(temperature), 1))
            .value("humidity", round_to(f64::from(humidity), 1))
            .unit("temperature", "°C")
            .unit("humidity", "%"))
    }
}

impl Sensor for Dht22 {
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
                tracing::error!("DHT22 read error: {}", e);
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

    struct Fixed(f32, f32);

    impl DhtLink for Fixed {
        fn read(&mut self) -> anyhow::Result<(f32, f32)> {
            Ok((self.0, self.1))
        }
    }

    #[test]
    fn rounds_to_one_decimal() {
        let mut sensor = Dht22::new(Some(Box::new(Fixed(21.87, 44.04))));
        let reading = sensor.read().unwrap();
        assert_eq!(reading.get("temperature"), Some(21.9));
        assert_eq!(reading.get("humidity"), Some(44.0));
    }

    #[test]
    fn nan_is_absent() {
        let mut sensor = Dht22::new(Some(Box::new(Fixed(f32::NAN, 40.0))));
        assert!(sensor.read().is_none());
    }
}
