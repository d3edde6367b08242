//! Simulated devices for builds without the `hardware` feature.
//!
//! Each device answers the real command bytes with a real frame built by the
//! encoders in `frame.rs`, filled with values that wander around typical
//! indoor baselines.

use anyhow::Result;
use rand::Rng;
use std::time::Duration;

use super::{DhtLink, HardwareProvider, I2cLink, PanelLink, SerialLink, SpiLink};
use crate::frame::{
    self, Mhz19Frame, OzoneCalibration, PmsFrame, MHZ19_READ_CMD, PMS5003_READ_CMD,
    SGP30_MEASURE_IAQ,
};

/// `base ± variation`, never below zero.
fn around(base: f64, variation: f64) -> f64 {
    let jitter = rand::thread_rng().gen_range(-variation..=variation);
    (base + jitter).max(0.0)
}

// ==============================================================================
// provider
// ==============================================================================

#[derive(Debug, Default)]
pub struct SimulatedHal;

impl SimulatedHal {
    pub fn new() -> Self {
        tracing::info!("Using SIMULATED HAL (No hardware access)");
        Self
    }
}

impl HardwareProvider for SimulatedHal {
    fn open_uart(&self, port: &str, baud_rate: u32) -> Result<Box<dyn SerialLink>> {
        tracing::debug!("[MOCK UART] Opened {} @ {} baud", port, baud_rate);
        Ok(Box::new(SimulatedUart::default()))
    }

    fn open_i2c(&self, address: u8) -> Result<Box<dyn I2cLink>> {
        tracing::debug!("[MOCK I2C] Opened addr 0x{:02X}", address);
        Ok(Box::new(SimulatedSgp30::default()))
    }

    fn open_adc(&self, calibration: OzoneCalibration) -> Result<Box<dyn SpiLink>> {
        tracing::debug!("[MOCK SPI] Opened MCP3008");
        Ok(Box::new(SimulatedMcp3008::new(calibration)))
    }

    fn open_dht22(&self, pin: u8) -> Result<Box<dyn DhtLink>> {
        tracing::debug!("[MOCK DHT22] Opened pin {}", pin);
        Ok(Box::new(SimulatedDht22))
    }

    fn open_panel(&self) -> Result<Box<dyn PanelLink>> {
        Ok(Box::new(SimulatedPanel::default()))
    }

    fn describe(&self) -> &'static str {
        "simulated"
    }
}

// ==============================================================================
// uart: answers both the pms5003 and the mh-z19 request
// ==============================================================================

#[derive(Debug, Default)]
pub struct SimulatedUart {
    pending: Vec<u8>,
}

impl SerialLink for SimulatedUart {
    fn transact(&mut self, command: &[u8], response_len: usize) -> Result<Vec<u8>> {
        self.pending = if command == &PMS5003_READ_CMD[..] {
            let pm2_5 = around(15.0, 10.0);
            let pm10 = around(25.0, 15.0).max(pm2_5);
            frame::encode_pms5003(PmsFrame {
                pm1_0: (pm2_5 * 0.7).round() as u16,
                pm2_5: pm2_5.round() as u16,
                pm10: pm10.round() as u16,
            })
            .to_vec()
        } else if command == &MHZ19_READ_CMD[..] {
            frame::encode_mhz19(Mhz19Frame {
                co2: around(450.0, 100.0).round() as u16,
                temperature: around(22.0, 5.0).round() as i16,
            })
            .to_vec()
        } else {
            Vec::new()
        };
        let take = response_len.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }
}

// ==============================================================================
// i2c: sgp30
// ==============================================================================

#[derive(Debug, Default)]
pub struct SimulatedSgp30 {
    pending: Vec<u8>,
}

impl I2cLink for SimulatedSgp30 {
    fn transact(&mut self, command: &[u8], read_len: usize, _wait: Duration) -> Result<Vec<u8>> {
        if command.starts_with(&SGP30_MEASURE_IAQ) {
            let tvoc = around(50.0, 30.0).round() as u16;
            let eco2 = (400.0 + around(50.0, 40.0)).round() as u16;
            self.pending = frame::encode_sgp30_words(&[eco2, tvoc]);
        } else {
            tracing::debug!("[MOCK I2C] Write: {}", hex::encode(command));
        }
        let take = read_len.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }
}

// ==============================================================================
// spi: mcp3008 with an mq131 on every channel
// ==============================================================================

/// Samples are encoded through the same calibration the driver decodes
/// with, so ozone stays around 30 ppb whatever `[sensors.mq131]` says.
#[derive(Debug)]
pub struct SimulatedMcp3008 {
    calibration: OzoneCalibration,
}

impl SimulatedMcp3008 {
    pub fn new(calibration: OzoneCalibration) -> Self {
        Self { calibration }
    }
}

impl SpiLink for SimulatedMcp3008 {
    fn transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let sample = self.calibration.sample_for(around(30.0, 20.0));
        let mut response = frame::encode_mcp3008(sample).to_vec();
        response.truncate(data.len());
        Ok(response)
    }
}

// ==============================================================================
// dht22 / panel
// ==============================================================================

#[derive(Debug)]
pub struct SimulatedDht22;

impl DhtLink for SimulatedDht22 {
    fn read(&mut self) -> Result<(f32, f32)> {
        let temperature = 22.0 + rand::thread_rng().gen_range(-5.0f64..=5.0);
        let humidity = around(45.0, 15.0).min(100.0);
        Ok((temperature as f32, humidity as f32))
    }
}

#[derive(Debug, Default)]
pub struct SimulatedPanel {
    pub lines: Vec<String>,
}

impl PanelLink for SimulatedPanel {
    fn show_lines(&mut self, lines: &[String]) -> Result<()> {
        tracing::debug!("[MOCK OLED] {}", lines.join(" | "));
        self.lines = lines.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::debug!("[MOCK OLED] Cleared");
        self.lines.clear();
        Ok(())
    }
}
