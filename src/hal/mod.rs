//! ==============================================================================
//! hal/mod.rs - Hardware Abstraction Layer
//! ==============================================================================
//!
//! purpose:
//!     provides a unified interface for the device buses the sensors sit on
//!     (UART, I2C, SPI, the DHT22 one-wire pin and the OLED panel).
//!     abstracts away the difference between running on a real Raspberry Pi
//!     (using `rppal`) and a development machine (simulated devices).
//!
//! design:
//!     - "Compile Anywhere": without the `hardware` feature nothing touches
//!       /dev, and every device is simulated at the byte level so the
//!       decoders in frame.rs still run on real frames.
//!     - one link object per device. drivers own their link; dropping it
//!       closes the handle.
//!     - links speak in whole transactions (command out, response in) so the
//!       settle delays of each bus stay inside the real implementation.
//!
//! relationships:
//!     - used by: sensors/registry.rs (opens one link per enabled sensor)
//!     - used by: display.rs (OLED panel)
//!     - uses: rppal (on feature="hardware"), rand (simulation)
//!
//! ==============================================================================

use anyhow::Result;
use std::time::Duration;

use crate::frame::OzoneCalibration;

pub mod sim;
#[cfg(feature = "hardware")]
pub mod rpi;

/// Byte-stream transport for a UART-attached sensor.
pub trait SerialLink: Send {
    /// Write `command`, then collect up to `response_len` bytes.
    ///
    /// Returns fewer bytes when the device stops talking before the timeout;
    /// the caller's decoder rejects short frames.
    fn transact(&mut self, command: &[u8], response_len: usize) -> Result<Vec<u8>>;
}

/// Register-style bus transport (SGP30).
pub trait I2cLink: Send {
    /// Write `command`, wait `wait`, then read `read_len` bytes (none if 0).
    fn transact(&mut self, command: &[u8], read_len: usize, wait: Duration) -> Result<Vec<u8>>;
}

/// Full-duplex SPI transfer to the ADC.
pub trait SpiLink: Send {
    fn transfer(&mut self, data: &[u8]) -> Result<Vec<u8>>;
}

/// DHT22 temperature (°C) / humidity (%) pair.
pub trait DhtLink: Send {
    fn read(&mut self) -> Result<(f32, f32)>;
}

/// Small monochrome text panel.
pub trait PanelLink: Send {
    fn show_lines(&mut self, lines: &[String]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

pub trait HardwareProvider: Send + Sync {
    fn open_uart(&self, port: &str, baud_rate: u32) -> Result<Box<dyn SerialLink>>;
    fn open_i2c(&self, address: u8) -> Result<Box<dyn I2cLink>>;
    /// The MCP3008 behind the MQ131. Only a simulated adc uses
    /// `calibration`, to pick samples that decode to plausible ozone.
    fn open_adc(&self, calibration: OzoneCalibration) -> Result<Box<dyn SpiLink>>;
    fn open_dht22(&self, pin: u8) -> Result<Box<dyn DhtLink>>;
    fn open_panel(&self) -> Result<Box<dyn PanelLink>>;
    /// Short label for startup logs.
    fn describe(&self) -> &'static str;
}

/// The provider this build talks to.
#[cfg(not(feature = "hardware"))]
pub fn default_provider() -> Box<dyn HardwareProvider> {
    Box::new(sim::SimulatedHal::new())
}

/// The provider this build talks to.
#[cfg(feature = "hardware")]
pub fn default_provider() -> Box<dyn HardwareProvider> {
    Box::new(rpi::RpiHal::new())
}
