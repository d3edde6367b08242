//! Error types shared by the frame decoders and the sensor drivers.
//!
//! Link-level failures (UART, I2C, SPI, subprocess) arrive from the HAL as
//! `anyhow::Error` and are wrapped into [`SensorError::Link`]; everything
//! a driver can reject on its own is a [`FrameError`].

use thiserror::Error;

/// A response that arrived but cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("bad header {found:02X?}, expected {expected:02X?}")]
    Magic { expected: [u8; 2], found: [u8; 2] },

    #[error("crc mismatch on word {word}: computed 0x{computed:02X}, received 0x{received:02X}")]
    Crc { word: usize, computed: u8, received: u8 },
}

#[derive(Debug, Error)]
pub enum SensorError {
    /// The device could not be opened at startup; the sensor stays absent.
    #[error("device not initialised")]
    Unavailable,

    #[error("link error: {0:#}")]
    Link(#[from] anyhow::Error),

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    /// The device answered but had nothing to report (e.g. DHT22 returned null).
    #[error("no data")]
    NoData,
}
