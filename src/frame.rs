//! ==============================================================================
//! frame.rs - wire formats of the attached sensors
//! ==============================================================================
//!
//! purpose:
//!     pure byte-level encode/decode for every sensor protocol. no i/o here:
//!     drivers in sensors/ push the command bytes through a hal link and hand
//!     the response to the matching decoder.
//!
//! protocols:
//!     - pms5003: 32-byte frame, magic 0x42 0x4D, big-endian u16 fields
//!     - mh-z19:  9-byte frame, magic 0xFF 0x86, co2 word + offset temperature
//!     - sgp30:   i2c register protocol, each 16-bit word followed by a crc-8
//!     - mcp3008: 3-byte spi transfer carrying a 10-bit adc sample (mq131 ozone)
//!
//! fixed frames are accepted only when both the length and the magic match.
//! there is no resync: a bad frame is dropped and the sensor is absent for
//! that cycle.
//!
//! ==============================================================================

use crate::error::FrameError;

// ==============================================================================
// shared helpers
// ==============================================================================

fn check_fixed(raw: &[u8], expected: usize, magic: [u8; 2]) -> Result<(), FrameError> {
    if raw.len() != expected {
        return Err(FrameError::Length { expected, actual: raw.len() });
    }
    let found = [raw[0], raw[1]];
    if found != magic {
        return Err(FrameError::Magic { expected: magic, found });
    }
    Ok(())
}

fn be16(raw: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([raw[offset], raw[offset + 1]])
}

fn put_be16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Round to a fixed number of decimals for display and logging.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ==============================================================================
// pms5003 - particulate matter
// ==============================================================================

pub const PMS5003_FRAME_LEN: usize = 32;
pub const PMS5003_MAGIC: [u8; 2] = [0x42, 0x4D];
/// Passive-mode "read" request.
pub const PMS5003_READ_CMD: [u8; 7] = [0x42, 0x4D, 0xE2, 0x00, 0x00, 0x01, 0x71];

/// Atmospheric-environment concentrations in μg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmsFrame {
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10: u16,
}

pub fn decode_pms5003(raw: &[u8]) -> Result<PmsFrame, FrameError> {
    check_fixed(raw, PMS5003_FRAME_LEN, PMS5003_MAGIC)?;
    Ok(PmsFrame {
        pm1_0: be16(raw, 10),
        pm2_5: be16(raw, 12),
        pm10: be16(raw, 14),
    })
}

/// Build a frame the way the sensor sends it (used by the simulated uart).
pub fn encode_pms5003(frame: PmsFrame) -> [u8; PMS5003_FRAME_LEN] {
    let mut buf = [0u8; PMS5003_FRAME_LEN];
    buf[..2].copy_from_slice(&PMS5003_MAGIC);
    put_be16(&mut buf, 2, 28);
    // CF=1 block mirrors the atmospheric block
    for base in [4, 10] {
        put_be16(&mut buf, base, frame.pm1_0);
        put_be16(&mut buf, base + 2, frame.pm2_5);
        put_be16(&mut buf, base + 4, frame.pm10);
    }
    let sum: u16 = buf[..30].iter().map(|&b| u16::from(b)).fold(0u16, u16::wrapping_add);
    put_be16(&mut buf, 30, sum);
    buf
}

// ==============================================================================
// mh-z19 - co2
// ==============================================================================

pub const MHZ19_FRAME_LEN: usize = 9;
pub const MHZ19_MAGIC: [u8; 2] = [0xFF, 0x86];
pub const MHZ19_READ_CMD: [u8; 9] = [0xFF, 0x01, 0x86, 0x00, 0x00, 0x00, 0x00, 0x00, 0x79];
/// The temperature byte is reported with this offset added.
pub const MHZ19_TEMPERATURE_OFFSET: i16 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mhz19Frame {
    /// ppm
    pub co2: u16,
    /// °C, coarse
    pub temperature: i16,
}

pub fn decode_mhz19(raw: &[u8]) -> Result<Mhz19Frame, FrameError> {
    check_fixed(raw, MHZ19_FRAME_LEN, MHZ19_MAGIC)?;
    Ok(Mhz19Frame {
        co2: be16(raw, 2),
        temperature: i16::from(raw[4]) - MHZ19_TEMPERATURE_OFFSET,
    })
}

pub fn encode_mhz19(frame: Mhz19Frame) -> [u8; MHZ19_FRAME_LEN] {
    let mut buf = [0u8; MHZ19_FRAME_LEN];
    buf[..2].copy_from_slice(&MHZ19_MAGIC);
    put_be16(&mut buf, 2, frame.co2);
    buf[4] = (frame.temperature + MHZ19_TEMPERATURE_OFFSET).clamp(0, 255) as u8;
    let sum = buf[1..8].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    buf[8] = 0xFFu8.wrapping_sub(sum).wrapping_add(1);
    buf
}

// ==============================================================================
// sgp30 - voc / eco2 (register protocol)
// ==============================================================================

pub const SGP30_I2C_ADDRESS: u8 = 0x58;
pub const SGP30_IAQ_INIT: [u8; 2] = [0x20, 0x03];
pub const SGP30_MEASURE_IAQ: [u8; 2] = [0x20, 0x08];
pub const SGP30_SET_IAQ_BASELINE: [u8; 2] = [0x20, 0x1E];
/// Response length of `measure_iaq`: two words, each with its crc.
pub const SGP30_IAQ_RESPONSE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sgp30Frame {
    /// ppm
    pub eco2: u16,
    /// ppb
    pub tvoc: u16,
}

/// Sensirion crc-8: polynomial 0x31, init 0xFF, no reflection.
pub fn sgp30_crc(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
    }
    crc
}

/// Serialise words as `hi lo crc` triplets.
pub fn encode_sgp30_words(words: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 3);
    for word in words {
        let bytes = word.to_be_bytes();
        out.extend_from_slice(&bytes);
        out.push(sgp30_crc(&bytes));
    }
    out
}

fn decode_sgp30_words(raw: &[u8], count: usize) -> Result<Vec<u16>, FrameError> {
    let expected = count * 3;
    if raw.len() != expected {
        return Err(FrameError::Length { expected, actual: raw.len() });
    }
    raw.chunks_exact(3)
        .enumerate()
        .map(|(word, chunk)| {
            let computed = sgp30_crc(&chunk[..2]);
            if computed != chunk[2] {
                return Err(FrameError::Crc { word, computed, received: chunk[2] });
            }
            Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
        })
        .collect()
}

/// `set_iaq_baseline` takes the tvoc word first, then eco2.
pub fn sgp30_baseline_command(eco2: u16, tvoc: u16) -> Vec<u8> {
    let mut cmd = SGP30_SET_IAQ_BASELINE.to_vec();
    cmd.extend(encode_sgp30_words(&[tvoc, eco2]));
    cmd
}

pub fn decode_sgp30_iaq(raw: &[u8]) -> Result<Sgp30Frame, FrameError> {
    let words = decode_sgp30_words(raw, 2)?;
    Ok(Sgp30Frame { eco2: words[0], tvoc: words[1] })
}

// ==============================================================================
// mcp3008 + mq131 - analog ozone
// ==============================================================================

pub const MCP3008_TRANSFER_LEN: usize = 3;
/// 10-bit converter.
pub const MCP3008_FULL_SCALE: f64 = 1024.0;

/// Single-ended read: start bit, then `SGL/DIFF=1` and the channel number.
pub fn mcp3008_command(channel: u8) -> [u8; MCP3008_TRANSFER_LEN] {
    [0x01, (8 + (channel & 0x07)) << 4, 0x00]
}

/// Extract the 10-bit sample from the last two bytes of the response.
pub fn decode_mcp3008(raw: &[u8]) -> Result<u16, FrameError> {
    if raw.len() != MCP3008_TRANSFER_LEN {
        return Err(FrameError::Length { expected: MCP3008_TRANSFER_LEN, actual: raw.len() });
    }
    Ok((u16::from(raw[1] & 0x03) << 8) | u16::from(raw[2]))
}

pub fn encode_mcp3008(sample: u16) -> [u8; MCP3008_TRANSFER_LEN] {
    let sample = sample.min(1023);
    [0x00, (sample >> 8) as u8 & 0x03, (sample & 0xFF) as u8]
}

/// Linear voltage → ozone mapping for the MQ131.
///
/// The defaults are placeholders that were never calibrated against a
/// reference instrument; override them in `[sensors.mq131]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OzoneCalibration {
    pub reference_voltage: f64,
    pub voltage_offset: f64,
    pub ppb_per_volt: f64,
}

impl Default for OzoneCalibration {
    fn default() -> Self {
        Self {
            reference_voltage: 3.3,
            voltage_offset: 0.4,
            ppb_per_volt: 500.0,
        }
    }
}

impl OzoneCalibration {
    pub fn voltage(&self, sample: u16) -> f64 {
        f64::from(sample) * self.reference_voltage / MCP3008_FULL_SCALE
    }

    /// Never negative: readings below the offset clamp to zero.
    pub fn ozone_ppb(&self, voltage: f64) -> f64 {
        ((voltage - self.voltage_offset) * self.ppb_per_volt).max(0.0)
    }

    /// Inverse of [`Self::ozone_ppb`], for the simulator.
    pub fn sample_for(&self, ozone_ppb: f64) -> u16 {
        let voltage = ozone_ppb / self.ppb_per_volt + self.voltage_offset;
        (voltage * MCP3008_FULL_SCALE / self.reference_voltage).round().clamp(0.0, 1023.0) as u16
    }
}
