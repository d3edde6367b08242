//! ==============================================================================
//! hal/rpi.rs - REAL IMPLEMENTATION (For Raspberry Pi)
//! ==============================================================================
//!
//! uart/i2c/spi go through rppal. the dht22 and the ssd1306 panel go through
//! a python3 subprocess (adafruit_dht / adafruit_ssd1306):
//!     - dht22 needs microsecond bit-banging that userspace rust can't time
//!       reliably without a kernel driver.
//!     - the panel needs a font rasteriser; PIL already has one.
//!
//! ==============================================================================

use anyhow::{anyhow, Context, Result};
use rppal::i2c::I2c;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use rppal::uart::{Parity, Queue, Uart};
use std::process::Command;
use std::time::Duration;

use super::{DhtLink, HardwareProvider, I2cLink, PanelLink, SerialLink, SpiLink};
use crate::frame::OzoneCalibration;

/// Per-call read timeout on the serial sensors.
const UART_TIMEOUT: Duration = Duration::from_secs(1);
/// Time the sensor needs between request and response.
const UART_SETTLE: Duration = Duration::from_millis(100);
const SPI_CLOCK_HZ: u32 = 1_000_000;

pub struct RpiHal;

impl RpiHal {
    pub fn new() -> Self {
        tracing::info!("Using REAL HARDWARE HAL (rppal)");
        Self
    }
}

impl HardwareProvider for RpiHal {
    fn open_uart(&self, port: &str, baud_rate: u32) -> Result<Box<dyn SerialLink>> {
        let mut uart = Uart::with_path(port, baud_rate, Parity::None, 8, 1)
            .with_context(|| format!("failed to open {}", port))?;
        // return as soon as anything arrives, give up after UART_TIMEOUT
        uart.set_read_mode(0, UART_TIMEOUT)?;
        Ok(Box::new(RpiUart { uart }))
    }

    fn open_i2c(&self, address: u8) -> Result<Box<dyn I2cLink>> {
        let mut i2c = I2c::new().context("failed to open i2c bus")?;
        i2c.set_slave_address(u16::from(address))?;
        Ok(Box::new(RpiI2c { i2c }))
    }

    fn open_adc(&self, _calibration: OzoneCalibration) -> Result<Box<dyn SpiLink>> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .context("failed to open spi0.0")?;
        Ok(Box::new(RpiSpi { spi }))
    }

    fn open_dht22(&self, pin: u8) -> Result<Box<dyn DhtLink>> {
        Ok(Box::new(PythonDht22 { pin }))
    }

    fn open_panel(&self) -> Result<Box<dyn PanelLink>> {
        let mut panel = PythonSsd1306;
        panel.clear().context("ssd1306 not responding")?;
        Ok(Box::new(panel))
    }

    fn describe(&self) -> &'static str {
        "rppal"
    }
}

// ==============================================================================
// uart / i2c / spi
// ==============================================================================

struct RpiUart {
    uart: Uart,
}

impl SerialLink for RpiUart {
    fn transact(&mut self, command: &[u8], response_len: usize) -> Result<Vec<u8>> {
        // drop anything the sensor pushed since the last cycle
        self.uart.flush(Queue::Input)?;
        let mut written = 0;
        while written < command.len() {
            written += self.uart.write(&command[written..])?;
        }
        self.uart.drain()?;
        std::thread::sleep(UART_SETTLE);

        let mut buf = vec![0u8; response_len];
        let mut filled = 0;
        while filled < response_len {
            let n = self.uart.read(&mut buf[filled..])?;
            if n == 0 {
                break; // timeout
            }
            filled += n;
        }
        buf.truncate(filled);
        tracing::trace!("[UART] rx {}", hex::encode(&buf));
        Ok(buf)
    }
}

struct RpiI2c {
    i2c: I2c,
}

impl I2cLink for RpiI2c {
    fn transact(&mut self, command: &[u8], read_len: usize, wait: Duration) -> Result<Vec<u8>> {
        self.i2c.write(command)?;
        std::thread::sleep(wait);
        if read_len == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; read_len];
        let n = self.i2c.read(&mut buf)?;
        buf.truncate(n);
        tracing::trace!("[I2C] rx {}", hex::encode(&buf));
        Ok(buf)
    }
}

struct RpiSpi {
    spi: Spi,
}

impl SpiLink for RpiSpi {
    fn transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut read_buf = vec![0u8; data.len()];
        self.spi.transfer(&mut read_buf, data)?;
        Ok(read_buf)
    }
}

// ==============================================================================
// dht22 - python subprocess
// ==============================================================================

struct PythonDht22 {
    pin: u8,
}

impl DhtLink for PythonDht22 {
    fn read(&mut self) -> Result<(f32, f32)> {
        let script = format!(
            r#"
import sys
try:
    import adafruit_dht, board, json
    dht = adafruit_dht.DHT22(board.D{})
    try:
        t, h = dht.temperature, dht.humidity
        if t is not None and h is not None:
            print(json.dumps({{"t": t, "h": h}}))
        else:
            print("null")
    finally:
        dht.exit()
except Exception as e:
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
            self.pin
        );

        let output = Command::new("python3")
            .arg("-c")
            .arg(&script)
            .output()
            .map_err(|e| anyhow!("Failed to run python3: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Python error: {}", stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout == "null" || stdout.is_empty() {
            return Err(anyhow!("Sensor returned null"));
        }

        let parsed: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| anyhow!("JSON parse error: {} (got: {})", e, stdout))?;
        let temp = parsed["t"].as_f64().ok_or_else(|| anyhow!("Missing temp"))? as f32;
        let humidity = parsed["h"].as_f64().ok_or_else(|| anyhow!("Missing humidity"))? as f32;
        Ok((temp, humidity))
    }
}

// ==============================================================================
// ssd1306 128x64 - python subprocess
// ==============================================================================

struct PythonSsd1306;

impl PythonSsd1306 {
    fn run(&self, body: &str) -> Result<()> {
        let script = format!(
            r#"
import board, busio, adafruit_ssd1306
from PIL import Image, ImageDraw, ImageFont
oled = adafruit_ssd1306.SSD1306_I2C(128, 64, busio.I2C(board.SCL, board.SDA))
{}
"#,
            body
        );
        let output = Command::new("python3").args(["-c", &script]).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("OLED update failed: {}", stderr.trim());
        }
        Ok(())
    }
}

impl PanelLink for PythonSsd1306 {
    fn show_lines(&mut self, lines: &[String]) -> Result<()> {
        let mut draw = String::new();
        for (row, line) in lines.iter().enumerate() {
            // serde_json gives a correctly escaped python string literal
            let literal = serde_json::to_string(line)?;
            draw.push_str(&format!("draw.text((0, {}), {}, font=font, fill=255)\n", row * 12, literal));
        }
        self.run(&format!(
            r#"
image = Image.new('1', (128, 64))
draw = ImageDraw.Draw(image)
try:
    font = ImageFont.truetype('DejaVuSans.ttf', 10)
except Exception:
    font = ImageFont.load_default()
{}
oled.image(image)
oled.show()
"#,
            draw
        ))
    }

    fn clear(&mut self) -> Result<()> {
        self.run("oled.fill(0)\noled.show()")
    }
}
