//! Startup platform check.
//!
//! The `hardware` build expects a Raspberry Pi; the simulated build on a Pi
//! is probably a mistake. Either way the monitor keeps running.

use std::path::Path;

const CPUINFO: &str = "/proc/cpuinfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    RaspberryPi,
    Other,
    /// cpuinfo could not be read.
    Unknown,
}

pub fn detect() -> Platform {
    detect_from(Path::new(CPUINFO))
}

pub fn detect_from(cpuinfo: &Path) -> Platform {
    match std::fs::read_to_string(cpuinfo) {
        Ok(text) if text.contains("Raspberry Pi") => Platform::RaspberryPi,
        Ok(_) => Platform::Other,
        Err(_) => Platform::Unknown,
    }
}

/// Warn when the build and the machine don't match.
pub fn check(platform: Platform, hardware_build: bool) {
    match (platform, hardware_build) {
        (Platform::RaspberryPi, false) => {
            tracing::warn!("[PLATFORM] Raspberry Pi detected but sensors are SIMULATED");
            tracing::warn!("[PLATFORM] Rebuild with --features hardware to read real devices");
        }
        (Platform::Other, true) => {
            tracing::warn!("[PLATFORM] Not running on Raspberry Pi, device opens will likely fail");
        }
        (Platform::Unknown, true) => {
            tracing::warn!("[PLATFORM] Cannot detect platform");
        }
        _ => tracing::debug!("[PLATFORM] {:?}", platform),
    }
}
