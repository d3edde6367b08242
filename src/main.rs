//! ==============================================================================
//! main.rs - airiq monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     wires config, hal, sensors, display and the event sink into a Monitor
//!     and runs it until Ctrl-C / SIGTERM.
//!
//! usage:
//!     airiq [config.toml]
//!     without an argument the config is searched at ./airiq.toml, then
//!     ./config/airiq.toml; with neither present the defaults apply.
//!     build with `--features hardware` on the Pi to talk to real devices.
//!
//! relationships:
//!     - uses: airiq::monitor (loop), airiq::sensors (registry),
//!       airiq::hal (device provider), airiq::display (screen)
//!     - writes: the CSV log that airiq-dashboard reads
//!
//! ==============================================================================

use anyhow::Result;
use std::path::PathBuf;

use airiq::config::MonitorConfig;
use airiq::display::build_screen;
use airiq::events::LogEventSink;
use airiq::monitor::Monitor;
use airiq::sensors::SensorRegistry;
use airiq::{hal, logging, platform, signal};

#[tokio::main]
async fn main() -> Result<()> {
    let log = logging::init();

    println!("===========================================================");
    println!("  AirIQ - Air Quality Monitor v{}", env!("CARGO_PKG_VERSION"));
    println!("===========================================================");

    // step 1: configuration
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load_or_default(explicit.as_deref());
    log.apply_level(&config.logging.level);
    config.print_summary();

    // step 2: platform sanity check
    platform::check(platform::detect(), cfg!(feature = "hardware"));

    // step 3: devices
    let hal = hal::default_provider();
    tracing::info!("[STARTUP] Hardware provider: {}", hal.describe());
    let registry = SensorRegistry::from_config(&config.sensors, hal.as_ref());
    let screen = build_screen(&config.display, hal.as_ref());

    println!("\n[STARTUP] Monitoring with {} sensors", registry.len());
    if config.logging.enabled {
        println!("[STARTUP] Data will be logged to: {}", config.logging.data_file.display());
    }
    println!(
        "[STARTUP] Dashboard: run airiq-dashboard (port {})",
        config.dashboard.port
    );
    println!("[STARTUP] Press Ctrl+C to stop");
    println!("────────────────────────────────────────────────────────────");

    // step 4: run until shutdown
    let monitor = Monitor::new(&config, registry, screen, Box::new(LogEventSink::new()));
    match monitor.run(signal::shutdown_signal()).await {
        Ok(cycles) => {
            println!("\n[SHUTDOWN] AirIQ stopped after {} cycles", cycles);
            Ok(())
        }
        Err(e) => {
            tracing::error!("[ERROR] Monitor loop failed: {:#}", e);
            Err(e)
        }
    }
}
