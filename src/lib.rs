//! ==============================================================================
//! airiq - air quality monitor
//! ==============================================================================
//!
//! polls particulate, CO2, VOC, ozone and temperature/humidity sensors on a
//! fixed interval, appends every cycle to a CSV log, raises threshold alerts
//! and renders the latest values to a console or an OLED panel. a separate
//! dashboard binary serves the same log over http.
//!
//! layout (leaf to root):
//!     frame     wire formats of the sensors (pure, no io)
//!     hal       device links: rppal on a Pi, simulated everywhere else
//!     sensors   one driver per device + the registry/aggregator
//!     alerts    threshold evaluation
//!     aqi       PM2.5 air quality index
//!     datalog   the CSV log, writer and reader
//!     display   console / OLED renderers
//!     monitor   the polling loop
//!     dashboard axum routes over the log
//!
//! ==============================================================================

pub mod alerts;
pub mod aqi;
pub mod config;
pub mod dashboard;
pub mod datalog;
pub mod display;
pub mod error;
pub mod events;
pub mod frame;
pub mod hal;
pub mod logging;
pub mod monitor;
pub mod platform;
pub mod record;
pub mod sensors;
pub mod signal;
