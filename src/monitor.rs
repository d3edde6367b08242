//! ==============================================================================
//! monitor.rs - the polling loop
//! ==============================================================================
//!
//! purpose:
//!     one sequential loop: aggregate → persist → alerts → display, then wait
//!     for the configured interval. both the cycle and the wait race against
//!     the shutdown future, and every way out of the loop runs the same
//!     cleanup (close sensors, blank the screen).
//!
//! architecture:
//!
//! ```text
//!     ┌────────────────────────────────────────────────────────────┐
//!     │                        Monitor::run                        │
//!     │                                                            │
//!     │   select!{ shutdown | cycle }   select!{ shutdown | sleep }│
//!     │                 │                                          │
//!     │     ┌───────────┴────────────┐                             │
//!     │     │ spawn_blocking         │  sensor reads (blocking io) │
//!     │     │   registry.aggregate() │                             │
//!     │     └───────────┬────────────┘                             │
//!     │                 │  no await below this line                │
//!     │     datalog.append → alerts::evaluate → screen.show        │
//!     └────────────────────────────────────────────────────────────┘
//! ```
//!
//! cancellation:
//!     a shutdown that lands while the sensors are being read drops that
//!     cycle's aggregate. everything after the read is synchronous, so a
//!     cycle is either fully persisted or not at all.
//!
//! relationships:
//!     - uses: sensors/ (registry), datalog.rs, alerts.rs, display.rs, events.rs
//!     - used by: main.rs
//!
//! ==============================================================================

use anyhow::{Context, Result};
use chrono::Local;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::alerts::{self, Alert};
use crate::config::{AlertConfig, MonitorConfig};
use crate::datalog::DataLog;
use crate::display::Screen;
use crate::events::{EventSink, MonitorEvent};
use crate::record::Record;
use crate::sensors::{Aggregation, SensorRegistry};

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub record: Record,
    pub alerts: Vec<Alert>,
    pub missing: Vec<&'static str>,
    /// False when logging is disabled or the append failed.
    pub persisted: bool,
}

pub struct Monitor {
    // shared with the blocking read task, which may outlive a cancelled cycle
    registry: Arc<Mutex<SensorRegistry>>,
    datalog: Option<DataLog>,
    thresholds: AlertConfig,
    screen: Box<dyn Screen>,
    events: Box<dyn EventSink>,
    interval: Duration,
    cycles: u64,
}

fn lock(registry: &Mutex<SensorRegistry>) -> MutexGuard<'_, SensorRegistry> {
    // a panicked read leaves the drivers themselves intact
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Monitor {
    pub fn new(
        config: &MonitorConfig,
        registry: SensorRegistry,
        screen: Box<dyn Screen>,
        events: Box<dyn EventSink>,
    ) -> Self {
        let datalog = config
            .logging
            .enabled
            .then(|| DataLog::new(config.logging.data_file.clone()));
        Self {
            registry: Arc::new(Mutex::new(registry)),
            datalog,
            thresholds: config.alerts,
            screen,
            events,
            interval: config.logging.interval(),
            cycles: 0,
        }
    }

    /// Completed cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read every sensor once on the blocking pool.
    pub async fn aggregate(&self) -> Result<Aggregation> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || lock(&registry).aggregate(Local::now()))
            .await
            .context("sensor read task failed")
    }

    /// Persist, evaluate and render one aggregate. Never awaits.
    pub fn complete(&mut self, aggregation: Aggregation) -> CycleReport {
        let Aggregation { record, missing } = aggregation;

        for &sensor in &missing {
            self.events.emit(&MonitorEvent::SensorMissing { sensor });
        }

        let persisted = match &self.datalog {
            Some(log) => match log.append(&record) {
                Ok(()) => true,
                Err(e) => {
                    self.events.emit(&MonitorEvent::PersistFailed { error: format!("{:#}", e) });
                    false
                }
            },
            None => false,
        };

        let alerts = alerts::evaluate(&record, &self.thresholds);
        for alert in &alerts {
            self.events.emit(&MonitorEvent::Alert { message: alert.to_string() });
        }

        if let Err(e) = self.screen.show(&record, &alerts) {
            tracing::warn!("[DISPLAY] Render failed: {:#}", e);
        }

        self.cycles += 1;
        self.events.emit(&MonitorEvent::CycleCompleted {
            cycle: self.cycles,
            fields: record.values().len(),
            missing: missing.len(),
        });

        CycleReport { record, alerts, missing, persisted }
    }

    pub async fn cycle(&mut self) -> Result<CycleReport> {
        let aggregation = self.aggregate().await?;
        Ok(self.complete(aggregation))
    }

    /// Run until `shutdown` resolves. Returns the number of completed cycles.
    pub async fn run<F>(mut self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            "[RUNTIME] Starting monitoring loop ({}s interval)",
            self.interval.as_secs_f64()
        );

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break Ok(()),
                result = self.cycle() => {
                    if let Err(e) = result {
                        break Err(e);
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        };

        self.cleanup().await;
        outcome.map(|()| self.cycles)
    }

    /// Release every device and blank the screen.
    pub async fn cleanup(&mut self) {
        tracing::info!("[SHUTDOWN] Cleaning up...");
        let registry = Arc::clone(&self.registry);
        // waits for a read still in flight from a cancelled cycle
        if let Err(e) = tokio::task::spawn_blocking(move || lock(&registry).close_all()).await {
            tracing::error!("[SHUTDOWN] Closing sensors failed: {}", e);
        }
        if let Err(e) = self.screen.clear() {
            tracing::warn!("[DISPLAY] Clear failed: {:#}", e);
        }
        self.events.emit(&MonitorEvent::Shutdown { cycles: self.cycles });
    }
}
