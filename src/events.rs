//! Cycle-level events and the sink they are reported through.
//!
//! The monitor never logs cycle outcomes directly; it emits a
//! [`MonitorEvent`] and the injected [`EventSink`] decides where it goes.
//! [`LogEventSink`] sends everything to `tracing`. Tests collect events in
//! memory with [`RecordingSink`].

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    CycleCompleted { cycle: u64, fields: usize, missing: usize },
    SensorMissing { sensor: &'static str },
    Alert { message: String },
    PersistFailed { error: String },
    Shutdown { cycles: u64 },
}

pub trait EventSink: Send {
    fn emit(&mut self, event: &MonitorEvent);
}

/// Writes every event to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::CycleCompleted { cycle, fields, missing } => {
                tracing::debug!("[CYCLE] #{} | fields={} missing={}", cycle, fields, missing);
            }
            MonitorEvent::SensorMissing { sensor } => {
                tracing::debug!("[CYCLE] {} returned no data", sensor);
            }
            MonitorEvent::Alert { message } => {
                tracing::warn!("[ALERT] {}", message);
            }
            MonitorEvent::PersistFailed { error } => {
                tracing::error!("[DATALOG] Failed to log data: {}", error);
            }
            MonitorEvent::Shutdown { cycles } => {
                tracing::info!("[SHUTDOWN] Monitor stopped after {} cycles", cycles);
            }
        }
    }
}

/// Keeps a shared copy of every event; clone it before handing it over.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<MonitorEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MonitorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_shares_events_across_clones() {
        let sink = RecordingSink::new();
        let mut handle = sink.clone();
        handle.emit(&MonitorEvent::SensorMissing { sensor: "mhz19" });
        handle.emit(&MonitorEvent::Shutdown { cycles: 3 });
        assert_eq!(
            sink.events(),
            vec![MonitorEvent::SensorMissing { sensor: "mhz19" }, MonitorEvent::Shutdown { cycles: 3 }]
        );
    }

    #[test]
    fn log_sink_accepts_every_event() {
        let mut sink = LogEventSink::new();
        sink.emit(&MonitorEvent::CycleCompleted { cycle: 1, fields: 9, missing: 0 });
        sink.emit(&MonitorEvent::Alert { message: "HIGH CO2: 1500 ppm".into() });
        sink.emit(&MonitorEvent::PersistFailed { error: "disk full".into() });
    }
}
