//! End-to-end cycle: simulated devices → registry → monitor → CSV → reader.

use std::path::PathBuf;
use std::time::Duration;

use airiq::config::MonitorConfig;
use airiq::datalog::{LogReader, COLUMNS};
use airiq::display::NullScreen;
use airiq::events::{MonitorEvent, RecordingSink};
use airiq::hal::sim::SimulatedHal;
use airiq::monitor::Monitor;
use airiq::sensors::{Reading, Sensor, SensorRegistry};

fn temp_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("airiq-it-{}-{}.csv", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn config_with_log(path: &PathBuf) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.logging.data_file = path.clone();
    config.logging.interval = 1;
    config
}

/// Fails every other read.
struct Flaky {
    calls: u32,
}

impl Sensor for Flaky {
    fn id(&self) -> &'static str {
        "mhz19"
    }

    fn read(&mut self) -> Option<Reading> {
        self.calls += 1;
        (self.calls % 2 == 1).then(|| Reading::new().value("co2", 1500.0).unit("co2", "ppm"))
    }

    fn is_healthy(&self) -> bool {
        self.calls > 0
    }
}

#[tokio::test]
async fn simulated_devices_fill_every_column() {
    let path = temp_csv("sim");
    let config = config_with_log(&path);
    let registry = SensorRegistry::from_config(&config.sensors, &SimulatedHal::new());
    let mut monitor = Monitor::new(&config, registry, Box::new(NullScreen), Box::new(RecordingSink::new()));

    for _ in 0..3 {
        let report = monitor.cycle().await.unwrap();
        assert!(report.persisted);
        assert!(report.missing.is_empty());
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], COLUMNS.join(","));
    for row in &lines[1..] {
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells.len(), COLUMNS.len());
        assert!(cells.iter().all(|c| !c.is_empty()), "empty cell in {}", row);
    }

    let latest = LogReader::new(&path).latest().unwrap().unwrap();
    assert!(latest.get("pm2_5").is_some());
    assert!(latest.get("humidity").is_some());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn absent_sensor_leaves_gaps_not_zeros() {
    let path = temp_csv("flaky");
    let config = config_with_log(&path);
    let events = RecordingSink::new();
    let registry = SensorRegistry::from_sensors(vec![Box::new(Flaky { calls: 0 })]);
    let mut monitor = Monitor::new(&config, registry, Box::new(NullScreen), Box::new(events.clone()));

    let first = monitor.cycle().await.unwrap();
    let second = monitor.cycle().await.unwrap();
    assert_eq!(first.alerts.len(), 1);
    assert!(second.alerts.is_empty());
    assert_eq!(second.missing, vec!["mhz19"]);

    let rows = LogReader::new(&path).rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("co2"), Some(1500.0));
    assert_eq!(rows[1].get("co2"), None);

    let seen = events.events();
    assert!(seen.contains(&MonitorEvent::SensorMissing { sensor: "mhz19" }));
    assert!(seen.contains(&MonitorEvent::Alert { message: "HIGH CO2: 1500 ppm".to_string() }));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn shutdown_during_wait_runs_cleanup_once() {
    let path = temp_csv("shutdown");
    let mut config = config_with_log(&path);
    config.logging.interval = 3600;
    let events = RecordingSink::new();
    let registry = SensorRegistry::from_config(&config.sensors, &SimulatedHal::new());
    let monitor = Monitor::new(&config, registry, Box::new(NullScreen), Box::new(events.clone()));

    let cycles = monitor
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();
    assert_eq!(cycles, 1);

    let shutdowns = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, MonitorEvent::Shutdown { .. }))
        .count();
    assert_eq!(shutdowns, 1);
    assert_eq!(LogReader::new(&path).rows().unwrap().len(), 1);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn immediate_shutdown_writes_nothing() {
    let path = temp_csv("immediate");
    let config = config_with_log(&path);
    let registry = SensorRegistry::from_config(&config.sensors, &SimulatedHal::new());
    let monitor = Monitor::new(&config, registry, Box::new(NullScreen), Box::new(RecordingSink::new()));

    let cycles = monitor.run(std::future::ready(())).await.unwrap();
    assert_eq!(cycles, 0);
    assert!(!path.exists());
}
