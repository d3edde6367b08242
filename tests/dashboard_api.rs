//! Dashboard handlers against a real log file written by DataLog.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Local};
use std::path::PathBuf;

use airiq::config::DashboardConfig;
use airiq::dashboard::{current_handler, recent_handler, stats_handler, DashboardState, RecentParams};
use airiq::datalog::DataLog;
use airiq::record::Record;

fn temp_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("airiq-api-{}-{}.csv", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn state(path: &PathBuf, max_points: usize) -> DashboardState {
    DashboardState::new(&DashboardConfig {
        data_file: path.clone(),
        max_points,
        ..DashboardConfig::default()
    })
}

fn write_history(path: &PathBuf) {
    let log = DataLog::new(path);
    let now = Local::now();
    // one row outside the default 6 h window
    log.append(&Record::new(now - Duration::hours(8), [("pms5003_pm2_5", 90.0)])).unwrap();
    for i in 0..5i64 {
        let at = now - Duration::minutes(50 - i * 10);
        log.append(&Record::new(at, [("pms5003_pm2_5", 10.0 + i as f64), ("mhz19_co2", 500.0)])).unwrap();
    }
    // latest row: PM sensor absent
    log.append(&Record::new(now, [("mhz19_co2", 640.0), ("dht22_temperature", 21.5)])).unwrap();
}

#[tokio::test]
async fn current_returns_latest_row() {
    let path = temp_csv("current");
    write_history(&path);

    let Json(body) = current_handler(State(state(&path, 50))).await.unwrap();
    assert_eq!(body.status, "ok");
    let readings = body.readings.unwrap();
    assert_eq!(readings.get("co2"), Some(640.0));
    assert_eq!(readings.get("pm2_5"), None);
    assert_eq!(body.aqi.category.label(), "Unknown");

    let json = serde_json::to_value(
        current_handler(State(state(&path, 50))).await.unwrap().0,
    )
    .unwrap();
    assert_eq!(json["readings"]["temperature"], 21.5);
    assert!(json["readings"]["timestamp"].is_string());
    assert!(json["readings"].get("humidity").is_none());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn current_classifies_pm25() {
    let path = temp_csv("aqi");
    DataLog::new(&path)
        .append(&Record::new(Local::now(), [("pms5003_pm2_5", 200.0)]))
        .unwrap();

    let Json(body) = current_handler(State(state(&path, 50))).await.unwrap();
    assert_eq!(body.aqi.category.label(), "Very Unhealthy");
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn recent_uses_window_and_skips_gaps() {
    let path = temp_csv("recent");
    write_history(&path);

    let Json(body) = recent_handler(
        State(state(&path, 50)),
        Path("pm2_5".to_string()),
        Query(RecentParams { hours: None }),
    )
    .await
    .unwrap();
    assert_eq!(body.parameter, "pm2_5");
    assert_eq!(body.series.values, vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    assert_eq!(body.count, 5);
    assert_eq!(body.series.timestamps.len(), 5);

    let Json(wide) = recent_handler(
        State(state(&path, 3)),
        Path("pm2_5".to_string()),
        Query(RecentParams { hours: Some(24) }),
    )
    .await
    .unwrap();
    assert_eq!(wide.series.values, vec![12.0, 13.0, 14.0]);

    let json = serde_json::to_value(&wide).unwrap();
    assert_eq!(json["count"], 3);
    assert!(json["timestamps"].is_array());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn unknown_parameter_is_empty() {
    let path = temp_csv("unknown");
    write_history(&path);

    let Json(body) = recent_handler(
        State(state(&path, 50)),
        Path("radon".to_string()),
        Query(RecentParams { hours: None }),
    )
    .await
    .unwrap();
    assert_eq!(body.count, 0);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn stats_cover_last_day() {
    let path = temp_csv("stats");
    write_history(&path);

    let Json(stats) = stats_handler(State(state(&path, 50))).await.unwrap();
    assert_eq!(stats.total_readings, 7);
    assert!(stats.data_available);
    assert!(stats.oldest_reading.unwrap() < stats.newest_reading.unwrap());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn partial_trailing_row_is_ignored() {
    let path = temp_csv("partial");
    DataLog::new(&path)
        .append(&Record::new(Local::now(), [("mhz19_co2", 700.0)]))
        .unwrap();
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "2099-01-01T00:00:00+00:00,1,2").unwrap();
    }

    let Json(body) = current_handler(State(state(&path, 50))).await.unwrap();
    assert_eq!(body.readings.unwrap().get("co2"), Some(700.0));
    std::fs::remove_file(&path).unwrap();
}
