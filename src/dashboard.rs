//! ==============================================================================
//! dashboard.rs - read-only web view of the data log
//! ==============================================================================
//!
//! purpose:
//!     serves the `airiq-dashboard` binary. every request re-reads the CSV
//!     the monitor appends to; the two processes share nothing else.
//!
//! routes:
//!     GET /                        html page (polls the json routes)
//!     GET /api/current             latest row + AQI + status
//!     GET /api/recent/:parameter   one column over the last N hours (?hours=6)
//!     GET /api/stats               row count and span of the last 24 hours
//!
//! relationships:
//!     - uses: datalog.rs (LogReader), aqi.rs
//!     - used by: bin/dashboard.rs
//!
//! ==============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aqi::{self, AqiResult};
use crate::config::DashboardConfig;
use crate::datalog::{LogReader, LogRow, LogStats, Series};

pub const DEFAULT_HOURS: u32 = 6;

#[derive(Debug, Clone)]
pub struct DashboardState {
    reader: LogReader,
    max_points: usize,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self { reader: LogReader::new(config.data_file.clone()), max_points: config.max_points }
    }
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/current", get(current_handler))
        .route("/api/recent/:parameter", get(recent_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A log that exists but can't be read. Answered as 500 with a json body.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("[DASHBOARD] {:#}", self.0);
        let body = serde_json::json!({ "error": format!("{:#}", self.0) });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// File reads run on the blocking pool.
async fn read_log<T, F>(state: &DashboardState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&LogReader) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let reader = state.reader.clone();
    let result = tokio::task::spawn_blocking(move || f(&reader))
        .await
        .map_err(|e| ApiError(anyhow::anyhow!("log reader task failed: {}", e)))?;
    Ok(result?)
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    /// `None` until the monitor has written its first row.
    pub readings: Option<LogRow>,
    pub aqi: AqiResult,
    pub status: &'static str,
}

pub async fn current_handler(State(state): State<DashboardState>) -> Result<Json<CurrentResponse>, ApiError> {
    let latest = read_log(&state, |r| r.latest()).await?;
    let aqi = aqi::classify(latest.as_ref().and_then(|row| row.get("pm2_5")));
    let status = if latest.is_some() { "ok" } else { "no_data" };
    Ok(Json(CurrentResponse { readings: latest, aqi, status }))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub parameter: String,
    #[serde(flatten)]
    pub series: Series,
    pub count: usize,
}

pub async fn recent_handler(
    State(state): State<DashboardState>,
    Path(parameter): Path<String>,
    Query(params): Query<RecentParams>,
) -> Result<Json<RecentResponse>, ApiError> {
    let hours = params.hours.unwrap_or(DEFAULT_HOURS);
    let max_points = state.max_points;
    let column = parameter.clone();
    let series = read_log(&state, move |r| r.recent(&column, hours, max_points, Local::now())).await?;
    let count = series.values.len();
    Ok(Json(RecentResponse { parameter, series, count }))
}

pub async fn stats_handler(State(state): State<DashboardState>) -> Result<Json<LogStats>, ApiError> {
    let stats = read_log(&state, |r| r.stats(Local::now())).await?;
    Ok(Json(stats))
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>AirIQ</title>
<style>
  body { font-family: system-ui; margin: 0; padding: 2rem; background: #1a1a2e; color: #eee; }
  h1 { margin-top: 0; }
  #aqi { padding: 1rem; border-radius: 8px; color: #111; font-weight: 600; margin-bottom: 1.5rem; }
  .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 1rem; }
  .card { background: #16213e; padding: 1rem; border-radius: 8px; }
  .card .label { color: #888; font-size: 0.85rem; }
  .card .value { font-size: 1.6rem; margin-top: 0.3rem; }
  #meta { color: #888; margin-top: 1.5rem; font-size: 0.85rem; }
</style>
</head>
<body>
<h1>AirIQ Air Quality</h1>
<div id="aqi">loading...</div>
<div class="grid" id="cards"></div>
<div id="meta"></div>
<script>
const FIELDS = [
  ["pm1_0", "PM1.0", "μg/m³"], ["pm2_5", "PM2.5", "μg/m³"], ["pm10", "PM10", "μg/m³"],
  ["co2", "CO2", "ppm"], ["eco2", "eCO2", "ppm"], ["tvoc", "TVOC", "ppb"],
  ["ozone", "Ozone", "ppb"], ["temperature", "Temperature", "°C"], ["humidity", "Humidity", "%"],
];

async function refresh() {
  const current = await (await fetch("/api/current")).json();
  const aqi = document.getElementById("aqi");
  aqi.style.background = current.aqi.color;
  aqi.textContent = current.status === "ok"
    ? `AQI ${current.aqi.aqi} - ${current.aqi.category}`
    : "No data yet";

  const readings = current.readings || {};
  document.getElementById("cards").innerHTML = FIELDS
    .filter(([key]) => readings[key] !== undefined)
    .map(([key, label, unit]) =>
      `<div class="card"><div class="label">${label}</div><div class="value">${readings[key]} ${unit}</div></div>`)
    .join("");

  const stats = await (await fetch("/api/stats")).json();
  document.getElementById("meta").textContent = stats.data_available
    ? `${stats.total_readings} readings in the last 24h, newest ${stats.newest_reading}`
    : "";
}

refresh();
setInterval(refresh, 30000);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn state_for(path: PathBuf) -> DashboardState {
        DashboardState::new(&DashboardConfig { data_file: path, ..DashboardConfig::default() })
    }

    #[tokio::test]
    async fn missing_log_reports_no_data() {
        let state = state_for(PathBuf::from("/nonexistent/airiq.csv"));
        let Json(body) = current_handler(State(state.clone())).await.unwrap();
        assert_eq!(body.status, "no_data");
        assert!(body.readings.is_none());
        assert_eq!(body.aqi, aqi::UNKNOWN);

        let Json(stats) = stats_handler(State(state)).await.unwrap();
        assert!(!stats.data_available);
        assert_eq!(stats.oldest_reading, None);
    }

    #[tokio::test]
    async fn index_is_html() {
        let Html(page) = index_handler().await;
        assert!(page.contains("/api/current"));
    }

    #[test]
    fn router_builds() {
        let _ = router(state_for(PathBuf::from("air_quality_data.csv")));
    }
}
