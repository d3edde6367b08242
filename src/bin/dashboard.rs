//! airiq-dashboard: serves the monitor's CSV log over http.
//!
//! usage: airiq-dashboard [config.toml]
//!
//! reads only the `[dashboard]` and `[logging] level` keys of the shared
//! config file. needs no hardware and can run on any machine that sees the log.

use anyhow::{Context, Result};
use std::path::PathBuf;

use airiq::config::MonitorConfig;
use airiq::dashboard::{router, DashboardState};
use airiq::{logging, signal};

#[tokio::main]
async fn main() -> Result<()> {
    let log = logging::init();

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load_or_default(explicit.as_deref());
    log.apply_level(&config.logging.level);
    config.check_data_files();

    let dashboard = &config.dashboard;
    let addr = format!("{}:{}", dashboard.bind, dashboard.port);
    let app = router(DashboardState::new(dashboard));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("[STARTUP] Dashboard live at http://{}", addr);
    tracing::info!("[STARTUP] Reading {}", dashboard.data_file.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(signal::shutdown_signal())
        .await
        .context("dashboard server failed")?;

    tracing::info!("[SHUTDOWN] Dashboard stopped");
    Ok(())
}
