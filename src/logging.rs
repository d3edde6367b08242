//! Tracing subscriber setup for both binaries.
//!
//! The subscriber goes in before the config is read so the `[CONFIG]` lines
//! are not lost. It starts from `RUST_LOG` (or `info`); once the config is
//! loaded, `logging.level` replaces the filter unless `RUST_LOG` was set.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

pub fn init() -> LogHandle {
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (layer, handle) = reload::Layer::new(filter);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer().with_target(false))
        .try_init();

    LogHandle { filter: handle, from_env }
}

pub fn parse_level(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("invalid log level '{}'", level))
}

impl LogHandle {
    /// Switch to the configured level. `RUST_LOG` wins when present.
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        match parse_level(level).and_then(|f| self.filter.reload(f).context("reloading filter")) {
            Ok(()) => tracing::debug!("[LOG] Level set to {}", level),
            Err(e) => tracing::warn!("[LOG] {:#}, keeping current level", e),
        }
    }
}
