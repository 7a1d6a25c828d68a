//! Tracing subscriber setup
//!
//! Installed once by the binary. `RUST_LOG` directives are honoured on top of
//! the chosen default level.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Pick the effective level: command line, then config file, then `info`.
///
/// An unparseable config value falls back to `info`.
pub fn resolve_level(requested: Option<LevelFilter>, configured: Option<&str>) -> LevelFilter {
    requested
        .or_else(|| configured.and_then(|level| LevelFilter::from_str(level.trim()).ok()))
        .unwrap_or(LevelFilter::INFO)
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber, appending to `logfile` when given
pub fn init(level: LevelFilter, logfile: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(level));

    let installed = match logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}
