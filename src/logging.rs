//! Tracing subscriber setup

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{DatacentError, Result};

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "DATACENT_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Where log lines go
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Report commands write to stderr, keeping stdout clean for output
    Stderr,
    /// The TUI owns the terminal, so logs go to a file
    File(PathBuf),
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(target: LogTarget) -> Result<()> {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    let installed = match target {
        LogTarget::Stderr => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    installed.map_err(|e| DatacentError::Config(format!("logger: {}", e)))
}
