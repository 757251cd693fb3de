//! Runtime configuration
//!
//! Resolved once at startup. Precedence, highest first: command-line flag,
//! environment variable (both handled by clap), `~/.datacent/config.json`,
//! built-in default.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::services::aggregator::DEFAULT_SAMPLE_SIZE;
use crate::services::api::{normalize_base_url, ApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::types::{DatacentError, Result};

const DATA_DIR_NAME: &str = ".datacent";
const CONFIG_FILE_NAME: &str = "config.json";

/// `~/.datacent`, holding the config file and the TUI log
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| DatacentError::Config("Cannot determine home directory".into()))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

/// Contents of `config.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sample_size: Option<usize>,
}

impl FileConfig {
    /// Read a config file. A missing file is an empty config, a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map_err(|e| DatacentError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub sample_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Merge layers. Zero timeouts and sample sizes are ignored.
    pub fn resolve(overrides: &Overrides, file: &FileConfig) -> Self {
        let api_url = overrides
            .api_url
            .as_deref()
            .or(file.api_url.as_deref())
            .map(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = overrides
            .timeout_secs
            .filter(|&s| s > 0)
            .or(file.timeout_secs.filter(|&s| s > 0))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let sample_size = file
            .sample_size
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SAMPLE_SIZE);

        Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            sample_size,
        }
    }

    /// Resolve against `path`, or the default config file when none is given
    pub fn load(overrides: &Overrides, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::load(path)?,
            None => match default_config_path() {
                Ok(path) => FileConfig::load(&path)?,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping config file");
                    FileConfig::default()
                }
            },
        };

        let config = Self::resolve(overrides, &file);
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.api_url, self.timeout)
    }
}
