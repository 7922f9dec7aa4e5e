use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{RetryTable, DEFAULT_MAX_ATTEMPTS, RETRY_TOKEN_LENGTH};

/// One `(status, code)` entry added to the retry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOverride {
    pub status: u16,
    pub code: String,
    pub retry: bool,
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per call (including the first). 0 = unlimited.
    pub max_attempts: u32,
    /// Cap in seconds on the exponential part of the backoff.
    pub max_delay_secs: u64,
    /// Entries that extend or replace the default `(status, code)` table.
    #[serde(default)]
    pub overrides: Vec<RetryOverride>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_delay_secs: 30,
            overrides: Vec::new(),
        }
    }
}

impl RetryConfig {
    /// Default table with the configured overrides applied in order.
    pub fn table(&self) -> RetryTable {
        self.overrides
            .iter()
            .fold(RetryTable::default(), |table, o| {
                table.with_entry(o.status, o.code.clone(), o.retry)
            })
    }
}

/// Global configuration loaded from `~/.config/reissue/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReissueConfig {
    /// Length of generated retry tokens (None = 32).
    #[serde(default)]
    pub token_length: Option<usize>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl ReissueConfig {
    /// The `[retry]` section, or defaults when absent.
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn token_length(&self) -> usize {
        self.token_length.unwrap_or(RETRY_TOKEN_LENGTH)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("reissue")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ReissueConfig> {
    load_from(&config_path()?)
}

/// Like `load_or_init` but at an explicit path.
pub fn load_from(path: &Path) -> Result<ReissueConfig> {
    if !path.exists() {
        let default_cfg = ReissueConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: ReissueConfig = toml::from_str(&data)?;
    Ok(cfg)
}
