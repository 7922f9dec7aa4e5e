//! Tracing setup for the `reissue` binary and embedders.
//!
//! Events go to `$XDG_STATE_HOME/reissue/reissue.log` when that file can be
//! opened, otherwise the caller falls back to stderr. `RUST_LOG` overrides the
//! default filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,reissue=debug,reissue_core=debug";
const LOG_FILE: &str = "reissue.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// File that `init_logging` appends to.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("reissue")?;
    Ok(xdg_dirs.get_state_home().join(LOG_FILE))
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn init_with(writer: BoxMakeWriter) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {}", e))
}

/// Install a subscriber writing to `log_path()`.
/// Errors if the file cannot be opened or a subscriber is already installed.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    let file = open_log(&path)?;
    init_with(BoxMakeWriter::new(Arc::new(file)))?;
    tracing::info!("reissue logging initialized at {}", path.display());
    Ok(path)
}

/// Install a subscriber writing to stderr.
pub fn init_logging_stderr() -> Result<()> {
    init_with(BoxMakeWriter::new(std::io::stderr))
}
