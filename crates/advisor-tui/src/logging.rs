use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,advisor=debug,advisor_core=debug";

/// `<cache dir>/advisor/advisor.log`
pub fn log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().context("Could not determine cache directory")?;
    Ok(cache_dir.join("advisor").join("advisor.log"))
}

fn open_log_file() -> Result<(File, PathBuf)> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Route tracing output to a file so it never draws over the terminal UI.
/// Returns the log path, or `None` when the file could not be opened.
pub fn init() -> Option<PathBuf> {
    let (file, path) = open_log_file().ok()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Some(path)
}
