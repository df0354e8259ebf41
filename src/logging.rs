// Diagnostic logging setup; kept off stdout so it never tears the progress view

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

/// Debug output lands here when `--verbose` is given without `--log-file`
pub const DEFAULT_LOG_FILE: &str = "lutbatch.log";

/// WARN by default, DEBUG when verbose
pub fn level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Where logs should go: an explicit file wins, verbose runs fall back to
/// `DEFAULT_LOG_FILE` in the working directory, and quiet runs use stderr.
pub fn sink(verbose: bool, log_file: Option<&Path>) -> Option<PathBuf> {
    match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if verbose => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        None => None,
    }
}

/// Formatting subscriber shared by `init` and tests
pub fn subscriber<W>(verbose: bool, ansi: bool, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(level(verbose))
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish()
}

/// Install the global subscriber. File sinks are appended to without
/// colour codes.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    match sink(verbose, log_file) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            tracing::subscriber::set_global_default(subscriber(verbose, false, Mutex::new(file)))
                .context("Failed to install log subscriber")?;
        }
        None => {
            tracing::subscriber::set_global_default(subscriber(verbose, true, io::stderr))
                .context("Failed to install log subscriber")?;
        }
    }

    Ok(())
}
