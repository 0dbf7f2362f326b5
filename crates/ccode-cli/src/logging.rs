use std::{
    fs::{File, OpenOptions},
    sync::Mutex,
};

use anyhow::{Context, Result};
use ccode_paths::CcodePaths;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILE_FILTER: &str = "ccode=info";
const VERBOSE_FILTER: &str = "ccode=debug";

/// stderr (solo avisos salvo con `--verbose`) y `ccode.log` en el directorio
/// de logs. Si el archivo no se puede abrir se sigue solo con stderr.
pub fn init_logging(verbose: bool) -> Result<()> {
    let (log_file, open_error) = match open_log_file() {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    let console_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(VERBOSE_FILTER))
    } else {
        EnvFilter::new("warn")
    };

    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER)))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    if let Some(e) = open_error {
        tracing::warn!(error = %format!("{e:#}"), "logging to stderr only");
    }
    Ok(())
}

fn open_log_file() -> Result<File> {
    let paths = CcodePaths::new().context("Failed to prepare application directories")?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_file)
        .with_context(|| format!("Failed to open log file {}", paths.log_file.display()))
}
