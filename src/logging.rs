use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "TANDEM_LOG";
const DEFAULT_FILTER: &str = "info";

pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed when embedded in tests.
    if tracing_subscriber::registry()
        .with(filter_from_env())
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(path = ?path, "tandem tracing initialized");
    }
    Ok(())
}
