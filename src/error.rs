use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TandemError {
    #[error("line {requested} is out of range (1..={max})")]
    LineOutOfRange { requested: usize, max: usize },

    #[error("no candidate here")]
    NoCandidateHere,

    #[error("no active input session")]
    NoActiveSession,

    #[error("quit")]
    Aborted,

    #[error("candidate source failed: {0}")]
    Source(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {error}")]
    Io { path: PathBuf, error: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("live_update_delay must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),
}
