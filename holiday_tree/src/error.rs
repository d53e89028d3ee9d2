//! Error types for the front end.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path:   PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Gesture subsystem failures.  None of them stop the scene; they only turn
/// gesture control off for the session.
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("hand tracking device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("hand tracking input closed")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(#[from] minifb::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
