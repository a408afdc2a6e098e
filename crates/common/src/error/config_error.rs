//! Configuration persistence errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or saving the deployment configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace configuration file {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}
