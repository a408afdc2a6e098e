//! JSON persistence for `DeploymentConfig`

use super::DeploymentConfig;
use crate::error::ConfigError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for settled configuration changes
///
/// Configurators call `save` right after each settled transition so an
/// interrupted run loses at most the step in progress.
pub trait ConfigSink {
    fn save(&self, config: &DeploymentConfig) -> Result<(), ConfigError>;
}

/// Configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, returning defaults when the file does not exist yet
    pub fn load(&self) -> Result<DeploymentConfig, ConfigError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no configuration file, starting with defaults");
            return Ok(DeploymentConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigSink for ConfigStore {
    fn save(&self, config: &DeploymentConfig) -> Result<(), ConfigError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| ConfigError::Io {
            path: parent.clone(),
            source,
        })?;

        let content = serde_json::to_string_pretty(config)?;

        // Write next to the target and rename so a crash never leaves a truncated file
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|source| ConfigError::Io {
            path: parent.clone(),
            source,
        })?;
        tmp.write_all(content.as_bytes())
            .map_err(|source| ConfigError::Io {
                path: tmp.path().to_path_buf(),
                source,
            })?;
        tmp.persist(&self.path)
            .map_err(|source| ConfigError::Persist {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}
