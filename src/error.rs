//! Unified error model
//!
//! Top-level error type of the wizard library, aggregating the common crate
//! errors and the failures of external tools.

use starter_common::{ConfigError, ValidationError};
use thiserror::Error;

/// Library-wide error enum
#[derive(Debug, Error)]
pub enum Error {
    // ========== Configuration ==========
    /// Loading or saving the configuration file
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected operator input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // ========== External tools ==========
    /// docker, openssl, certbot or htpasswd failed
    #[error(transparent)]
    Tool(#[from] ToolError),

    // ========== System ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Custom error message
    #[error("Application error: {message}")]
    Custom { message: String },
}

/// Unified result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

/// Failure of an external process invocation
///
/// Captured output is kept so the operator can see why the tool failed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} is not available")]
    Unavailable { tool: String },

    #[error("{tool} exited with {}: {}", exit_code_text(.code), .stderr.trim())]
    Failed {
        tool: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The operator backed out of an interactive step
    #[error("{what} cancelled")]
    Cancelled { what: String },
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ToolError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn unavailable(tool: impl Into<String>) -> Self {
        Self::Unavailable { tool: tool.into() }
    }

    /// Captured stdout and stderr, empty for failures that never ran a process
    pub fn output(&self) -> Option<(&str, &str)> {
        match self {
            ToolError::Failed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}
