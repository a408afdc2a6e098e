//! # teddycloud-starter
//!
//! Interactive setup wizard for containerized TeddyCloud deployments: HTTPS
//! certificate strategy, access control and IP restrictions for the nginx
//! edge proxy, plus generation of the compose manifest and proxy config.

pub mod docker;
pub mod error;
pub mod observability;
pub mod prompt;
pub mod security;
pub mod system;
pub mod template;
pub mod wizard;

// Re-export commonly used types
pub use error::{Error, Result, ToolError};
pub use starter_common::{ConfigSink, ConfigStore, DeploymentConfig};
pub use wizard::{NginxModeConfigurator, SetupWizard, WizardContext};
