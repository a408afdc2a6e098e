//! Shared infrastructure for the TeddyCloud setup wizard
//!
//! Holds the persisted deployment configuration, its JSON store, the
//! filesystem layout derived from the project path and input validation.

pub mod config;
pub mod error;
pub mod util;

pub use config::{
    ConfigSink, ConfigStore, DeploymentConfig, DeploymentMode, EnvironmentConfig, HttpsMode,
    NGINX_EDGE_SERVICE, NginxConfig, PortsConfig, SecurityConfig, SecurityType, TEDDYCLOUD_SERVICE,
};
pub use error::{ConfigError, ValidationError};
