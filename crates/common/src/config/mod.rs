//! Deployment configuration model
//!
//! `DeploymentConfig` is the single source of truth that every configurator
//! mutates in place. It is persisted as JSON between runs and saved after each
//! settled wizard step.

pub mod nginx;
pub mod store;

pub use nginx::{HttpsMode, NginxConfig, SecurityConfig, SecurityType};
pub use store::{ConfigSink, ConfigStore};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Container service that runs TeddyCloud itself
pub const TEDDYCLOUD_SERVICE: &str = "teddycloud";

/// Reverse proxy container used in nginx mode
pub const NGINX_EDGE_SERVICE: &str = "nginx-edge";

/// Root configuration persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Network topology of the deployment
    pub mode: DeploymentMode,

    /// Reverse proxy settings, only meaningful in nginx mode
    pub nginx: NginxConfig,

    /// Location of the project on disk
    pub environment: EnvironmentConfig,

    /// Published ports used by direct mode
    pub ports: PortsConfig,

    /// Keys owned by other layers (language, version, ...), kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Deployment topology
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum DeploymentMode {
    /// TeddyCloud publishes its ports itself
    #[default]
    #[serde(rename = "direct")]
    #[strum(serialize = "direct")]
    Direct,

    /// TeddyCloud sits behind the nginx edge proxy
    #[serde(rename = "nginx", alias = "proxied")]
    #[strum(to_string = "nginx", serialize = "proxied")]
    Proxied,
}

/// Project location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Host ports published in direct mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub admin_http: u16,
    pub admin_https: u16,
    pub teddycloud: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            admin_http: 80,
            admin_https: 8443,
            teddycloud: 443,
        }
    }
}

impl DeploymentConfig {
    /// Whether `environment.path` has been chosen
    pub fn has_project_path(&self) -> bool {
        self.environment
            .path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// Project root, falling back to the working directory when unset
    pub fn project_path(&self) -> PathBuf {
        match &self.environment.path {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => {
                tracing::warn!("project path not set, using current directory");
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    pub fn set_project_path(&mut self, path: impl AsRef<Path>) {
        self.environment.path = Some(path.as_ref().to_path_buf());
    }

    pub fn data_dir(&self) -> PathBuf {
        self.project_path().join("data")
    }

    /// Directory holding the server certificate and key for nginx
    pub fn server_certs_dir(&self) -> PathBuf {
        self.data_dir().join("server_certs")
    }

    pub fn security_dir(&self) -> PathBuf {
        self.data_dir().join("security")
    }

    pub fn htpasswd_path(&self) -> PathBuf {
        self.security_dir().join(".htpasswd")
    }

    pub fn client_certs_dir(&self) -> PathBuf {
        self.data_dir().join("client_certs")
    }

    pub fn compose_file(&self) -> PathBuf {
        self.data_dir().join("docker-compose.yml")
    }

    pub fn proxy_config_file(&self) -> PathBuf {
        self.data_dir().join("configurations").join("nginx-edge.conf")
    }

    pub fn is_proxied(&self) -> bool {
        self.mode == DeploymentMode::Proxied
    }
}
